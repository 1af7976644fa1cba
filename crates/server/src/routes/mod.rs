pub mod campaign;
pub mod chat;
pub mod customers;
pub mod waitlist;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(customers::router())
        .merge(campaign::router())
        .merge(chat::router())
        .merge(waitlist::router())
}
