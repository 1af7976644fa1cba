use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str = "id, name, age, email, gender, phone, city, state, purchase_history, \
     business_expenses, business_growth_rate, customer_satisfaction_score, \
     loyalty_points, average_order_value, created_at, updated_at";

/// One business customer. Email and phone are unique across the table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub age: i64,
    pub email: String,
    pub gender: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub purchase_history: String,
    pub business_expenses: i64,
    pub business_growth_rate: f64,
    pub customer_satisfaction_score: i64,
    pub loyalty_points: i64,
    pub average_order_value: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Incoming customer data, keyed on email for upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub name: String,
    pub age: i64,
    pub email: String,
    pub gender: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub purchase_history: String,
    pub business_expenses: i64,
    pub business_growth_rate: f64,
    pub customer_satisfaction_score: i64,
    pub loyalty_points: i64,
    pub average_order_value: i64,
}

impl CreateCustomer {
    /// Sparse merge against a stored record: only non-empty strings and
    /// non-zero numerics overwrite what is already there. A later import
    /// with blanks or zeroes never erases previously stored data.
    pub fn merged_with(&self, existing: &Customer) -> CreateCustomer {
        fn text(new: &str, old: &str) -> String {
            if new.is_empty() { old.to_string() } else { new.to_string() }
        }
        fn int(new: i64, old: i64) -> i64 {
            if new == 0 { old } else { new }
        }
        fn float(new: f64, old: f64) -> f64 {
            if new == 0.0 { old } else { new }
        }

        CreateCustomer {
            name: text(&self.name, &existing.name),
            age: int(self.age, existing.age),
            email: existing.email.clone(),
            gender: text(&self.gender, &existing.gender),
            phone: text(&self.phone, &existing.phone),
            city: text(&self.city, &existing.city),
            state: text(&self.state, &existing.state),
            purchase_history: text(&self.purchase_history, &existing.purchase_history),
            business_expenses: int(self.business_expenses, existing.business_expenses),
            business_growth_rate: float(self.business_growth_rate, existing.business_growth_rate),
            customer_satisfaction_score: int(
                self.customer_satisfaction_score,
                existing.customer_satisfaction_score,
            ),
            loyalty_points: int(self.loyalty_points, existing.loyalty_points),
            average_order_value: int(self.average_order_value, existing.average_order_value),
        }
    }
}

impl Customer {
    /// All records, fully materialized. Callers serialize the whole set, so
    /// there is no pagination.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Insert-or-update keyed on email. On conflict the incoming fields go
    /// through the sparse merge; the update timestamp is always refreshed.
    pub async fn upsert(pool: &SqlitePool, data: &CreateCustomer) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        match Self::find_by_email(pool, &data.email).await? {
            None => {
                let id = Uuid::new_v4();
                sqlx::query_as::<_, Customer>(&format!(
                    "INSERT INTO customers ({CUSTOMER_COLUMNS})
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                     RETURNING {CUSTOMER_COLUMNS}"
                ))
                .bind(id)
                .bind(&data.name)
                .bind(data.age)
                .bind(&data.email)
                .bind(&data.gender)
                .bind(&data.phone)
                .bind(&data.city)
                .bind(&data.state)
                .bind(&data.purchase_history)
                .bind(data.business_expenses)
                .bind(data.business_growth_rate)
                .bind(data.customer_satisfaction_score)
                .bind(data.loyalty_points)
                .bind(data.average_order_value)
                .bind(now)
                .bind(now)
                .fetch_one(pool)
                .await
            }
            Some(existing) => {
                let merged = data.merged_with(&existing);
                sqlx::query_as::<_, Customer>(&format!(
                    "UPDATE customers SET
                         name = $2, age = $3, gender = $4, phone = $5, city = $6,
                         state = $7, purchase_history = $8, business_expenses = $9,
                         business_growth_rate = $10, customer_satisfaction_score = $11,
                         loyalty_points = $12, average_order_value = $13, updated_at = $14
                     WHERE email = $1
                     RETURNING {CUSTOMER_COLUMNS}"
                ))
                .bind(&merged.email)
                .bind(&merged.name)
                .bind(merged.age)
                .bind(&merged.gender)
                .bind(&merged.phone)
                .bind(&merged.city)
                .bind(&merged.state)
                .bind(&merged.purchase_history)
                .bind(merged.business_expenses)
                .bind(merged.business_growth_rate)
                .bind(merged.customer_satisfaction_score)
                .bind(merged.loyalty_points)
                .bind(merged.average_order_value)
                .bind(now)
                .fetch_one(pool)
                .await
            }
        }
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(pool)
            .await
    }
}
