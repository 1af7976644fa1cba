//! CSV ingestion pipeline for customer records.

use csv::{ReaderBuilder, StringRecord};
use db::models::customer::{CreateCustomer, Customer};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to parse CSV: {0}")]
    Csv(String),
    #[error(
        "row {row}: business expenses, growth rate, and satisfaction score are all zero \
         ({committed} rows committed)"
    )]
    InvalidRow { row: usize, committed: usize },
    #[error("database error at row {row} ({committed} rows committed): {source}")]
    Database {
        row: usize,
        committed: usize,
        source: sqlx::Error,
    },
}

impl IngestError {
    /// Rows already stored when the batch aborted. Surfaced so a failed
    /// import never reports rows that were not committed.
    pub fn rows_committed(&self) -> usize {
        match self {
            Self::Csv(_) => 0,
            Self::InvalidRow { committed, .. } | Self::Database { committed, .. } => *committed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub rows_parsed: usize,
    pub rows_committed: usize,
}

/// Header-driven view over one data row. Every column is looked up under its
/// capitalized header first and its lower-cased variant second, matching the
/// files both spellings show up in.
struct RowView<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl RowView<'_> {
    fn get(&self, primary: &str, fallback: &str) -> &str {
        let find = |name: &str| {
            self.headers
                .iter()
                .position(|h| h == name)
                .and_then(|i| self.record.get(i))
        };
        match find(primary) {
            Some(value) if !value.is_empty() => value,
            _ => find(fallback).unwrap_or(""),
        }
    }
}

fn parse_int(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

fn parse_float(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

fn extract_row(row: &RowView) -> CreateCustomer {
    CreateCustomer {
        name: row.get("Name", "name").to_string(),
        email: row.get("Email", "email").to_string(),
        gender: row.get("Gender", "gender").to_string(),
        phone: row.get("Phone", "phone").to_string(),
        city: row.get("City", "city").to_string(),
        state: row.get("State", "state").to_string(),
        purchase_history: row.get("PurchaseHistory", "purchaseHistory").to_string(),
        age: parse_int(row.get("Age", "age")),
        business_expenses: parse_int(row.get("BusinessExpenses", "businessExpenses")),
        business_growth_rate: parse_float(row.get("BusinessGrowthRate", "businessGrowthRate")),
        customer_satisfaction_score: parse_int(
            row.get("CustomerSatisfactionScore", "customerSatisfactionScore"),
        ),
        loyalty_points: parse_int(row.get("LoyaltyPoints", "loyaltyPoints")),
        average_order_value: parse_int(row.get("AverageOrderValue", "averageOrderValue")),
    }
}

/// Parse the full upload into ordered rows. Blank lines are skipped; numeric
/// fields coerce to zero when unparseable.
pub fn parse_rows(content: &[u8]) -> Result<Vec<CreateCustomer>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content);
    let headers = reader
        .headers()
        .map_err(|e| IngestError::Csv(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Csv(e.to_string()))?;
        rows.push(extract_row(&RowView {
            headers: &headers,
            record: &record,
        }));
    }
    Ok(rows)
}

/// A row where the three key numerics all coerced to zero carried no usable
/// numeric data and aborts the import.
fn validate_row(row: &CreateCustomer) -> bool {
    !(row.business_expenses == 0
        && row.business_growth_rate == 0.0
        && row.customer_satisfaction_score == 0)
}

/// Customer CSV importer. Rows are upserted strictly in file order; the
/// first bad row aborts the whole request.
pub struct CsvIngest {
    pool: SqlitePool,
}

impl CsvIngest {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ingest(&self, content: &[u8]) -> Result<IngestSummary, IngestError> {
        let rows = parse_rows(content)?;
        let rows_parsed = rows.len();

        let mut committed = 0;
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            if !validate_row(row) {
                return Err(IngestError::InvalidRow {
                    row: row_number,
                    committed,
                });
            }
            Customer::upsert(&self.pool, row)
                .await
                .map_err(|source| IngestError::Database {
                    row: row_number,
                    committed,
                    source,
                })?;
            committed += 1;
        }

        info!(rows_parsed, "csv import complete");
        Ok(IngestSummary {
            rows_parsed,
            rows_committed: committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[test]
    fn accepts_both_header_spellings() {
        let csv = "name,Email,Phone,state,BusinessExpenses,businessGrowthRate,CustomerSatisfactionScore\n\
                   Asha,asha@example.com,123,Goa,100,2.5,7\n";
        let rows = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Asha");
        assert_eq!(rows[0].email, "asha@example.com");
        assert_eq!(rows[0].state, "Goa");
        assert_eq!(rows[0].business_expenses, 100);
        assert_eq!(rows[0].business_growth_rate, 2.5);
        assert_eq!(rows[0].customer_satisfaction_score, 7);
    }

    #[test]
    fn unparseable_numerics_coerce_to_zero() {
        let csv = "Name,Email,Age,BusinessExpenses,BusinessGrowthRate,CustomerSatisfactionScore\n\
                   Asha,asha@example.com,not-a-number,,4.2,9\n";
        let rows = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].age, 0);
        assert_eq!(rows[0].business_expenses, 0);
        assert_eq!(rows[0].business_growth_rate, 4.2);
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let csv = "Name,Email\nAsha,asha@example.com\n";
        let rows = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].city, "");
        assert_eq!(rows[0].loyalty_points, 0);
    }

    #[tokio::test]
    async fn all_zero_key_numerics_abort_at_that_row() {
        let pool = test_pool().await;
        // Row 2 has no usable numeric data; row 1 lands, row 3 never runs.
        let csv = "Name,Email,Phone,BusinessExpenses,BusinessGrowthRate,CustomerSatisfactionScore\n\
                   A,a@example.com,111,100,1.5,8\n\
                   B,b@example.com,222,0,0,0\n\
                   C,c@example.com,333,300,3.5,6\n";

        let err = CsvIngest::new(pool.clone())
            .ingest(csv.as_bytes())
            .await
            .unwrap_err();
        match err {
            IngestError::InvalidRow { row, committed } => {
                assert_eq!(row, 2);
                assert_eq!(committed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(
            Customer::find_by_email(&pool, "a@example.com")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            Customer::find_by_email(&pool, "c@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn reimport_with_zeroes_keeps_stored_numerics() {
        let pool = test_pool().await;
        let ingest = CsvIngest::new(pool.clone());

        let first = "Name,Email,Phone,BusinessExpenses,BusinessGrowthRate,CustomerSatisfactionScore,LoyaltyPoints\n\
                     A,a@example.com,111,500,2.0,8,40\n";
        ingest.ingest(first.as_bytes()).await.unwrap();

        // Loyalty column blank this time; satisfaction keeps the row valid.
        let second = "Name,Email,Phone,BusinessExpenses,BusinessGrowthRate,CustomerSatisfactionScore,LoyaltyPoints\n\
                      A,a@example.com,111,0,0,9,\n";
        let summary = ingest.ingest(second.as_bytes()).await.unwrap();
        assert_eq!(summary.rows_parsed, 1);
        assert_eq!(summary.rows_committed, 1);

        let stored = Customer::find_by_email(&pool, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.business_expenses, 500);
        assert_eq!(stored.business_growth_rate, 2.0);
        assert_eq!(stored.customer_satisfaction_score, 9);
        assert_eq!(stored.loyalty_points, 40);
    }
}
