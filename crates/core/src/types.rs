/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts are integer cents. The catalog and all payments use the
/// same single currency, so no currency code travels with the value.
pub type Cents = i64;
