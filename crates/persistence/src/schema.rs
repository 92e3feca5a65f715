//! Schema definition for the client tables.

use sqlx::PgConnection;

/// DDL for the `client` and `client_phone` tables.
pub const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

pub const CLIENT_TABLE: &str = "client";
pub const CLIENT_PHONE_TABLE: &str = "client_phone";

/// Creates the client tables, their check constraints and the foreign key
/// if they do not exist yet.
///
/// The script runs as a single simple query, which PostgreSQL executes in
/// one implicit transaction.
pub async fn initialize(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(&mut *conn).await?;
    Ok(())
}
