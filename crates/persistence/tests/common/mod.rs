//! Common test utilities for integration tests.
//!
//! These helpers connect to a real PostgreSQL database given by the
//! `TEST_DATABASE_URL` environment variable. When it is not set,
//! [`test_repository`] returns `None` and the calling test returns early.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use persistence::repositories::ClientRepository;
use sqlx::{Connection, PgConnection};
use tokio::sync::OnceCell;

static SCHEMA: OnceCell<()> = OnceCell::const_new();
static COUNTER: AtomicU64 = AtomicU64::new(0);

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

async fn open(url: &str) -> ClientRepository {
    let conn = PgConnection::connect(url)
        .await
        .expect("Failed to connect to test database");
    ClientRepository::from_connection(conn)
}

/// Open a repository against the test database with the schema in place.
pub async fn test_repository() -> Option<ClientRepository> {
    let url = database_url()?;

    // Concurrent CREATE TABLE IF NOT EXISTS can race, so create once per binary.
    SCHEMA
        .get_or_init(|| {
            let url = url.clone();
            async move {
                let mut repo = open(&url).await;
                repo.initialize_schema()
                    .await
                    .expect("Failed to initialize schema");
                repo.close().await.ok();
            }
        })
        .await;

    Some(open(&url).await)
}

/// A suffix unique to this process and call.
pub fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}{}", std::process::id(), nanos % 1_000_000_000, n)
}

/// A first name no other test uses.
pub fn unique_first_name() -> String {
    let name: String = FirstName().fake();
    format!("{name}-{}", unique_suffix())
}

/// A last name no other test uses.
pub fn unique_last_name() -> String {
    let name: String = LastName().fake();
    format!("{name}-{}", unique_suffix())
}

/// A well-formed email no other test uses.
pub fn unique_email() -> String {
    format!("client.{}@mail.example.com", unique_suffix())
}

/// A well-formed phone number no other test uses.
pub fn unique_phone() -> String {
    format!("+1-{}", unique_suffix())
}
