//! Client repository for database operations.

use sqlx::postgres::{PgConnection, Postgres};
use sqlx::{Connection, Transaction};
use tracing::{debug, warn};
use validator::Validate;

use domain::models::client::{
    Client, ClientFilter, ClientId, ClientSummary, ClientUpdate, NewClient, Phone,
};

use crate::db::{self, DatabaseConfig};
use crate::entities::{ClientEntity, ClientSummaryEntity, PhoneEntity};
use crate::error::{check_violation, PersistenceError};
use crate::metrics::QueryTimer;
use crate::schema;

const FIND_CLIENTS_SQL: &str = r#"
    SELECT c.id, c.first_name, c.last_name, c.email,
           COALESCE(
               array_agg(cp.phone::text ORDER BY cp.id) FILTER (WHERE cp.phone IS NOT NULL),
               '{}'::text[]
           ) AS phones
    FROM client c
    LEFT JOIN client_phone cp ON cp.client_id = c.id
    WHERE ($1::text IS NULL OR c.first_name = $1)
      AND ($2::text IS NULL OR c.last_name = $2)
      AND ($3::text IS NULL OR c.email = $3)
      AND ($4::text IS NULL OR EXISTS (
              SELECT 1 FROM client_phone p
              WHERE p.client_id = c.id AND p.phone = $4
          ))
    GROUP BY c.id
    ORDER BY c.id
"#;

/// Repository for client and phone records.
///
/// Owns a single connection for its whole lifetime. Every operation takes
/// `&mut self`, so statements are never interleaved on the connection.
pub struct ClientRepository {
    conn: PgConnection,
}

impl ClientRepository {
    /// Validates the configuration and opens a connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        config.validate()?;
        let conn = db::connect(config).await?;
        debug!(host = %config.host, database = %config.database, "Connected to database");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already open connection.
    pub fn from_connection(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Gracefully terminates the connection.
    ///
    /// Dropping the repository also closes the socket, without the
    /// termination handshake.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }

    /// Creates the client tables if they do not exist. Safe to call repeatedly.
    pub async fn initialize_schema(&mut self) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("initialize_schema");
        schema::initialize(&mut self.conn).await?;
        timer.record();
        debug!("Client schema initialized");
        Ok(())
    }

    /// Starts a transaction whose writes are committed by the caller.
    pub async fn begin(&mut self) -> Result<ClientTransaction<'_>, sqlx::Error> {
        let tx = self.conn.begin().await?;
        Ok(ClientTransaction { tx })
    }

    /// Create a client together with its phones.
    ///
    /// The client row and every phone are written in one transaction.
    /// Returns `None` if a check constraint rejected any of the rows, in
    /// which case nothing is persisted.
    pub async fn add_client(&mut self, client: &NewClient) -> Result<Option<ClientId>, sqlx::Error> {
        let timer = QueryTimer::new("add_client");
        let mut tx = self.conn.begin().await?;
        let result = insert_client_with_phones(&mut tx, client).await;
        let client_id = commit_or_reject(tx, result).await?;
        timer.record();

        if let Some(id) = client_id {
            debug!(client_id = id, phones = client.phones.len(), "Client created");
        }
        Ok(client_id)
    }

    /// Add a phone to an existing client and commit immediately.
    ///
    /// Returns `false` if the phone was rejected by its format constraint.
    /// A missing client surfaces as a foreign key error.
    pub async fn add_phone(&mut self, client_id: ClientId, phone: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("add_phone");
        let result = insert_phone(&mut self.conn, client_id, phone).await;
        timer.record();

        match result {
            Ok(()) => {
                debug!(client_id, "Phone added");
                Ok(true)
            }
            Err(err) => match check_violation(&err) {
                Some(kind) => {
                    warn!(client_id, constraint = ?kind, "{}", kind.user_message());
                    Ok(false)
                }
                None => Err(err),
            },
        }
    }

    /// Update a client (partial update).
    ///
    /// Only provided fields are updated. When `phones` is provided, every
    /// phone the client owns is replaced by the given list. All changes are
    /// committed together; returns `false` if a check constraint rejected
    /// any of them, in which case nothing is changed.
    pub async fn update_client(
        &mut self,
        client_id: ClientId,
        update: &ClientUpdate,
    ) -> Result<bool, sqlx::Error> {
        if update.is_empty() {
            return Ok(true);
        }

        let timer = QueryTimer::new("update_client");
        let mut tx = self.conn.begin().await?;
        let result = apply_update(&mut tx, client_id, update).await;
        let applied = commit_or_reject(tx, result).await?.is_some();
        timer.record();

        if applied {
            debug!(
                client_id,
                replaced_phones = update.phones.is_some(),
                "Client updated"
            );
        }
        Ok(applied)
    }

    /// Delete the phone rows of a client that match `phone` exactly.
    /// Returns the number of rows deleted.
    pub async fn delete_phone(&mut self, client_id: ClientId, phone: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_phone");
        let result = sqlx::query(
            r#"
            DELETE FROM client_phone
            WHERE client_id = $1 AND phone = $2
            "#,
        )
        .bind(client_id)
        .bind(phone)
        .execute(&mut self.conn)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Delete a client and all its phones.
    /// Returns the number of client rows deleted (0 or 1).
    pub async fn delete_client(&mut self, client_id: ClientId) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_client");
        let mut tx = self.conn.begin().await?;

        let phones = delete_phones_of(&mut tx, client_id).await?;
        let result = sqlx::query(
            r#"
            DELETE FROM client WHERE id = $1
            "#,
        )
        .bind(client_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        debug!(client_id, phones, "Client deleted");
        Ok(result.rows_affected())
    }

    /// Find clients matching every criterion set in `filter`, in insertion order.
    ///
    /// A phone criterion selects clients owning that phone; their summaries
    /// still list all of their phones.
    pub async fn find_clients(&mut self, filter: &ClientFilter) -> Result<Vec<ClientSummary>, sqlx::Error> {
        let timer = QueryTimer::new("find_clients");
        let rows = sqlx::query_as::<_, ClientSummaryEntity>(FIND_CLIENTS_SQL)
            .bind(filter.first_name.as_deref())
            .bind(filter.last_name.as_deref())
            .bind(filter.email.as_deref())
            .bind(filter.phone.as_deref())
            .fetch_all(&mut self.conn)
            .await?;
        timer.record();
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List every client with its phones.
    pub async fn list_all_clients(&mut self) -> Result<Vec<ClientSummary>, sqlx::Error> {
        self.find_clients(&ClientFilter::default()).await
    }

    /// Find client by ID.
    pub async fn find_by_id(&mut self, client_id: ClientId) -> Result<Option<Client>, sqlx::Error> {
        let timer = QueryTimer::new("find_client_by_id");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            SELECT id, first_name, last_name, email FROM client WHERE id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&mut self.conn)
        .await?;
        timer.record();
        Ok(result.map(Into::into))
    }

    /// Find all phones of a client, oldest first.
    pub async fn find_phones(&mut self, client_id: ClientId) -> Result<Vec<Phone>, sqlx::Error> {
        let timer = QueryTimer::new("find_phones_by_client");
        let rows = sqlx::query_as::<_, PhoneEntity>(
            r#"
            SELECT id, client_id, phone FROM client_phone
            WHERE client_id = $1
            ORDER BY id
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut self.conn)
        .await?;
        timer.record();
        Ok(rows.into_iter().filter_map(PhoneEntity::into_domain).collect())
    }
}

/// A transaction on the repository connection.
///
/// Dropping it without calling [`ClientTransaction::commit`] rolls back.
pub struct ClientTransaction<'c> {
    tx: Transaction<'c, Postgres>,
}

impl ClientTransaction<'_> {
    /// Add a phone without committing.
    ///
    /// Each insert runs in its own savepoint: a phone rejected by its format
    /// constraint is discarded and reported as `false` while earlier writes
    /// in the transaction stay intact.
    pub async fn add_phone(&mut self, client_id: ClientId, phone: &str) -> Result<bool, sqlx::Error> {
        let mut savepoint = Connection::begin(&mut *self.tx).await?;
        let result = insert_phone(&mut savepoint, client_id, phone).await;
        Ok(commit_or_reject(savepoint, result).await?.is_some())
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

/// Commits `tx` if `result` succeeded. A check violation is logged, rolled
/// back and turned into `None`; any other error propagates and the dropped
/// transaction rolls back.
async fn commit_or_reject<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, sqlx::Error>,
) -> Result<Option<T>, sqlx::Error> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(Some(value))
        }
        Err(err) => match check_violation(&err) {
            Some(kind) => {
                warn!(constraint = ?kind, "{}", kind.user_message());
                tx.rollback().await?;
                Ok(None)
            }
            None => Err(err),
        },
    }
}

async fn insert_client_with_phones(
    conn: &mut PgConnection,
    client: &NewClient,
) -> Result<ClientId, sqlx::Error> {
    let (client_id,): (ClientId,) = sqlx::query_as(
        r#"
        INSERT INTO client (first_name, last_name, email)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(client.first_name.as_deref())
    .bind(client.last_name.as_deref())
    .bind(client.email.as_deref())
    .fetch_one(&mut *conn)
    .await?;

    for phone in &client.phones {
        insert_phone(conn, client_id, phone).await?;
    }
    Ok(client_id)
}

async fn insert_phone(conn: &mut PgConnection, client_id: ClientId, phone: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO client_phone (client_id, phone)
        VALUES ($1, $2)
        "#,
    )
    .bind(client_id)
    .bind(phone)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn apply_update(
    conn: &mut PgConnection,
    client_id: ClientId,
    update: &ClientUpdate,
) -> Result<(), sqlx::Error> {
    if update.touches_fields() {
        sqlx::query(
            r#"
            UPDATE client SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email)
            WHERE id = $1
            "#,
        )
        .bind(client_id)
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .bind(update.email.as_deref())
        .execute(&mut *conn)
        .await?;
    }

    if let Some(phones) = &update.phones {
        delete_phones_of(conn, client_id).await?;
        for phone in phones {
            insert_phone(conn, client_id, phone).await?;
        }
    }
    Ok(())
}

async fn delete_phones_of(conn: &mut PgConnection, client_id: ClientId) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM client_phone WHERE client_id = $1
        "#,
    )
    .bind(client_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}
