// Credential store - one SQLite row holding the client registration and the
// current token pair. Opened once at startup, closed once at shutdown.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::spotify::{ClientInfo, TokenSet};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("stored expiry {value:?} is not a valid timestamp: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// What is on disk. `tokens` is `None` until the first login finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub client: ClientInfo,
    pub tokens: Option<TokenSet>,
    pub authorized: bool,
}

pub struct CredentialStore {
    conn: Connection,
}

impl CredentialStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.initialize_tables()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize_tables()?;
        Ok(store)
    }

    fn initialize_tables(&self) -> Result<(), StoreError> {
        // Single row, pinned to id 1
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS client_config (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                client_id TEXT NOT NULL,
                client_secret TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                access_token TEXT,
                refresh_token TEXT,
                expires_at TEXT, -- RFC 3339
                authorized INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT client_id, client_secret, redirect_uri, access_token, refresh_token,
                        expires_at, authorized
                 FROM client_config WHERE id = 1",
                [],
                |row| {
                    Ok((
                        ClientInfo {
                            client_id: row.get(0)?,
                            client_secret: row.get(1)?,
                            redirect_uri: row.get(2)?,
                        },
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, bool>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((client, access, refresh, expires_at, authorized)) = row else {
            return Ok(None);
        };

        // Both tokens or neither; a half-written pair means log in again
        let tokens = match (non_empty(access), non_empty(refresh), expires_at) {
            (Some(access_token), Some(refresh_token), Some(expires_at)) => Some(TokenSet {
                access_token,
                refresh_token,
                expires_at: parse_timestamp(&expires_at)?,
            }),
            _ => None,
        };

        Ok(Some(StoredCredentials {
            client,
            tokens,
            authorized,
        }))
    }

    /// First run: the client registration goes in, unauthorized, no tokens.
    pub fn insert(&self, client: &ClientInfo) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO client_config
                (id, client_id, client_secret, redirect_uri, access_token, refresh_token, expires_at, authorized)
             VALUES (1, ?1, ?2, ?3, NULL, NULL, NULL, 0)",
            params![client.client_id, client.client_secret, client.redirect_uri],
        )?;
        debug!("client registration stored");
        Ok(())
    }

    /// Saves a token set and marks the row authorized.
    pub fn update_tokens(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE client_config
             SET access_token = ?1, refresh_token = ?2, expires_at = ?3, authorized = 1,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = 1",
            params![
                tokens.access_token,
                tokens.refresh_token,
                tokens.expires_at.to_rfc3339()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::Sql(rusqlite::Error::QueryReturnedNoRows));
        }
        debug!(expires_at = %tokens.expires_at, "tokens stored");
        Ok(())
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sql(e))?;
        debug!("credential store closed");
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp {
            value: value.to_string(),
            source,
        })
}
