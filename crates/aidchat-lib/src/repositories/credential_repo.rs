// Credential Repository
// Stores the sealed bearer token in its single-row table.

use chrono::Utc;
use rusqlite::params;

use crate::services::crypto::SealedToken;
use crate::utils::database::Database;

/// Repository for the persisted session credential
#[derive(Clone)]
pub struct CredentialRepository {
    db: Database,
}

impl CredentialRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or replace the sealed token
    pub fn save(&self, sealed: &SealedToken) -> Result<(), String> {
        let now = Utc::now().to_rfc3339();
        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO session_credential (id, ciphertext, nonce, created_at, updated_at)
                VALUES (1, ?1, ?2, ?3, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    ciphertext = excluded.ciphertext,
                    nonce = excluded.nonce,
                    updated_at = excluded.updated_at
                "#,
                params![sealed.ciphertext, sealed.nonce, now],
            )
            .map_err(|e| format!("Failed to store credential: {}", e))?;
            Ok(())
        })
    }

    /// Load the sealed token, if one is stored
    pub fn load(&self) -> Result<Option<SealedToken>, String> {
        self.db.with_connection(|conn| {
            let result = conn.query_row(
                "SELECT ciphertext, nonce FROM session_credential WHERE id = 1",
                [],
                |row| {
                    Ok(SealedToken {
                        ciphertext: row.get(0)?,
                        nonce: row.get(1)?,
                    })
                },
            );

            match result {
                Ok(sealed) => Ok(Some(sealed)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(format!("Failed to load credential: {}", e)),
            }
        })
    }

    /// Remove the stored token; returns whether a row existed
    pub fn delete(&self) -> Result<bool, String> {
        self.db.with_connection(|conn| {
            let rows = conn
                .execute("DELETE FROM session_credential WHERE id = 1", [])
                .map_err(|e| format!("Failed to delete credential: {}", e))?;
            Ok(rows > 0)
        })
    }
}
