use crate::Database;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl Database {
    pub fn insert_sign_in_token(
        &self,
        token_hash: &str,
        email: &str,
        ttl_minutes: u32,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sign_in_tokens (token_hash, email, expires_at)
                 VALUES (?1, ?2, datetime('now', ?3))",
                params![token_hash, email, format!("+{} minutes", ttl_minutes)],
            )?;
            Ok(())
        })
    }

    /// Atomically consume a live token. Returns the email it was issued for,
    /// or None when the token is unknown, expired, or already used.
    pub fn consume_sign_in_token(&self, token_hash: &str) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let email: Option<String> = tx
                .query_row(
                    "SELECT email FROM sign_in_tokens
                     WHERE token_hash = ?1
                       AND consumed_at IS NULL
                       AND expires_at > datetime('now')",
                    [token_hash],
                    |row| row.get(0),
                )
                .optional()?;

            if email.is_some() {
                tx.execute(
                    "UPDATE sign_in_tokens SET consumed_at = datetime('now') WHERE token_hash = ?1",
                    [token_hash],
                )?;
            }

            tx.commit()?;
            Ok(email)
        })
    }
}
