use crate::Database;
use crate::models::ProfileRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

impl Database {
    pub fn create_profile(&self, id: &str, email: &str, display_name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, email, display_name) VALUES (?1, ?2, ?3)",
                params![id, email, display_name],
            )?;
            Ok(())
        })
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "id", id))
    }

    pub fn get_profile_by_email(&self, email: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "email", email))
    }

    /// Partial update; absent fields keep their current value.
    pub fn update_profile(
        &self,
        id: &str,
        display_name: Option<&str>,
        headline: Option<&str>,
        department: Option<&str>,
        location: Option<&str>,
        bio: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE profiles SET
                    display_name = COALESCE(?2, display_name),
                    headline     = COALESCE(?3, headline),
                    department   = COALESCE(?4, department),
                    location     = COALESCE(?5, location),
                    bio          = COALESCE(?6, bio)
                 WHERE id = ?1",
                params![id, display_name, headline, department, location, bio],
            )?;
            Ok(())
        })
    }

    pub fn set_avatar_key(&self, id: &str, key: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE profiles SET avatar_key = ?2 WHERE id = ?1",
                params![id, key],
            )?;
            Ok(())
        })
    }
}

fn query_profile(conn: &Connection, column: &str, value: &str) -> Result<Option<ProfileRow>> {
    // `column` is one of two fixed identifiers, never user input.
    let sql = format!(
        "SELECT id, email, display_name, headline, department, location, bio, avatar_key, created_at
         FROM profiles WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| super::profile_from_row(row, 0))
        .optional()?;

    Ok(row)
}
