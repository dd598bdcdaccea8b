use crate::Database;
use crate::models::{ConnectionRow, ProfileRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn connection_from_row(row: &Row) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        addressee_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        responded_at: row.get(5)?,
    })
}

const CONNECTION_COLS: &str =
    "c.id, c.requester_id, c.addressee_id, c.status, c.created_at, c.responded_at";

impl Database {
    /// A pending or accepted connection between the pair, in either
    /// orientation. Declined connections are not live.
    pub fn find_live_connection(&self, a: &str, b: &str) -> Result<Option<ConnectionRow>> {
        let (low, high) = super::pair_key(a, b);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM connections c
                 WHERE c.user_low = ?1 AND c.user_high = ?2
                   AND c.status IN ('pending', 'accepted')",
                CONNECTION_COLS
            ))?;

            let row = stmt
                .query_row(params![low, high], connection_from_row)
                .optional()?;

            Ok(row)
        })
    }

    pub fn create_connection(&self, id: &str, requester: &str, addressee: &str) -> Result<()> {
        let (low, high) = super::pair_key(requester, addressee);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO connections (id, requester_id, addressee_id, user_low, user_high)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, requester, addressee, low, high],
            )?;
            Ok(())
        })
    }

    pub fn get_connection(&self, id: &str) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM connections c WHERE c.id = ?1",
                CONNECTION_COLS
            ))?;

            let row = stmt.query_row([id], connection_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn set_connection_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE connections
                 SET status = ?2, responded_at = datetime('now')
                 WHERE id = ?1",
                params![id, status],
            )?;
            Ok(())
        })
    }

    pub fn delete_connection(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM connections WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// The user's connections with the other party's profile, newest first.
    pub fn list_connections_for_user(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<(ConnectionRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, {}
                 FROM connections c
                 JOIN profiles p ON p.id = CASE
                     WHEN c.requester_id = ?1 THEN c.addressee_id
                     ELSE c.requester_id
                 END
                 WHERE (c.requester_id = ?1 OR c.addressee_id = ?1)
                   AND (?2 IS NULL OR c.status = ?2)
                 ORDER BY c.created_at DESC",
                CONNECTION_COLS,
                super::PROFILE_COLS
            ))?;

            let rows = stmt
                .query_map(params![user_id, status], |row| {
                    Ok((connection_from_row(row)?, super::profile_from_row(row, 6)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_profile, test_db};

    #[test]
    fn second_request_for_pair_is_blocked_while_live() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_connection("c1", "a", "b").unwrap();
        // Reverse orientation hits the same pair slot.
        assert!(db.create_connection("c2", "b", "a").is_err());
    }

    #[test]
    fn declined_connection_allows_a_new_request() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_connection("c1", "a", "b").unwrap();
        db.set_connection_status("c1", "declined").unwrap();
        assert!(db.find_live_connection("a", "b").unwrap().is_none());

        db.create_connection("c2", "b", "a").unwrap();
        let live = db.find_live_connection("a", "b").unwrap().unwrap();
        assert_eq!(live.id, "c2");
        assert_eq!(live.requester_id, "b");
    }

    #[test]
    fn list_returns_the_other_party_profile() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_connection("c1", "a", "b").unwrap();
        db.set_connection_status("c1", "accepted").unwrap();

        let for_a = db.list_connections_for_user("a", Some("accepted")).unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].1.id, "b");

        let for_b = db.list_connections_for_user("b", None).unwrap();
        assert_eq!(for_b[0].1.id, "a");

        assert!(
            db.list_connections_for_user("a", Some("pending"))
                .unwrap()
                .is_empty()
        );
    }
}
