use crate::Database;
use crate::models::{ConversationRow, MessageRow, ProfileRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn conversation_from_row(row: &Row) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        user_low: row.get(1)?,
        user_high: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
        read_at: row.get(5)?,
    })
}

const MESSAGE_COLS: &str = "m.id, m.conversation_id, m.sender_id, m.body, m.created_at, m.read_at";

impl Database {
    /// The transactional find-or-create keyed by the unordered user pair:
    /// at most one conversation ever exists for a pair. Returns the row and
    /// whether it was created by this call.
    pub fn find_or_create_conversation(
        &self,
        new_id: &str,
        a: &str,
        b: &str,
    ) -> Result<(ConversationRow, bool)> {
        let (low, high) = super::pair_key(a, b);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    "SELECT id, user_low, user_high, created_at
                     FROM conversations WHERE user_low = ?1 AND user_high = ?2",
                    params![low, high],
                    conversation_from_row,
                )
                .optional()?;

            if let Some(row) = existing {
                tx.commit()?;
                return Ok((row, false));
            }

            tx.execute(
                "INSERT INTO conversations (id, user_low, user_high) VALUES (?1, ?2, ?3)",
                params![new_id, low, high],
            )?;
            tx.execute(
                "INSERT INTO conversation_participants (conversation_id, user_id)
                 VALUES (?1, ?2), (?1, ?3)",
                params![new_id, low, high],
            )?;

            let row = tx.query_row(
                "SELECT id, user_low, user_high, created_at FROM conversations WHERE id = ?1",
                [new_id],
                conversation_from_row,
            )?;

            tx.commit()?;
            Ok((row, true))
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_low, user_high, created_at FROM conversations WHERE id = ?1",
                    [id],
                    conversation_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Membership is defined by the participant link table.
    pub fn is_participant(&self, conversation_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM conversation_participants
                     WHERE conversation_id = ?1 AND user_id = ?2
                 )",
                params![conversation_id, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// The user's conversations with the other participant's profile.
    pub fn conversations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<(ConversationRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT c.id, c.user_low, c.user_high, c.created_at, {}
                 FROM conversations c
                 JOIN conversation_participants cp
                   ON cp.conversation_id = c.id AND cp.user_id = ?1
                 JOIN profiles p ON p.id = CASE
                     WHEN c.user_low = ?1 THEN c.user_high
                     ELSE c.user_low
                 END
                 ORDER BY c.created_at DESC",
                super::PROFILE_COLS
            ))?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok((conversation_from_row(row)?, super::profile_from_row(row, 4)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Batch-fetch every message across a set of conversations, newest
    /// first. Row ids break same-second timestamp ties.
    pub fn messages_for_conversations(
        &self,
        conversation_ids: &[String],
    ) -> Result<Vec<MessageRow>> {
        if conversation_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=conversation_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {} FROM messages m
                 WHERE m.conversation_id IN ({})
                 ORDER BY m.created_at DESC, m.rowid DESC",
                MESSAGE_COLS,
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = conversation_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Full history for one conversation, oldest first.
    pub fn messages_for_conversation(&self, conversation_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM messages m
                 WHERE m.conversation_id = ?1
                 ORDER BY m.created_at ASC, m.rowid ASC",
                MESSAGE_COLS
            ))?;

            let rows = stmt
                .query_map([conversation_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn insert_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, body)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, conversation_id, sender_id, body],
            )?;
            Ok(())
        })
    }

    /// One batched update: set read_at on every message in the conversation
    /// that the reader did not send and has not read yet. Returns the ids
    /// that were affected.
    pub fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<Vec<String>> {
        self.with_conn_mut(|conn| {
            let mut stmt = conn.prepare(
                "UPDATE messages SET read_at = datetime('now')
                 WHERE conversation_id = ?1
                   AND sender_id != ?2
                   AND read_at IS NULL
                 RETURNING id",
            )?;

            let ids = stmt
                .query_map(params![conversation_id, reader_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;

            Ok(ids)
        })
    }

    /// Total unread for a user across every conversation they belong to.
    /// This is the authoritative count the badge shows.
    pub fn unread_count_for_user(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*)
                 FROM messages m
                 JOIN conversation_participants cp
                   ON cp.conversation_id = m.conversation_id AND cp.user_id = ?1
                 WHERE m.sender_id != ?1 AND m.read_at IS NULL",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(total)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_profile, test_db};

    #[test]
    fn find_or_create_is_keyed_by_the_unordered_pair() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        let (first, created) = db.find_or_create_conversation("conv1", "a", "b").unwrap();
        assert!(created);

        // Reverse order finds the same conversation and ignores the new id.
        let (second, created) = db.find_or_create_conversation("conv2", "b", "a").unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        assert!(db.is_participant(&first.id, "a").unwrap());
        assert!(db.is_participant(&first.id, "b").unwrap());
        assert!(!db.is_participant(&first.id, "x").unwrap());
    }

    #[test]
    fn mark_read_touches_exactly_the_unread_messages_from_the_other_party() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");
        let (conv, _) = db.find_or_create_conversation("conv1", "a", "b").unwrap();

        db.insert_message("m1", &conv.id, "b", "hello").unwrap();
        db.insert_message("m2", &conv.id, "b", "anyone there?").unwrap();
        db.insert_message("m3", &conv.id, "a", "hi!").unwrap();

        let mut marked = db.mark_conversation_read(&conv.id, "a").unwrap();
        marked.sort();
        assert_eq!(marked, vec!["m1".to_string(), "m2".to_string()]);

        // A second pass finds nothing left to mark.
        assert!(db.mark_conversation_read(&conv.id, "a").unwrap().is_empty());

        // a's own message is still unread from b's perspective.
        assert_eq!(db.unread_count_for_user("b").unwrap(), 1);
        assert_eq!(db.unread_count_for_user("a").unwrap(), 0);
    }

    #[test]
    fn unread_count_spans_conversations() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");
        seed_profile(&db, "c", "cam@example.com");

        let (ab, _) = db.find_or_create_conversation("conv1", "a", "b").unwrap();
        let (ac, _) = db.find_or_create_conversation("conv2", "a", "c").unwrap();

        db.insert_message("m1", &ab.id, "b", "ping").unwrap();
        db.insert_message("m2", &ac.id, "c", "ping").unwrap();
        db.insert_message("m3", &ac.id, "c", "ping again").unwrap();

        assert_eq!(db.unread_count_for_user("a").unwrap(), 3);

        db.mark_conversation_read(&ac.id, "a").unwrap();
        assert_eq!(db.unread_count_for_user("a").unwrap(), 1);
    }

    #[test]
    fn message_order_is_stable_within_a_second() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");
        let (conv, _) = db.find_or_create_conversation("conv1", "a", "b").unwrap();

        for i in 0..5 {
            db.insert_message(&format!("m{}", i), &conv.id, "a", "x").unwrap();
        }

        let oldest_first: Vec<String> = db
            .messages_for_conversation(&conv.id)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(oldest_first, vec!["m0", "m1", "m2", "m3", "m4"]);

        let newest_first: Vec<String> = db
            .messages_for_conversations(&[conv.id.clone()])
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(newest_first, vec!["m4", "m3", "m2", "m1", "m0"]);
    }
}
