use crate::db::Database;
use crate::db::models::MessageRow;
use anyhow::Result;
use parlor_types::models::MessageRecord;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    pub fn get_messages(&self, collection: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, collection))
    }

    pub fn get_message(&self, collection: &str, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, collection, id))
    }

    pub fn count_messages(&self, collection: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE collection = ?1",
                [collection],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

/// Insert or overwrite a record. Returns true when the id already existed.
pub fn upsert_message(conn: &Connection, collection: &str, id: &str, record: &MessageRecord) -> Result<bool> {
    let existed = message_exists(conn, collection, id)?;
    conn.execute(
        "INSERT INTO messages (collection, id, name, photo_url, text, image_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (collection, id) DO UPDATE SET
             name = excluded.name,
             photo_url = excluded.photo_url,
             text = excluded.text,
             image_url = excluded.image_url,
             updated_at = datetime('now')",
        rusqlite::params![
            collection,
            id,
            record.sender_name,
            record.sender_photo_ref,
            record.text,
            record.image_ref.as_ref().map(|r| r.as_str()),
        ],
    )?;
    Ok(existed)
}

/// Returns false when nothing matched.
pub fn delete_message(conn: &Connection, collection: &str, id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM messages WHERE collection = ?1 AND id = ?2",
        [collection, id],
    )?;
    Ok(deleted > 0)
}

pub fn message_exists(conn: &Connection, collection: &str, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM messages WHERE collection = ?1 AND id = ?2",
            [collection, id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Id right before `id` in store order.
pub fn preceding_id(conn: &Connection, collection: &str, id: &str) -> Result<Option<String>> {
    let prev = conn
        .query_row(
            "SELECT id FROM messages WHERE collection = ?1 AND id < ?2 ORDER BY id DESC LIMIT 1",
            [collection, id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(prev)
}

pub fn query_messages(conn: &Connection, collection: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, photo_url, text, image_url FROM messages
         WHERE collection = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([collection], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                name: row.get(1)?,
                photo_url: row.get(2)?,
                text: row.get(3)?,
                image_url: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_message(conn: &Connection, collection: &str, id: &str) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, photo_url, text, image_url FROM messages
             WHERE collection = ?1 AND id = ?2",
            [collection, id],
            |row| {
                Ok(MessageRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    photo_url: row.get(2)?,
                    text: row.get(3)?,
                    image_url: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_types::models::ImageRef;

    fn record(text: Option<&str>, image: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: None,
            sender_name: "ada".into(),
            sender_photo_ref: None,
            text: text.map(str::to_string),
            image_ref: image.map(ImageRef::new),
        }
    }

    #[test]
    fn test_upsert_reports_existing() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            assert!(!upsert_message(conn, "messages", "b", &record(Some("hi"), None))?);
            assert!(upsert_message(conn, "messages", "b", &record(None, Some("gs://x")))?);
            Ok(())
        })
        .unwrap();

        let row = db.get_message("messages", "b").unwrap().unwrap().into_record();
        assert_eq!(row.text, None);
        assert_eq!(row.image_ref, Some(ImageRef::new("gs://x")));
        assert_eq!(db.count_messages("messages").unwrap(), 1);
    }

    #[test]
    fn test_order_and_preceding() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            for id in ["c", "a", "b"] {
                upsert_message(conn, "messages", id, &record(Some(id), None))?;
            }
            upsert_message(conn, "other", "aa", &record(Some("x"), None))?;

            assert_eq!(preceding_id(conn, "messages", "a")?, None);
            assert_eq!(preceding_id(conn, "messages", "b")?, Some("a".to_string()));
            assert_eq!(preceding_id(conn, "messages", "bb")?, Some("b".to_string()));
            Ok(())
        })
        .unwrap();

        let ids: Vec<String> = db
            .get_messages("messages")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            upsert_message(conn, "messages", "a", &record(Some("x"), None))?;
            assert!(delete_message(conn, "messages", "a")?);
            assert!(!delete_message(conn, "messages", "a")?);
            Ok(())
        })
        .unwrap();
    }
}
