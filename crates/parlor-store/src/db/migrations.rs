use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages (
            collection  TEXT NOT NULL,
            id          TEXT NOT NULL,
            name        TEXT NOT NULL DEFAULT '',
            photo_url   TEXT,
            text        TEXT,
            image_url   TEXT,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (collection, id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
