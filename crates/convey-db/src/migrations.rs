use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            hash        BLOB PRIMARY KEY,
            topic       TEXT NOT NULL,
            author      TEXT NOT NULL,
            timestamp   INTEGER NOT NULL,
            cost        INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_timestamp
            ON conversations(timestamp);

        -- previous is NULL only for the root message of a conversation
        CREATE TABLE IF NOT EXISTS messages (
            hash            BLOB PRIMARY KEY,
            conversation    BLOB NOT NULL REFERENCES conversations(hash),
            previous        BLOB,
            author          TEXT NOT NULL,
            timestamp       INTEGER NOT NULL,
            cost            INTEGER NOT NULL DEFAULT 0,
            media_type      TEXT NOT NULL,
            content         BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation);

        CREATE TABLE IF NOT EXISTS ledger (
            alias   TEXT PRIMARY KEY,
            minted  INTEGER NOT NULL DEFAULT 0,
            burned  INTEGER NOT NULL DEFAULT 0,
            bought  INTEGER NOT NULL DEFAULT 0,
            sold    INTEGER NOT NULL DEFAULT 0,
            earned  INTEGER NOT NULL DEFAULT 0,
            spent   INTEGER NOT NULL DEFAULT 0
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
