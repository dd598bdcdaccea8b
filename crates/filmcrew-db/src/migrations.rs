use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id              TEXT PRIMARY KEY,
            email           TEXT NOT NULL UNIQUE,
            display_name    TEXT NOT NULL,
            headline        TEXT,
            department      TEXT,
            location        TEXT,
            bio             TEXT,
            avatar_key      TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sign_in_tokens (
            token_hash  TEXT PRIMARY KEY,
            email       TEXT NOT NULL,
            expires_at  TEXT NOT NULL,
            consumed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS connections (
            id              TEXT PRIMARY KEY,
            requester_id    TEXT NOT NULL REFERENCES profiles(id),
            addressee_id    TEXT NOT NULL REFERENCES profiles(id),
            user_low        TEXT NOT NULL,
            user_high       TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'accepted', 'declined')),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            responded_at    TEXT
        );

        -- At most one live connection per unordered pair; a declined
        -- connection does not block a later request.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_connections_pair
            ON connections(user_low, user_high)
            WHERE status IN ('pending', 'accepted');

        CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            user_low    TEXT NOT NULL REFERENCES profiles(id),
            user_high   TEXT NOT NULL REFERENCES profiles(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_low, user_high)
        );

        CREATE TABLE IF NOT EXISTS conversation_participants (
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            user_id         TEXT NOT NULL REFERENCES profiles(id),
            joined_at       TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (conversation_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            sender_id       TEXT NOT NULL REFERENCES profiles(id),
            body            TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            read_at         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);

        CREATE TABLE IF NOT EXISTS production_companies (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            slug        TEXT NOT NULL UNIQUE,
            description TEXT,
            website     TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS production_company_members (
            company_id  TEXT NOT NULL REFERENCES production_companies(id),
            user_id     TEXT NOT NULL REFERENCES profiles(id),
            role        TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'member')),
            joined_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (company_id, user_id)
        );

        -- Exactly one owner per company.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_company_owner
            ON production_company_members(company_id)
            WHERE role = 'owner';

        CREATE TABLE IF NOT EXISTS company_invitations (
            id          TEXT PRIMARY KEY,
            company_id  TEXT NOT NULL REFERENCES production_companies(id),
            invitee_id  TEXT NOT NULL REFERENCES profiles(id),
            inviter_id  TEXT NOT NULL REFERENCES profiles(id),
            role        TEXT NOT NULL CHECK (role IN ('admin', 'member')),
            status      TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'accepted', 'declined')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            responded_at TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_invitations_pending
            ON company_invitations(company_id, invitee_id)
            WHERE status = 'pending';

        CREATE TABLE IF NOT EXISTS productions (
            id          TEXT PRIMARY KEY,
            company_id  TEXT NOT NULL REFERENCES production_companies(id),
            title       TEXT NOT NULL,
            logline     TEXT,
            status      TEXT NOT NULL DEFAULT 'development'
                        CHECK (status IN ('development', 'pre_production',
                                          'production', 'post_production', 'wrapped')),
            starts_on   TEXT,
            wraps_on    TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS job_posts (
            id              TEXT PRIMARY KEY,
            production_id   TEXT NOT NULL REFERENCES productions(id),
            title           TEXT NOT NULL,
            department      TEXT NOT NULL,
            description     TEXT,
            rate            TEXT,
            status          TEXT NOT NULL DEFAULT 'open'
                            CHECK (status IN ('open', 'closed')),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_job_posts_status
            ON job_posts(status, department);

        CREATE TABLE IF NOT EXISTS job_applications (
            id           TEXT PRIMARY KEY,
            job_id       TEXT NOT NULL REFERENCES job_posts(id),
            applicant_id TEXT NOT NULL REFERENCES profiles(id),
            note         TEXT,
            status       TEXT NOT NULL DEFAULT 'submitted'
                         CHECK (status IN ('submitted', 'accepted', 'declined')),
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            responded_at TEXT,
            UNIQUE (job_id, applicant_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
