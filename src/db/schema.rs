//! Database schema and migrations for Folio.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. Timestamps are stored as RFC 3339 UTC text (see `crate::datetime`).

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    full_name   TEXT NOT NULL,
    bio         TEXT NOT NULL DEFAULT '',
    avatar      TEXT NOT NULL DEFAULT '',
    role        TEXT NOT NULL DEFAULT 'user',  -- 'user', 'admin'
    is_active   INTEGER NOT NULL DEFAULT 1,
    last_login  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: revoked bearer tokens
    r#"
CREATE TABLE revoked_tokens (
    token       TEXT PRIMARY KEY,
    expires_at  TEXT,                    -- NULL when the token could not be decoded
    revoked_at  TEXT NOT NULL
);

CREATE INDEX idx_revoked_tokens_expires_at ON revoked_tokens(expires_at);
"#,
    // v3: categories
    r#"
CREATE TABLE categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#,
    // v4: posts, tags and full-text index
    r#"
CREATE TABLE posts (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT NOT NULL,
    slug             TEXT NOT NULL UNIQUE,
    content          TEXT NOT NULL,
    excerpt          TEXT NOT NULL DEFAULT '',
    featured_image   TEXT NOT NULL DEFAULT '',
    author_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id      INTEGER NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
    status           TEXT NOT NULL DEFAULT 'draft',  -- 'draft', 'published', 'archived'
    is_featured      INTEGER NOT NULL DEFAULT 0,
    view_count       INTEGER NOT NULL DEFAULT 0,
    like_count       INTEGER NOT NULL DEFAULT 0,
    comment_count    INTEGER NOT NULL DEFAULT 0,
    published_at     TEXT,
    seo_title        TEXT NOT NULL DEFAULT '',
    seo_description  TEXT NOT NULL DEFAULT '',
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX idx_posts_author ON posts(author_id);
CREATE INDEX idx_posts_category ON posts(category_id);
CREATE INDEX idx_posts_status_published ON posts(status, published_at);

CREATE TABLE post_tags (
    post_id   INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    tag       TEXT NOT NULL,
    position  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (post_id, tag)
);

CREATE INDEX idx_post_tags_tag ON post_tags(tag);

CREATE VIRTUAL TABLE posts_fts USING fts5(
    title, content, excerpt,
    content='posts', content_rowid='id'
);

CREATE TRIGGER posts_fts_ai AFTER INSERT ON posts BEGIN
    INSERT INTO posts_fts(rowid, title, content, excerpt)
    VALUES (new.id, new.title, new.content, new.excerpt);
END;

CREATE TRIGGER posts_fts_ad AFTER DELETE ON posts BEGIN
    INSERT INTO posts_fts(posts_fts, rowid, title, content, excerpt)
    VALUES ('delete', old.id, old.title, old.content, old.excerpt);
END;

CREATE TRIGGER posts_fts_au AFTER UPDATE OF title, content, excerpt ON posts BEGIN
    INSERT INTO posts_fts(posts_fts, rowid, title, content, excerpt)
    VALUES ('delete', old.id, old.title, old.content, old.excerpt);
    INSERT INTO posts_fts(rowid, title, content, excerpt)
    VALUES (new.id, new.title, new.content, new.excerpt);
END;
"#,
    // v5: threaded comments and likes
    r#"
CREATE TABLE comments (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    content            TEXT NOT NULL,
    author_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    post_id            INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    parent_comment_id  INTEGER,          -- no FK: grand-replies keep a dangling parent
    like_count         INTEGER NOT NULL DEFAULT 0,
    is_approved        INTEGER NOT NULL DEFAULT 0,
    is_spam            INTEGER NOT NULL DEFAULT 0,
    ip_address         TEXT,
    user_agent         TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE INDEX idx_comments_post_parent ON comments(post_id, parent_comment_id);
CREATE INDEX idx_comments_parent ON comments(parent_comment_id);
CREATE INDEX idx_comments_author ON comments(author_id);
CREATE INDEX idx_comments_moderation ON comments(is_approved, is_spam);

CREATE TABLE comment_likes (
    comment_id  INTEGER NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (comment_id, user_id)
);
"#,
    // v6: contact messages
    r#"
CREATE TABLE contacts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    message     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX idx_contacts_created_at ON contacts(created_at);
"#,
];
