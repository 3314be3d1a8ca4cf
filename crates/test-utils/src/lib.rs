//! Folio test utilities.
//!
//! A PostgreSQL fixture for integration tests: every [`TestDb`] gets its own
//! schema holding the catalog tables and a small, fixed seed. Tests call
//! [`catalog_db`] and skip themselves when it returns `None`, which happens
//! whenever `DATABASE_URL` is not set.

use std::str::FromStr;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

/// Catalog tables.
pub const CATALOG_DDL: &str = r#"
CREATE TABLE language (
    id BIGINT PRIMARY KEY,
    lang TEXT NOT NULL UNIQUE
);

CREATE TABLE comic (
    id BIGINT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ
);

CREATE TABLE comic_title (
    id BIGINT PRIMARY KEY,
    comic_id BIGINT NOT NULL REFERENCES comic(id),
    language_id BIGINT REFERENCES language(id),
    content TEXT NOT NULL,
    is_main BOOLEAN NOT NULL DEFAULT false
);

CREATE TABLE tag_type (
    id BIGINT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

CREATE TABLE tag (
    id BIGINT PRIMARY KEY,
    tag_type_id BIGINT NOT NULL REFERENCES tag_type(id),
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    UNIQUE (tag_type_id, code)
);

CREATE TABLE comic_tag (
    id BIGINT PRIMARY KEY,
    comic_id BIGINT NOT NULL REFERENCES comic(id),
    tag_id BIGINT NOT NULL REFERENCES tag(id)
);

CREATE TABLE comic_volume (
    id BIGINT PRIMARY KEY,
    comic_id BIGINT NOT NULL REFERENCES comic(id),
    number INTEGER NOT NULL
);

CREATE TABLE comic_volume_title (
    id BIGINT PRIMARY KEY,
    volume_id BIGINT NOT NULL REFERENCES comic_volume(id),
    language_id BIGINT REFERENCES language(id),
    content TEXT NOT NULL
);

CREATE TABLE comic_chapter (
    id BIGINT PRIMARY KEY,
    comic_id BIGINT NOT NULL REFERENCES comic(id),
    volume_id BIGINT REFERENCES comic_volume(id),
    number INTEGER NOT NULL,
    released_at TIMESTAMPTZ
);

CREATE TABLE comic_chapter_title (
    id BIGINT PRIMARY KEY,
    chapter_id BIGINT NOT NULL REFERENCES comic_chapter(id),
    language_id BIGINT REFERENCES language(id),
    content TEXT NOT NULL
);

CREATE TABLE person (
    id BIGINT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE comic_author (
    id BIGINT PRIMARY KEY,
    comic_id BIGINT NOT NULL REFERENCES comic(id),
    person_id BIGINT NOT NULL REFERENCES person(id),
    role TEXT NOT NULL
);

CREATE TABLE website (
    id BIGINT PRIMARY KEY,
    host TEXT NOT NULL UNIQUE
);

CREATE TABLE link (
    id BIGINT PRIMARY KEY,
    website_id BIGINT NOT NULL REFERENCES website(id),
    relative_reference TEXT NOT NULL DEFAULT '',
    UNIQUE (website_id, relative_reference)
);

CREATE TABLE comic_external (
    id BIGINT PRIMARY KEY,
    comic_id BIGINT NOT NULL REFERENCES comic(id),
    link_id BIGINT NOT NULL REFERENCES link(id),
    is_official BOOLEAN NOT NULL DEFAULT false
);
"#;

/// Seed rows. Ids are fixed so tests can assert on them.
///
/// - comics `abc123` (1), `def456` (2), `ghi789` (3)
/// - `abc123` titles in fr (1), en (2), de (3)
/// - `abc123` chapters 1, 2 (unreleased), 3; `def456` chapter 1; none for `ghi789`
/// - tags action/drama (genre), school/space (theme); `space` is unused
/// - links: mangadex.org/title/abc (1), example.com (2), example.com/comics/def (3)
pub const CATALOG_SEED: &str = r#"
INSERT INTO language (id, lang) VALUES
    (1, 'en'), (2, 'en-US'), (3, 'fr'), (4, 'de'), (5, 'ja');

INSERT INTO comic (id, code, created_at) VALUES
    (1, 'abc123', '2024-01-01T00:00:00Z'),
    (2, 'def456', '2024-02-01T00:00:00Z'),
    (3, 'ghi789', '2024-03-01T00:00:00Z');

INSERT INTO comic_title (id, comic_id, language_id, content, is_main) VALUES
    (1, 1, 3, 'Le Titre', false),
    (2, 1, 1, 'The Title', true),
    (3, 1, 4, 'Der Titel', false),
    (4, 2, 5, 'Taitoru', true),
    (5, 2, 2, 'Another Title', false),
    (6, 3, 1, 'Third', true);

INSERT INTO tag_type (id, code, name) VALUES
    (1, 'genre', 'Genre'),
    (2, 'theme', 'Theme');

INSERT INTO tag (id, tag_type_id, code, name) VALUES
    (1, 1, 'action', 'Action'),
    (2, 1, 'drama', 'Drama'),
    (3, 2, 'school', 'School'),
    (4, 2, 'space', 'Space');

INSERT INTO comic_tag (id, comic_id, tag_id) VALUES
    (1, 1, 1), (2, 1, 3),
    (3, 2, 1), (4, 2, 2),
    (5, 3, 2);

INSERT INTO comic_volume (id, comic_id, number) VALUES
    (1, 1, 1), (2, 1, 2);

INSERT INTO comic_volume_title (id, volume_id, language_id, content) VALUES
    (1, 1, 1, 'Beginnings'),
    (2, 1, 3, 'Commencements'),
    (3, 2, 1, 'Endings');

INSERT INTO comic_chapter (id, comic_id, volume_id, number, released_at) VALUES
    (1, 1, 1, 1, '2024-01-10T00:00:00Z'),
    (2, 1, 1, 2, NULL),
    (3, 1, 2, 3, '2024-03-10T00:00:00Z'),
    (4, 2, NULL, 1, '2024-02-15T00:00:00Z');

INSERT INTO comic_chapter_title (id, chapter_id, language_id, content) VALUES
    (1, 1, 1, 'Arrival'),
    (2, 1, 3, 'Arrivee'),
    (3, 3, 1, 'Departure');

INSERT INTO person (id, name) VALUES
    (1, 'Alice Author'),
    (2, 'Bob Artist');

INSERT INTO comic_author (id, comic_id, person_id, role) VALUES
    (1, 1, 1, 'writer'),
    (2, 1, 2, 'artist'),
    (3, 2, 1, 'writer');

INSERT INTO website (id, host) VALUES
    (1, 'mangadex.org'),
    (2, 'example.com');

INSERT INTO link (id, website_id, relative_reference) VALUES
    (1, 1, '/title/abc'),
    (2, 2, ''),
    (3, 2, '/comics/def');

INSERT INTO comic_external (id, comic_id, link_id, is_official) VALUES
    (1, 1, 1, true),
    (2, 1, 2, false),
    (3, 2, 3, true);
"#;

/// An isolated, seeded catalog schema.
pub struct TestDb {
    /// Pool whose connections resolve tables in the test schema.
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    /// Drop the test schema and close both pools.
    pub async fn teardown(self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        sqlx::raw_sql(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", self.schema))
            .execute(&self.admin)
            .await?;
        self.admin.close().await;
        Ok(())
    }
}

/// Create a seeded catalog schema, or `None` when `DATABASE_URL` is unset.
pub async fn catalog_db() -> Result<Option<TestDb>, sqlx::Error> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        return Ok(None);
    };

    let schema = format!("folio_test_{}", Uuid::now_v7().simple());
    let options = PgConnectOptions::from_str(&url)?;

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await?;
    sqlx::raw_sql(&format!("CREATE SCHEMA \"{schema}\""))
        .execute(&admin)
        .await?;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options.options([("search_path", schema.as_str())]))
        .await?;
    sqlx::raw_sql(CATALOG_DDL).execute(&pool).await?;
    sqlx::raw_sql(CATALOG_SEED).execute(&pool).await?;

    Ok(Some(TestDb {
        pool,
        admin,
        schema,
    }))
}
