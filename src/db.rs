//! SQLite database with Diesel ORM
//!
//! Stores ingested draft events together with their players and picks.
//! Tables are created idempotently on open; legacy table families are
//! copied over by [`Database::migrate_legacy`](crate::migrate).

use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage format for `draft_events.date_time`
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Walk up directory tree to find .draftdex folder (like git finds .git)
/// Can be overridden with DRAFTDEX_DB_PATH env var
fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("DRAFTDEX_DB_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let draftdex_dir = dir.join(".draftdex");
            if draftdex_dir.is_dir() {
                return draftdex_dir.join("draftdex.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    PathBuf::from(".draftdex/draftdex.db")
}

/// Current schema version for draftdex
pub const CURRENT_SCHEMA: DraftSchema = DraftSchema {
    major: 2,
    minor: 0,
    patch: 0,
    name: "draft-events",
    features: &[
        "draft_events",
        "draft_event_players",
        "draft_event_picks",
        "legacy_backfill",
    ],
};

/// Describes the version and capabilities of the schema
#[derive(Debug, Clone)]
pub struct DraftSchema {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub features: &'static [&'static str],
}

impl DraftSchema {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(&feature)
    }
}

impl std::fmt::Display for DraftSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version_string(), self.name)
    }
}

/// Export layout a draft was read from.
///
/// `Legacy` exports have no `Draft ID:`/`Patch:` lines and no `Order` column.
/// `Flat` exports are a single headed pick table dated by their file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    Legacy,
    V2,
    Flat,
}

impl FormatVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatVersion::Legacy => "legacy",
            FormatVersion::V2 => "v2",
            FormatVersion::Flat => "flat",
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable schema version
#[derive(Insertable)]
#[diesel(table_name = schema_versions)]
pub struct NewSchemaVersion<'a> {
    pub version: &'a str,
    pub name: &'a str,
    pub features: &'a str,
    pub introduced_at: &'a str,
}

/// Queryable schema version
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = schema_versions)]
pub struct StoredSchema {
    pub id: i32,
    pub version: String,
    pub name: String,
    pub features: String,
    pub introduced_at: String,
}

/// Insertable draft event
#[derive(Insertable)]
#[diesel(table_name = draft_events)]
pub struct NewDraftEvent<'a> {
    pub external_draft_id: Option<&'a str>,
    pub patch: Option<&'a str>,
    pub date_time: &'a str,
    pub total_pokemon_sold: i32,
    pub format_version: &'a str,
    pub source_file: Option<&'a str>,
    pub ingested_at: &'a str,
    pub legacy_source: Option<&'a str>,
    pub legacy_id: Option<i32>,
}

/// Queryable draft event
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = draft_events)]
pub struct DraftEvent {
    pub id: i32,
    pub external_draft_id: Option<String>,
    pub patch: Option<String>,
    pub date_time: String,
    pub total_pokemon_sold: i32,
    pub format_version: String,
    pub source_file: Option<String>,
    pub ingested_at: String,
    pub legacy_source: Option<String>,
    pub legacy_id: Option<i32>,
}

/// Insertable player row
#[derive(Insertable)]
#[diesel(table_name = draft_event_players)]
pub struct NewDraftPlayer<'a> {
    pub draft_id: i32,
    pub player_name: &'a str,
    pub starting_money: i32,
    pub remaining_money: i32,
}

/// Queryable player row
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = draft_event_players)]
pub struct DraftPlayer {
    pub id: i32,
    pub draft_id: i32,
    pub player_name: String,
    pub starting_money: i32,
    pub remaining_money: i32,
}

/// Insertable pick row
#[derive(Insertable)]
#[diesel(table_name = draft_event_picks)]
pub struct NewDraftPick<'a> {
    pub draft_id: i32,
    pub draft_order: Option<i32>,
    pub pokemon: &'a str,
    pub drafted_by: &'a str,
    pub cost: i32,
}

/// Queryable pick row
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = draft_event_picks)]
pub struct DraftPick {
    pub id: i32,
    pub draft_id: i32,
    pub draft_order: Option<i32>,
    pub pokemon: String,
    pub drafted_by: String,
    pub cost: i32,
}

// ============================================================================
// Write-side records
// ============================================================================

/// One player line, already coerced to integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub player_name: String,
    pub starting_money: i32,
    pub remaining_money: i32,
}

/// One pick line, already coerced to integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRow {
    pub draft_order: Option<i32>,
    pub pokemon: String,
    pub drafted_by: String,
    pub cost: i32,
}

/// A complete draft ready to be written by [`Database::insert_draft`]
#[derive(Debug, Clone)]
pub struct DraftRecord {
    pub external_draft_id: Option<String>,
    pub patch: Option<String>,
    pub date_time: NaiveDateTime,
    pub total_pokemon_sold: i32,
    pub format_version: FormatVersion,
    pub source_file: Option<String>,
    pub players: Vec<PlayerRow>,
    pub picks: Vec<PickRow>,
}

/// Where a migrated record came from
#[derive(Debug, Clone, Copy)]
pub(crate) struct LegacyOrigin<'a> {
    pub source: &'a str,
    pub id: i32,
}

// ============================================================================
// Helper structs for raw SQL queries
// ============================================================================

/// Helper for PRAGMA table_info queries
#[derive(QueryableByName, Debug)]
pub(crate) struct PragmaTableInfo {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub name: String,
}

/// Helper for sqlite_master table queries
#[derive(QueryableByName, Debug)]
pub(crate) struct TableInfo {
    #[diesel(sql_type = diesel::sql_types::Text)]
    #[allow(dead_code)]
    pub name: String,
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub(crate) type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas; foreign keys are off by default in SQLite
#[derive(Debug)]
struct ConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Pool error: {0}")]
    Pool(#[from] diesel::r2d2::Error),
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl Database {
    /// Get the database path that will be used
    pub fn db_path() -> PathBuf {
        get_db_path()
    }

    /// Open database at default path (respects DRAFTDEX_DB_PATH env var)
    pub fn open() -> Result<Self> {
        let path = get_db_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::Connection(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        Self::open_at(&path)
    }

    /// Open database at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        debug!("Opening database at {}", path_str);
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(4)
            .connection_customizer(Box::new(ConnectionCustomizer))
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    pub(crate) fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| DbError::Connection(e.to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                features TEXT NOT NULL,
                introduced_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        // external_draft_id is not UNIQUE; legacy rows carry NULL and the
        // ingest guard handles duplicates
        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS draft_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                external_draft_id TEXT,
                patch TEXT,
                date_time TEXT NOT NULL,
                total_pokemon_sold INTEGER NOT NULL,
                format_version TEXT NOT NULL,
                source_file TEXT,
                ingested_at TEXT NOT NULL,
                legacy_source TEXT,
                legacy_id INTEGER
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS draft_event_players (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                draft_id INTEGER NOT NULL,
                player_name TEXT NOT NULL,
                starting_money INTEGER NOT NULL,
                remaining_money INTEGER NOT NULL,
                FOREIGN KEY (draft_id) REFERENCES draft_events(id)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS draft_event_picks (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                draft_id INTEGER NOT NULL,
                draft_order INTEGER,
                pokemon TEXT NOT NULL,
                drafted_by TEXT NOT NULL,
                cost INTEGER NOT NULL,
                FOREIGN KEY (draft_id) REFERENCES draft_events(id)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_events_external_id ON draft_events(external_draft_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE UNIQUE INDEX IF NOT EXISTS idx_events_legacy ON draft_events(legacy_source, legacy_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_events_patch ON draft_events(patch)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_players_draft ON draft_event_players(draft_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_picks_draft ON draft_event_picks(draft_id, draft_order)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_picks_pokemon ON draft_event_picks(pokemon)").execute(&mut conn)?;

        self.register_schema(&mut conn, &CURRENT_SCHEMA)?;
        Ok(())
    }

    fn register_schema(&self, conn: &mut SqliteConnection, schema: &DraftSchema) -> Result<()> {
        let now = chrono::Local::now().to_rfc3339();
        let features = schema.features.join(",");

        let new_schema = NewSchemaVersion {
            version: &schema.version_string(),
            name: schema.name,
            features: &features,
            introduced_at: &now,
        };

        diesel::insert_or_ignore_into(schema_versions::table)
            .values(&new_schema)
            .execute(conn)?;

        Ok(())
    }

    /// Schema versions this database has been opened with, oldest first
    pub fn schema_history(&self) -> Result<Vec<StoredSchema>> {
        let mut conn = self.get_conn()?;
        let rows = schema_versions::table
            .order(schema_versions::id.asc())
            .load::<StoredSchema>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Whether a draft with this external id has already been ingested
    pub fn draft_exists(&self, external_draft_id: &str) -> Result<bool> {
        let mut conn = self.get_conn()?;
        let found = diesel::select(diesel::dsl::exists(
            draft_events::table.filter(draft_events::external_draft_id.eq(external_draft_id)),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    /// Whether an event of `format` was already read from a file of this name
    pub fn source_file_exists(&self, source_file: &str, format: FormatVersion) -> Result<bool> {
        let mut conn = self.get_conn()?;
        let found = diesel::select(diesel::dsl::exists(
            draft_events::table
                .filter(draft_events::source_file.eq(source_file))
                .filter(draft_events::format_version.eq(format.as_str())),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    /// Write one draft event with all of its players and picks.
    ///
    /// Runs in a single transaction: either every row lands or none do.
    /// Returns the new event id.
    pub fn insert_draft(&self, record: &DraftRecord) -> Result<i32> {
        let mut conn = self.get_conn()?;
        conn.transaction::<_, DbError, _>(|conn| insert_draft_rows(conn, record, None))
    }

    /// Fetch one event by id
    pub fn get_event(&self, event_id: i32) -> Result<Option<DraftEvent>> {
        let mut conn = self.get_conn()?;
        let event = draft_events::table
            .filter(draft_events::id.eq(event_id))
            .first::<DraftEvent>(&mut conn)
            .optional()?;
        Ok(event)
    }

    /// Fetch one event by its external draft id
    pub fn find_event_by_external_id(&self, external_draft_id: &str) -> Result<Option<DraftEvent>> {
        let mut conn = self.get_conn()?;
        let event = draft_events::table
            .filter(draft_events::external_draft_id.eq(external_draft_id))
            .order(draft_events::id.asc())
            .first::<DraftEvent>(&mut conn)
            .optional()?;
        Ok(event)
    }

    /// Get all events in chronological order
    pub fn get_all_events(&self) -> Result<Vec<DraftEvent>> {
        let mut conn = self.get_conn()?;
        let events = draft_events::table
            .order((draft_events::date_time.asc(), draft_events::id.asc()))
            .load::<DraftEvent>(&mut conn)?;
        Ok(events)
    }

    /// Players of one event, in file order
    pub fn get_players(&self, event_id: i32) -> Result<Vec<DraftPlayer>> {
        let mut conn = self.get_conn()?;
        let players = draft_event_players::table
            .filter(draft_event_players::draft_id.eq(event_id))
            .order(draft_event_players::id.asc())
            .load::<DraftPlayer>(&mut conn)?;
        Ok(players)
    }

    /// Picks of one event, in file order
    pub fn get_picks(&self, event_id: i32) -> Result<Vec<DraftPick>> {
        let mut conn = self.get_conn()?;
        let picks = draft_event_picks::table
            .filter(draft_event_picks::draft_id.eq(event_id))
            .order(draft_event_picks::id.asc())
            .load::<DraftPick>(&mut conn)?;
        Ok(picks)
    }

    // ========================================================================
    // Corrections
    // ========================================================================

    /// Count picks whose species matches `name`, ignoring case.
    ///
    /// Both sides fold through SQLite's `lower()`, which only folds ASCII.
    pub fn count_species(&self, name: &str) -> Result<i64> {
        let mut conn = self.get_conn()?;
        let count = draft_event_picks::table
            .filter(lower(draft_event_picks::pokemon).eq(lower(name.trim())))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count)
    }

    /// Rename a species across every pick, matching the old name
    /// case-insensitively. Returns the number of rows changed.
    pub fn rename_species(&self, from: &str, to: &str) -> Result<usize> {
        let to = to.trim();
        if to.is_empty() {
            return Err(DbError::Validation("New species name must not be empty".to_string()));
        }
        let mut conn = self.get_conn()?;
        let changed = diesel::update(
            draft_event_picks::table.filter(lower(draft_event_picks::pokemon).eq(lower(from.trim()))),
        )
        .set(draft_event_picks::pokemon.eq(to))
        .execute(&mut conn)?;
        Ok(changed)
    }
}

diesel::define_sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// Insert an event and its rows on an open connection.
///
/// Callers own the transaction.
pub(crate) fn insert_draft_rows(
    conn: &mut SqliteConnection,
    record: &DraftRecord,
    origin: Option<LegacyOrigin<'_>>,
) -> Result<i32> {
    let now = chrono::Local::now().to_rfc3339();
    let date_time = record.date_time.format(DATE_TIME_FORMAT).to_string();

    let new_event = NewDraftEvent {
        external_draft_id: record.external_draft_id.as_deref(),
        patch: record.patch.as_deref(),
        date_time: &date_time,
        total_pokemon_sold: record.total_pokemon_sold,
        format_version: record.format_version.as_str(),
        source_file: record.source_file.as_deref(),
        ingested_at: &now,
        legacy_source: origin.map(|o| o.source),
        legacy_id: origin.map(|o| o.id),
    };

    diesel::insert_into(draft_events::table)
        .values(&new_event)
        .execute(conn)?;

    let event_id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("last_insert_rowid()"))
        .first(conn)?;

    for player in &record.players {
        diesel::insert_into(draft_event_players::table)
            .values(&NewDraftPlayer {
                draft_id: event_id,
                player_name: &player.player_name,
                starting_money: player.starting_money,
                remaining_money: player.remaining_money,
            })
            .execute(conn)?;
    }

    for pick in &record.picks {
        diesel::insert_into(draft_event_picks::table)
            .values(&NewDraftPick {
                draft_id: event_id,
                draft_order: pick.draft_order,
                pokemon: &pick.pokemon,
                drafted_by: &pick.drafted_by,
                cost: pick.cost,
            })
            .execute(conn)?;
    }

    debug!(
        "Wrote draft event {} ({} players, {} picks)",
        event_id,
        record.players.len(),
        record.picks.len()
    );
    Ok(event_id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    pub(crate) fn temp_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::open_at(dir.path().join("test.db")).expect("open db");
        (dir, db)
    }

    pub(crate) fn sample_record(external_id: Option<&str>) -> DraftRecord {
        DraftRecord {
            external_draft_id: external_id.map(str::to_string),
            patch: Some("1.4".to_string()),
            date_time: NaiveDate::from_ymd_opt(2025, 12, 31)
                .unwrap()
                .and_hms_opt(18, 2, 28)
                .unwrap(),
            total_pokemon_sold: 3,
            format_version: FormatVersion::V2,
            source_file: Some("draft.csv".to_string()),
            players: vec![
                PlayerRow { player_name: "Ash".to_string(), starting_money: 1000, remaining_money: 150 },
                PlayerRow { player_name: "Misty".to_string(), starting_money: 1000, remaining_money: 420 },
            ],
            picks: vec![
                PickRow { draft_order: Some(1), pokemon: "Garchomp".to_string(), drafted_by: "Ash".to_string(), cost: 500 },
                PickRow { draft_order: Some(2), pokemon: "Falinks".to_string(), drafted_by: "misty".to_string(), cost: 80 },
                PickRow { draft_order: Some(3), pokemon: "Pikachu".to_string(), drafted_by: "Ash".to_string(), cost: 350 },
            ],
        }
    }

    #[test]
    fn test_schema_version_string() {
        assert_eq!(CURRENT_SCHEMA.version_string(), "2.0.0");
        assert!(CURRENT_SCHEMA.has_feature("draft_event_picks"));
        assert_eq!(CURRENT_SCHEMA.to_string(), "v2.0.0 (draft-events)");
    }

    #[test]
    fn test_open_registers_schema_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("twice.db");
        Database::open_at(&path).unwrap();
        let db = Database::open_at(&path).unwrap();
        let history = db.schema_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].version, "2.0.0");
    }

    #[test]
    fn test_insert_draft_writes_all_rows() {
        let (_dir, db) = temp_db();
        let id = db.insert_draft(&sample_record(Some("123456789012"))).unwrap();

        let event = db.get_event(id).unwrap().expect("event");
        assert_eq!(event.external_draft_id.as_deref(), Some("123456789012"));
        assert_eq!(event.date_time, "2025-12-31 18:02:28");
        assert_eq!(event.format_version, "v2");

        let players = db.get_players(id).unwrap();
        assert_eq!(players.len(), 2);
        assert!(players.iter().all(|p| p.draft_id == id));

        let picks = db.get_picks(id).unwrap();
        let orders: Vec<_> = picks.iter().map(|p| p.draft_order).collect();
        assert_eq!(orders, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_draft_exists() {
        let (_dir, db) = temp_db();
        assert!(!db.draft_exists("123456789012").unwrap());
        db.insert_draft(&sample_record(Some("123456789012"))).unwrap();
        assert!(db.draft_exists("123456789012").unwrap());
        assert!(!db.draft_exists("999").unwrap());
    }

    #[test]
    fn test_source_file_exists_per_format() {
        let (_dir, db) = temp_db();
        db.insert_draft(&sample_record(Some("1"))).unwrap();
        assert!(db.source_file_exists("draft.csv", FormatVersion::V2).unwrap());
        assert!(!db.source_file_exists("draft.csv", FormatVersion::Flat).unwrap());
        assert!(!db.source_file_exists("other.csv", FormatVersion::V2).unwrap());
    }

    #[test]
    fn test_rename_species_ignores_case() {
        let (_dir, db) = temp_db();
        let mut record = sample_record(Some("1"));
        record.picks[1].pokemon = "mega falinks".to_string();
        record.picks.push(PickRow {
            draft_order: Some(4),
            pokemon: "Mega Falinks".to_string(),
            drafted_by: "Ash".to_string(),
            cost: 10,
        });
        let id = db.insert_draft(&record).unwrap();

        assert_eq!(db.count_species("MEGA FALINKS").unwrap(), 2);
        assert_eq!(db.rename_species("Mega Falinks", "Falinks").unwrap(), 2);
        assert_eq!(db.count_species("mega falinks").unwrap(), 0);

        let names: Vec<_> = db.get_picks(id).unwrap().into_iter().map(|p| p.pokemon).collect();
        assert_eq!(names, vec!["Garchomp", "Falinks", "Pikachu", "Falinks"]);
    }

    #[test]
    fn test_rename_species_with_accented_name() {
        let (_dir, db) = temp_db();
        let mut record = sample_record(Some("1"));
        record.picks[1].pokemon = "FLABÉBÉ".to_string();
        let id = db.insert_draft(&record).unwrap();

        assert_eq!(db.count_species("FLABÉBÉ").unwrap(), 1);
        assert_eq!(db.count_species("flabÉbÉ").unwrap(), 1);
        assert_eq!(db.rename_species("Flabébé", "Floette").unwrap(), 0);
        assert_eq!(db.rename_species("flabÉbÉ", "Flabébé").unwrap(), 1);

        let names: Vec<_> = db.get_picks(id).unwrap().into_iter().map(|p| p.pokemon).collect();
        assert_eq!(names, vec!["Garchomp", "Flabébé", "Pikachu"]);
    }

    #[test]
    fn test_rename_species_rejects_empty_target() {
        let (_dir, db) = temp_db();
        assert!(matches!(db.rename_species("Pikachu", "  "), Err(DbError::Validation(_))));
    }
}
