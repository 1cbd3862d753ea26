//! Backfill of the pre-unification table families.
//!
//! Older databases hold drafts in `draft_event`/`draft_players`/`draft_pokemon`
//! (legacy exports) or `draft_event_v2`/`draft_players_v2`/`draft_pokemon_v2`.
//! Each old event is copied once into the unified tables; the copy records
//! its origin in `legacy_source`/`legacy_id`, which makes re-runs a no-op.

use crate::db::{
    insert_draft_rows, Database, DbConn, DbError, DraftRecord, FormatVersion, LegacyOrigin, PickRow,
    PlayerRow, PragmaTableInfo, Result, TableInfo,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Nullable, Text};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One old table family
#[derive(Debug, Clone, Copy)]
struct LegacyFamily {
    events: &'static str,
    players: &'static str,
    picks: &'static str,
    format: FormatVersion,
}

const LEGACY_FAMILIES: [LegacyFamily; 2] = [
    LegacyFamily {
        events: "draft_event",
        players: "draft_players",
        picks: "draft_pokemon",
        format: FormatVersion::Legacy,
    },
    LegacyFamily {
        events: "draft_event_v2",
        players: "draft_players_v2",
        picks: "draft_pokemon_v2",
        format: FormatVersion::V2,
    },
];

/// Timestamps as older writers stored them
const STORED_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// What a backfill run did, per source family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub families: Vec<FamilyReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FamilyReport {
    /// Name of the old events table
    pub source: String,
    pub copied: usize,
    /// Old v2 events whose external id is already in the unified tables
    pub duplicates: usize,
    /// Old events with an unreadable date, total, money, cost or name
    pub invalid: usize,
}

impl MigrationReport {
    pub fn copied(&self) -> usize {
        self.families.iter().map(|f| f.copied).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[derive(QueryableByName, Debug)]
struct LegacyEventRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Nullable<Text>)]
    external_draft_id: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    patch: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    date_time: Option<String>,
    #[diesel(sql_type = Nullable<Integer>)]
    total_pokemon_sold: Option<i32>,
}

/// Old player and pick columns are read as text and checked in Rust, so a
/// NULL or non-numeric cell marks the event invalid instead of becoming 0.
#[derive(QueryableByName, Debug)]
struct LegacyPlayerRow {
    #[diesel(sql_type = Nullable<Text>)]
    player_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    starting_money: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    remaining_money: Option<String>,
}

#[derive(QueryableByName, Debug)]
struct LegacyPickRow {
    #[diesel(sql_type = Nullable<Text>)]
    draft_order: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pokemon: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    drafted_by: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    cost: Option<String>,
}

fn stored_int(raw: Option<&str>) -> Option<i32> {
    raw?.trim().parse().ok()
}

fn stored_name(raw: Option<String>) -> Option<String> {
    raw.map(|name| name.trim().to_string()).filter(|name| !name.is_empty())
}

impl LegacyPlayerRow {
    fn into_player(self) -> Option<PlayerRow> {
        Some(PlayerRow {
            starting_money: stored_int(self.starting_money.as_deref())?,
            remaining_money: stored_int(self.remaining_money.as_deref())?,
            player_name: stored_name(self.player_name)?,
        })
    }
}

impl LegacyPickRow {
    /// A missing order is fine; an order that is present must be an integer
    fn into_pick(self) -> Option<PickRow> {
        let draft_order = match self.draft_order.as_deref() {
            None => None,
            raw => Some(stored_int(raw)?),
        };
        Some(PickRow {
            draft_order,
            cost: stored_int(self.cost.as_deref())?,
            pokemon: stored_name(self.pokemon)?,
            drafted_by: stored_name(self.drafted_by)?,
        })
    }
}

fn table_exists(conn: &mut DbConn, name: &str) -> Result<bool> {
    let tables: Vec<TableInfo> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
        .bind::<Text, _>(name)
        .load(conn)?;
    Ok(!tables.is_empty())
}

fn column_names(conn: &mut DbConn, table: &str) -> Result<Vec<String>> {
    let columns: Vec<PragmaTableInfo> = diesel::sql_query(format!("PRAGMA table_info({})", table)).load(conn)?;
    Ok(columns.into_iter().map(|c| c.name).collect())
}

/// Select `column` cast to `sql_type`, or NULL when the old table lacks it
fn optional_column(columns: &[String], column: &str, sql_type: &str) -> String {
    if columns.iter().any(|c| c == column) {
        format!("CAST({} AS {})", column, sql_type)
    } else {
        "NULL".to_string()
    }
}

fn parse_stored_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    STORED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn external_id_taken(conn: &mut DbConn, external_id: &str) -> Result<bool> {
    use crate::schema::draft_events;
    let taken = diesel::select(diesel::dsl::exists(
        draft_events::table.filter(draft_events::external_draft_id.eq(external_id)),
    ))
    .get_result::<bool>(conn)?;
    Ok(taken)
}

impl Database {
    /// Copy drafts from the old table families into the unified tables.
    ///
    /// Families whose events table is absent are ignored. Each old event is
    /// written in its own transaction.
    pub fn migrate_legacy(&self) -> Result<MigrationReport> {
        let mut conn = self.get_conn()?;
        let mut report = MigrationReport::default();

        for family in &LEGACY_FAMILIES {
            if !table_exists(&mut conn, family.events)? {
                debug!("No {} table, nothing to backfill", family.events);
                continue;
            }
            let family_report = migrate_family(&mut conn, family)?;
            info!(
                "Backfilled {} event(s) from {} ({} duplicate, {} invalid)",
                family_report.copied, family.events, family_report.duplicates, family_report.invalid
            );
            report.families.push(family_report);
        }
        Ok(report)
    }
}

fn migrate_family(conn: &mut DbConn, family: &LegacyFamily) -> Result<FamilyReport> {
    let mut report = FamilyReport {
        source: family.events.to_string(),
        ..FamilyReport::default()
    };

    let event_columns = column_names(conn, family.events)?;
    let events: Vec<LegacyEventRow> = diesel::sql_query(format!(
        "SELECT id,
                {} AS external_draft_id,
                {} AS patch,
                CAST(date_time AS TEXT) AS date_time,
                CAST(total_pokemon_sold AS INTEGER) AS total_pokemon_sold
         FROM {}
         WHERE id NOT IN (SELECT legacy_id FROM draft_events WHERE legacy_source = ? AND legacy_id IS NOT NULL)
         ORDER BY id",
        optional_column(&event_columns, "external_draft_id", "TEXT"),
        optional_column(&event_columns, "patch", "TEXT"),
        family.events,
    ))
    .bind::<Text, _>(family.events)
    .load(conn)?;

    let has_players = table_exists(conn, family.players)?;
    let has_picks = table_exists(conn, family.picks)?;
    let order_column = if has_picks {
        optional_column(&column_names(conn, family.picks)?, "draft_order", "TEXT")
    } else {
        "NULL".to_string()
    };

    for event in events {
        let external_id = event
            .external_draft_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        if let Some(id) = external_id.as_deref() {
            if external_id_taken(conn, id)? {
                debug!("{} #{}: draft {} already present", family.events, event.id, id);
                report.duplicates += 1;
                continue;
            }
        }

        let date_time = event.date_time.as_deref().and_then(parse_stored_date);
        let (Some(date_time), Some(total)) = (date_time, event.total_pokemon_sold) else {
            warn!("{} #{}: unreadable date or total, not copied", family.events, event.id);
            report.invalid += 1;
            continue;
        };

        let players = if has_players {
            load_players(conn, family, event.id)?
        } else {
            Some(Vec::new())
        };
        let picks = if has_picks {
            load_picks(conn, family, &order_column, event.id)?
        } else {
            Some(Vec::new())
        };
        let (Some(players), Some(picks)) = (players, picks) else {
            warn!(
                "{} #{}: player or pick row with a missing or non-numeric value, not copied",
                family.events, event.id
            );
            report.invalid += 1;
            continue;
        };

        let record = DraftRecord {
            external_draft_id: external_id,
            patch: event.patch.filter(|p| !p.trim().is_empty()),
            date_time,
            total_pokemon_sold: total,
            format_version: family.format,
            source_file: None,
            players,
            picks,
        };
        let origin = LegacyOrigin {
            source: family.events,
            id: event.id,
        };
        conn.transaction::<_, DbError, _>(|conn| insert_draft_rows(conn, &record, Some(origin)))?;
        report.copied += 1;
    }
    Ok(report)
}

/// Players of one old event; `None` when any row is unreadable
fn load_players(conn: &mut DbConn, family: &LegacyFamily, draft_id: i32) -> Result<Option<Vec<PlayerRow>>> {
    let rows: Vec<LegacyPlayerRow> = diesel::sql_query(format!(
        "SELECT CAST(player_name AS TEXT) AS player_name,
                CAST(starting_money AS TEXT) AS starting_money,
                CAST(remaining_money AS TEXT) AS remaining_money
         FROM {}
         WHERE draft_id = ?
         ORDER BY id",
        family.players
    ))
    .bind::<Integer, _>(draft_id)
    .load(conn)?;

    Ok(rows.into_iter().map(LegacyPlayerRow::into_player).collect())
}

/// Picks of one old event; `None` when any row is unreadable
fn load_picks(
    conn: &mut DbConn,
    family: &LegacyFamily,
    order_column: &str,
    draft_id: i32,
) -> Result<Option<Vec<PickRow>>> {
    let rows: Vec<LegacyPickRow> = diesel::sql_query(format!(
        "SELECT {} AS draft_order,
                CAST(pokemon AS TEXT) AS pokemon,
                CAST(drafted_by AS TEXT) AS drafted_by,
                CAST(cost AS TEXT) AS cost
         FROM {}
         WHERE draft_id = ?
         ORDER BY id",
        order_column, family.picks
    ))
    .bind::<Integer, _>(draft_id)
    .load(conn)?;

    Ok(rows.into_iter().map(LegacyPickRow::into_pick).collect())
}
