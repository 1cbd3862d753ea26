//! Read-only statistics over ingested drafts.
//!
//! Aggregates are computed in SQLite with raw SQL and loaded into
//! `QueryableByName` rows; nothing here writes to the store.

use crate::db::{Database, Result};
use crate::schema::*;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use serde::Serialize;

/// Average price and popularity of one species
#[derive(QueryableByName, Debug, Clone, PartialEq, Serialize)]
pub struct PokemonCost {
    #[diesel(sql_type = Text)]
    pub pokemon: String,
    /// Rounded to two decimal places
    #[diesel(sql_type = Double)]
    pub avg_cost: f64,
    #[diesel(sql_type = BigInt)]
    pub times_drafted: i64,
}

/// One of the most expensive picks of a draft
#[derive(QueryableByName, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPick {
    #[diesel(sql_type = Integer)]
    pub draft_id: i32,
    #[diesel(sql_type = Nullable<Text>)]
    pub external_draft_id: Option<String>,
    #[diesel(sql_type = Text)]
    pub date_time: String,
    /// 1 is the most expensive pick of the draft
    #[diesel(sql_type = BigInt)]
    pub rank: i64,
    #[diesel(sql_type = Text)]
    pub pokemon: String,
    #[diesel(sql_type = Text)]
    pub drafted_by: String,
    #[diesel(sql_type = Integer)]
    pub cost: i32,
    /// Position in the draft; `None` for legacy drafts
    #[diesel(sql_type = Nullable<Integer>)]
    pub draft_order: Option<i32>,
}

/// Draft volume and prices for one patch; `patch` is `None` for legacy drafts
#[derive(QueryableByName, Debug, Clone, PartialEq, Serialize)]
pub struct PatchTrend {
    #[diesel(sql_type = Nullable<Text>)]
    pub patch: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub drafts: i64,
    #[diesel(sql_type = BigInt)]
    pub picks: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_cost: Option<f64>,
}

/// Totals for one player across all drafts, names compared case-insensitively
#[derive(QueryableByName, Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    #[diesel(sql_type = Text)]
    pub player: String,
    #[diesel(sql_type = BigInt)]
    pub drafts: i64,
    #[diesel(sql_type = BigInt)]
    pub picks: i64,
    #[diesel(sql_type = BigInt)]
    pub total_spent: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_cost: Option<f64>,
}

/// Row counts of the unified tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub events: i64,
    pub players: i64,
    pub picks: i64,
}

impl Database {
    /// Average cost per species, most expensive first
    pub fn pokemon_costs(&self) -> Result<Vec<PokemonCost>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT pokemon,
                    ROUND(AVG(cost), 2) AS avg_cost,
                    COUNT(*) AS times_drafted
             FROM draft_event_picks
             GROUP BY pokemon
             ORDER BY avg_cost DESC, pokemon ASC",
        )
        .load::<PokemonCost>(&mut conn)?;
        Ok(rows)
    }

    /// The `n` most expensive picks of every draft, drafts in chronological
    /// order. Ties keep file order.
    pub fn top_picks_per_draft(&self, n: i64) -> Result<Vec<TopPick>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT draft_id, external_draft_id, date_time, rank, pokemon, drafted_by, cost, draft_order
             FROM (
                 SELECT k.draft_id, e.external_draft_id, e.date_time, k.pokemon, k.drafted_by, k.cost,
                        k.draft_order,
                        ROW_NUMBER() OVER (PARTITION BY k.draft_id ORDER BY k.cost DESC, k.id ASC) AS rank
                 FROM draft_event_picks k
                 JOIN draft_events e ON e.id = k.draft_id
             )
             WHERE rank <= ?
             ORDER BY date_time ASC, draft_id ASC, rank ASC",
        )
        .bind::<BigInt, _>(n)
        .load::<TopPick>(&mut conn)?;
        Ok(rows)
    }

    /// Drafts, picks and average cost per patch
    pub fn patch_trends(&self) -> Result<Vec<PatchTrend>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT e.patch AS patch,
                    COUNT(DISTINCT e.id) AS drafts,
                    COUNT(k.id) AS picks,
                    ROUND(AVG(k.cost), 2) AS avg_cost
             FROM draft_events e
             LEFT JOIN draft_event_picks k ON k.draft_id = e.id
             GROUP BY e.patch
             ORDER BY e.patch IS NULL, e.patch ASC",
        )
        .load::<PatchTrend>(&mut conn)?;
        Ok(rows)
    }

    /// Per-player participation and spend, biggest spender first.
    ///
    /// Picks are attributed by matching `drafted_by` against the player name
    /// of the same draft, ignoring case.
    pub fn player_summaries(&self) -> Result<Vec<PlayerSummary>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT MIN(p.player_name) AS player,
                    COUNT(DISTINCT p.draft_id) AS drafts,
                    COALESCE(SUM(k.picks), 0) AS picks,
                    COALESCE(SUM(k.spent), 0) AS total_spent,
                    ROUND(CAST(SUM(k.spent) AS REAL) / NULLIF(SUM(k.picks), 0), 2) AS avg_cost
             FROM draft_event_players p
             LEFT JOIN (
                 SELECT draft_id, LOWER(drafted_by) AS who, COUNT(*) AS picks, SUM(cost) AS spent
                 FROM draft_event_picks
                 GROUP BY draft_id, LOWER(drafted_by)
             ) k ON k.draft_id = p.draft_id AND k.who = LOWER(p.player_name)
             GROUP BY LOWER(p.player_name)
             ORDER BY total_spent DESC, player ASC",
        )
        .load::<PlayerSummary>(&mut conn)?;
        Ok(rows)
    }

    /// Number of rows in each unified table
    pub fn table_counts(&self) -> Result<TableCounts> {
        let mut conn = self.get_conn()?;
        let events = draft_events::table.count().get_result::<i64>(&mut conn)?;
        let players = draft_event_players::table.count().get_result::<i64>(&mut conn)?;
        let picks = draft_event_picks::table.count().get_result::<i64>(&mut conn)?;
        Ok(TableCounts { events, players, picks })
    }
}

/// Keep the `n` most or least expensive species from a list sorted most
/// expensive first
pub fn rank_costs(costs: Vec<PokemonCost>, n: usize, cheapest: bool) -> Vec<PokemonCost> {
    if cheapest {
        costs.into_iter().rev().take(n).collect()
    } else {
        costs.into_iter().take(n).collect()
    }
}
