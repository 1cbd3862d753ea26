//! Draftdex - Pokemon draft exports into SQLite
//!
//! Ingest the CSV exports of a draft tool, keep every draft in one queryable
//! store, and ask it which Pokemon go for the most money.
//!
//! # Export Layout
//!
//! | Zone | Content |
//! |------|---------|
//! | metadata | `Date:`, `Draft ID:`, `Patch:`, `Total Pokemon Sold:` lines |
//! | players | `Player, Starting Money, Remaining Money` then one row per player |
//! | picks | `Order, Pokemon, Drafted By, Cost` then one row per pick |
//!
//! Legacy exports carry no `Draft ID:`/`Patch:` lines and no `Order` column.
//! Flat exports are a single `Player, Drafted By, Cost` table (the `Player`
//! column holds the species) dated by a `YYYYMMDD_HHMMSS` file name prefix.
//!
//! # Quick Start
//!
//! ```no_run
//! use draftdex::{ingest, Config, Database};
//! use std::path::Path;
//!
//! let db = Database::open_at("draftdex.db").unwrap();
//! let config = Config::load();
//!
//! // Ingest one export
//! let outcome = ingest::ingest_file(&db, Path::new("downloads/draft.csv"), &config.ingest).unwrap();
//! println!("{}", outcome);
//!
//! // Query the store
//! for cost in db.pokemon_costs().unwrap().iter().take(10) {
//!     println!("{}: {:.2}", cost.pokemon, cost.avg_cost);
//! }
//! ```

pub mod config;
pub mod db;
pub mod ingest;
pub mod migrate;
pub mod schema;
pub mod stats;

pub use config::{Config, ConfigError, IngestConfig};
pub use db::{
    Database, DbError, DraftEvent, DraftPick, DraftPlayer, DraftRecord, FormatVersion, PickRow, PlayerRow,
    CURRENT_SCHEMA,
};
pub use ingest::{BatchReport, FileOutcome, IngestError, IngestOutcome};
pub use migrate::{FamilyReport, MigrationReport};
pub use stats::{PatchTrend, PlayerSummary, PokemonCost, TableCounts, TopPick};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify core types are re-exported from crate root
        let _ = CURRENT_SCHEMA;
        let _ = FormatVersion::V2;
        let _ = IngestConfig::default();
    }
}
