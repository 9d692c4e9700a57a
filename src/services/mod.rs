//! Service layer for vocabfetch business logic.
//!
//! Domain logic separated from UI concerns; the CLI consumes the events.

pub mod enrich;

pub use enrich::{AudioMatch, EnrichConfig, EnrichEvent, EnrichService, RowOutcome};
