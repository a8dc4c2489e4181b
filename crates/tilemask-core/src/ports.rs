//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod sources;

pub use sources::{PairSink, PolygonSource, TileFetcher};
