//! tilemask Core - Domain models, ports, and configuration
//!
//! This crate contains the shared data model, the error taxonomy, the layered
//! configuration and the port traits that the tile/polygon adapters implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{Result, TilemaskError};
