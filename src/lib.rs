//! Battery backup and solar system sizing
//!
//! Turns a connected load and a backup duration into a priced quote: either
//! a bundled market package or a custom build snapped from catalog parts,
//! with a solar array sized for an unreliable grid.

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod package;
pub mod physics;
pub mod snapper;
pub mod solar;

pub use catalog::{CatalogError, CatalogGateway, MemoryCatalog};
pub use config::EngineConfig;
pub use db::SqliteCatalog;
pub use engine::SizingEngine;
pub use error::SizingError;
pub use models::{SizingRequest, SizingResult, SystemSpecs, VoltageTier};
