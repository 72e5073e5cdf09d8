//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`Metric`, `RegionPolicy`, `DataSource`)
//! - normalized observations and the filtered `Dataset`
//! - calculator outputs (`MortalityRow`, `LethalityRow`, `GrowthRate`, `CorrelationMatrix`)

pub mod types;

pub use types::*;
