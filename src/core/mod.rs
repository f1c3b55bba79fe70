//! Invoice model, reference tables, price rules and reconciliation.
//!
//! Everything here is pure: no file or network I/O.

mod config;
mod engine;
mod error;
pub mod rules;
mod tables;
mod types;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use rules::{ConceptRule, RowSelector, RuleTable, resolve};
pub use tables::*;
pub use types::*;
