//! # peajes
//!
//! Validates the concept lines (`<concepto>`) of a gas-distribution invoice
//! against the regulated BOE tolls published in a reference workbook.
//!
//! For each line the declared unit price is compared with the reference
//! price for its concept code and the invoice tariff class, and the declared
//! amount with `quantity × unit price`. Lines whose code has no reference
//! price are reported as `NO_RULE` and never fail the invoice.
//!
//! All monetary values use [`rust_decimal::Decimal`].
//!
//! ## Quick Start
//!
//! ```rust
//! use peajes::core::*;
//! use rust_decimal_macros::dec;
//!
//! let tables = ReferenceTables::empty().with_table(
//!     ReferenceSheet::Local,
//!     Table::new("REF_peajes_local", &["peaje", "tf", "tv"])
//!         .with_row(vec!["RL.1".into(), dec!(0.0254).into(), dec!(0.0391).into()]),
//! );
//! let header = InvoiceHeader {
//!     tariff_class: Some("RL.1".into()),
//!     ..Default::default()
//! };
//! let lines = [ConceptLine::new("2002", dec!(30), dec!(0.0254), dec!(0.76))];
//!
//! let (rows, summary) = validate(&header, &lines, &tables, &Tolerances::default()).unwrap();
//! assert_eq!(rows[0].status, LineStatus::Ok);
//! assert_eq!(summary.overall_status, OverallStatus::Ok);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Data model, reference tables, rule table, reconciliation |
//! | `xml` (default) | Invoice XML parsing |
//! | `xlsx` (default) | Reference workbook loading |
//! | `report` | CSV / JSON rendering of results |
//! | `cli` | `peajes` command-line binary |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "xlsx")]
pub mod xlsx;

#[cfg(all(feature = "xml", feature = "xlsx"))]
mod pipeline;

#[cfg(feature = "report")]
pub mod report;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

#[cfg(all(feature = "xml", feature = "xlsx"))]
pub use pipeline::{Validator, validate_invoice};
