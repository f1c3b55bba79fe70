//! Concept-code rule table and price resolution.
//!
//! Each known concept code maps to one reference sheet, a row-selection
//! policy and an ordered list of candidate price columns. Adding a concept
//! is a new [`ConceptRule`], not new code.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::PeajesError;
use super::tables::{ReferenceSheet, ReferenceTables};

/// Join column holding the tariff class in the per-tariff sheets.
pub const TARIFF_KEY_COLUMN: &str = "peaje";

/// Long-form transport price column as published in the tariff workbook.
pub const TRANSPORT_LONG_COLUMN: &str = "tf_transporte €/(kWh/día) y año";

/// Concept codes with a regulated reference price.
pub mod codes {
    /// Local toll, fixed term.
    pub const LOCAL_FIXED: &str = "2002";
    /// Local toll, variable term.
    pub const LOCAL_VARIABLE: &str = "2000";
    /// Regasification toll.
    pub const REGAS: &str = "2009";
    /// Ministry surcharge.
    pub const MINISTRY_SURCHARGE: &str = "2011";
    /// Transport toll.
    pub const TRANSPORT: &str = "2006";
}

/// How the reference row is picked from a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSelector {
    /// First row whose `key_column` equals the invoice tariff class.
    ByTariffClass { key_column: String },
    /// First data row; the sheet does not depend on the tariff class.
    First,
}

impl RowSelector {
    pub fn by_tariff_class() -> Self {
        Self::ByTariffClass {
            key_column: TARIFF_KEY_COLUMN.to_string(),
        }
    }
}

/// Where the reference price of one concept code lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRule {
    pub code: String,
    pub sheet: ReferenceSheet,
    pub rows: RowSelector,
    /// Price columns, consulted in order; the first present one is used.
    pub columns: Vec<String>,
}

impl ConceptRule {
    pub fn new(
        code: impl Into<String>,
        sheet: ReferenceSheet,
        rows: RowSelector,
        columns: &[&str],
    ) -> Self {
        Self {
            code: code.into(),
            sheet,
            rows,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Reference price for `tariff_class` under this rule.
    ///
    /// `Ok(None)` when no row is selected or the price cell is blank.
    /// A sheet with none of the candidate columns (or no key column) is a
    /// broken workbook, not a missing rule: it fails with
    /// [`PeajesError::MissingReferenceColumn`] instead of resolving to `None`,
    /// including for the transport sheet.
    pub fn resolve(
        &self,
        tariff_class: &str,
        tables: &ReferenceTables,
    ) -> Result<Option<Decimal>, PeajesError> {
        let table = tables.get(self.sheet);

        let row = match &self.rows {
            RowSelector::ByTariffClass { key_column } => {
                let key_idx = table.column_index(key_column).ok_or_else(|| {
                    PeajesError::MissingReferenceColumn {
                        sheet: self.sheet.sheet_name().to_string(),
                        candidates: vec![key_column.clone()],
                    }
                })?;
                table.find_row(key_idx, tariff_class)
            }
            RowSelector::First => table.first_row(),
        };
        let Some(row) = row else {
            return Ok(None);
        };

        let (column, col_idx) = table.first_present(&self.columns).ok_or_else(|| {
            PeajesError::MissingReferenceColumn {
                sheet: self.sheet.sheet_name().to_string(),
                candidates: self.columns.clone(),
            }
        })?;

        match row.get(col_idx).and_then(|cell| cell.as_decimal()) {
            None => Ok(None),
            Some(Ok(price)) => Ok(Some(price)),
            Some(Err(value)) => Err(PeajesError::InvalidReferenceValue {
                sheet: self.sheet.sheet_name().to_string(),
                column: column.to_string(),
                value,
            }),
        }
    }
}

/// Closed mapping from concept code to [`ConceptRule`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleTable {
    rules: BTreeMap<String, ConceptRule>,
}

static REGULATED: LazyLock<RuleTable> = LazyLock::new(RuleTable::build_regulated);

impl RuleTable {
    /// Table with no rules; every code resolves to `None`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The regulated concept codes.
    pub fn regulated() -> Self {
        REGULATED.clone()
    }

    fn build_regulated() -> Self {
        use ReferenceSheet::*;

        let by_tariff = RowSelector::by_tariff_class;
        Self::empty()
            .with_rule(ConceptRule::new(codes::LOCAL_FIXED, Local, by_tariff(), &["tf"]))
            .with_rule(ConceptRule::new(codes::LOCAL_VARIABLE, Local, by_tariff(), &["tv"]))
            .with_rule(ConceptRule::new(
                codes::REGAS,
                Regas,
                by_tariff(),
                &["tf_regas", "tf"],
            ))
            .with_rule(ConceptRule::new(
                codes::MINISTRY_SURCHARGE,
                Cargo,
                by_tariff(),
                &["tf_cargo", "tf"],
            ))
            .with_rule(ConceptRule::new(
                codes::TRANSPORT,
                Transporte,
                RowSelector::First,
                &[TRANSPORT_LONG_COLUMN, "tf", "tf_tp", "tf_transporte"],
            ))
    }

    pub fn with_rule(mut self, rule: ConceptRule) -> Self {
        self.insert(rule);
        self
    }

    /// Add a rule, returning the one it replaces.
    pub fn insert(&mut self, rule: ConceptRule) -> Option<ConceptRule> {
        self.rules.insert(rule.code.clone(), rule)
    }

    pub fn get(&self, code: &str) -> Option<&ConceptRule> {
        self.rules.get(code.trim())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConceptRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Expected reference price for a concept code, `Ok(None)` when no rule
    /// applies.
    pub fn resolve(
        &self,
        code: &str,
        tariff_class: &str,
        tables: &ReferenceTables,
    ) -> Result<Option<Decimal>, PeajesError> {
        match self.get(code) {
            Some(rule) => rule.resolve(tariff_class, tables),
            None => Ok(None),
        }
    }
}

/// Resolve against the regulated rule table.
pub fn resolve(
    code: &str,
    tariff_class: &str,
    tables: &ReferenceTables,
) -> Result<Option<Decimal>, PeajesError> {
    REGULATED.resolve(code, tariff_class, tables)
}
