//! End-to-end validation: invoice XML + reference workbook → result.

use std::path::Path;

use crate::core::{
    PeajesError, ReferenceTables, RuleTable, ValidationOutput, ValidatorConfig, reconcile,
};
use crate::xml::{self, InvoiceInput};
use crate::xlsx;

/// Validates invoices with a fixed configuration and rule table.
///
/// Reference tables are loaded fresh on every call; nothing is cached
/// between runs.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidatorConfig,
    rules: RuleTable,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            rules: RuleTable::regulated(),
        }
    }

    /// Replace the regulated rule table.
    pub fn rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate an invoice against the workbook at `reference_path`.
    pub fn validate<'a>(
        &self,
        input: impl Into<InvoiceInput<'a>>,
        reference_path: &Path,
    ) -> Result<ValidationOutput, PeajesError> {
        let parsed = xml::parse_invoice(input.into(), &self.config.namespace)?;
        let tables = xlsx::load_reference_tables(reference_path)?;
        self.validate_parsed(parsed, &tables)
    }

    /// Validate against the workbook named in the configuration.
    pub fn validate_with_configured_reference<'a>(
        &self,
        input: impl Into<InvoiceInput<'a>>,
    ) -> Result<ValidationOutput, PeajesError> {
        let path = self.config.reference_path.as_deref().ok_or_else(|| {
            PeajesError::Config("no reference workbook configured (reference_path)".into())
        })?;
        self.validate(input, path)
    }

    /// Validate against tables already in memory.
    pub fn validate_with_tables<'a>(
        &self,
        input: impl Into<InvoiceInput<'a>>,
        tables: &ReferenceTables,
    ) -> Result<ValidationOutput, PeajesError> {
        let parsed = xml::parse_invoice(input.into(), &self.config.namespace)?;
        self.validate_parsed(parsed, tables)
    }

    fn validate_parsed(
        &self,
        parsed: xml::ParsedInvoice,
        tables: &ReferenceTables,
    ) -> Result<ValidationOutput, PeajesError> {
        let (meta, lines) = parsed.into_parts();
        let header = meta.complete()?;
        let (lines, summary) =
            reconcile(&header, &lines, tables, &self.rules, &self.config.tolerance)?;
        Ok(ValidationOutput {
            meta,
            lines,
            summary,
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

/// Validate with default namespace, tolerances and the regulated rules.
pub fn validate_invoice<'a>(
    input: impl Into<InvoiceInput<'a>>,
    reference_path: &Path,
) -> Result<ValidationOutput, PeajesError> {
    Validator::new(ValidatorConfig::default()).validate(input, reference_path)
}
