use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::PeajesError;

/// Invoice header as read from `<factura>`.
///
/// Parsing is structural only: every field is optional here. Use
/// [`InvoiceHeader::complete`] before resolving prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// `tipopeaje`: tariff class selecting the reference row.
    pub tariff_class: Option<String>,
    /// `importetotal`: declared invoice total.
    pub total_amount: Option<Decimal>,
    /// `cups`: supply point identifier, carried through untouched.
    pub supply_point_id: Option<String>,
}

impl InvoiceHeader {
    /// Promote to a [`CompleteHeader`], failing if the tariff class is
    /// absent or blank.
    pub fn complete(&self) -> Result<CompleteHeader, PeajesError> {
        let tariff_class = self
            .tariff_class
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(PeajesError::MissingTariffClass)?;

        Ok(CompleteHeader {
            tariff_class: tariff_class.to_string(),
            total_amount: self.total_amount,
            supply_point_id: self.supply_point_id.clone(),
        })
    }
}

/// Header with a guaranteed non-empty tariff class.
///
/// Only obtainable through [`InvoiceHeader::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteHeader {
    tariff_class: String,
    total_amount: Option<Decimal>,
    supply_point_id: Option<String>,
}

impl CompleteHeader {
    pub fn tariff_class(&self) -> &str {
        &self.tariff_class
    }

    pub fn total_amount(&self) -> Option<Decimal> {
        self.total_amount
    }

    pub fn supply_point_id(&self) -> Option<&str> {
        self.supply_point_id.as_deref()
    }
}

/// One `<concepto>` of the invoice, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptLine {
    /// `codconcepto`; empty when the element is missing.
    pub code: String,
    /// `desconcepto`.
    pub description: Option<String>,
    /// `unidad`: billed units.
    pub quantity: Decimal,
    /// `precunidad`: declared unit price.
    pub declared_unit_price: Decimal,
    /// `importe`: declared line amount.
    pub declared_amount: Decimal,
}

impl ConceptLine {
    pub fn new(
        code: impl Into<String>,
        quantity: Decimal,
        declared_unit_price: Decimal,
        declared_amount: Decimal,
    ) -> Self {
        Self {
            code: code.into(),
            description: None,
            quantity,
            declared_unit_price,
            declared_amount,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `quantity × declared_unit_price`, rounded to cents. `None` on overflow.
    pub fn computed_amount(&self) -> Option<Decimal> {
        self.quantity
            .checked_mul(self.declared_unit_price)
            .map(|amount| amount.round_dp(2))
    }
}

/// Per-line outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
    /// No reference price resolves for the concept code.
    #[serde(rename = "NO_RULE")]
    NoRule,
}

impl LineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::NoRule => "NO_RULE",
        }
    }
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Ko => "KO",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation of one [`ConceptLine`] against its reference price.
///
/// `reference_unit_price`, `price_matches` and `amount_matches` are `None`
/// exactly when `status` is [`LineStatus::NoRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineResult {
    pub code: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub declared_unit_price: Decimal,
    pub reference_unit_price: Option<Decimal>,
    pub price_matches: Option<bool>,
    pub declared_amount: Decimal,
    pub computed_amount: Decimal,
    pub amount_matches: Option<bool>,
    pub status: LineStatus,
}

/// Aggregate of all [`LineResult`]s of one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub tariff_class: String,
    pub supply_point_id: Option<String>,
    pub declared_total_amount: Option<Decimal>,
    /// Sum of the declared line amounts; `None` when it overflows.
    /// Informational.
    pub declared_lines_total: Option<Decimal>,
    pub line_count: usize,
    /// Lines with status `ERROR`. `NO_RULE` lines are not counted.
    pub error_count: usize,
    pub no_rule_count: usize,
    pub overall_status: OverallStatus,
}

/// Everything a caller gets back from one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutput {
    /// Header fields as parsed.
    pub meta: InvoiceHeader,
    pub lines: Vec<LineResult>,
    pub summary: InvoiceSummary,
}

/// Absolute tolerances for the two per-line comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Max |declared unit price − reference unit price|.
    #[serde(default = "default_price_tolerance")]
    pub price: Decimal,
    /// Max |declared amount − computed amount|.
    #[serde(default = "default_amount_tolerance")]
    pub amount: Decimal,
}

fn default_price_tolerance() -> Decimal {
    dec!(0.000001)
}

fn default_amount_tolerance() -> Decimal {
    dec!(0.01)
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            price: default_price_tolerance(),
            amount: default_amount_tolerance(),
        }
    }
}
