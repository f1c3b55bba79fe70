use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a validation run.
///
/// A concept without an applicable reference price is not an error; it is
/// reported per line as [`LineStatus::NoRule`](super::LineStatus::NoRule).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PeajesError {
    /// The `<factura>` element is missing, in the wrong namespace, or a
    /// header field holds unparseable content.
    #[error("malformed invoice: {0}")]
    MalformedInvoice(String),

    /// A numeric field of a `<concepto>` holds non-numeric text.
    #[error("malformed concepto #{index}: field '{field}' is not a number: '{value}'")]
    MalformedConcept {
        /// 0-based position of the concept in the document.
        index: usize,
        field: &'static str,
        value: String,
    },

    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A required sheet is absent from the reference workbook.
    #[error("reference workbook has no sheet named '{0}'")]
    MissingReferenceSheet(String),

    /// None of the candidate columns exists in the reference sheet.
    #[error("sheet '{sheet}' has none of the columns {candidates:?}")]
    MissingReferenceColumn {
        sheet: String,
        candidates: Vec<String>,
    },

    /// The selected reference cell does not hold a number.
    #[error("sheet '{sheet}', column '{column}': '{value}' is not a number")]
    InvalidReferenceValue {
        sheet: String,
        column: String,
        value: String,
    },

    /// The reference workbook cannot be opened or decoded.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// A line's numbers overflow the decimal range.
    #[error("arithmetic overflow in concepto #{index} ({code}): {operation}")]
    Arithmetic {
        /// 0-based position of the line.
        index: usize,
        code: String,
        operation: &'static str,
    },

    /// The invoice header carries no tariff class (`tipopeaje`).
    #[error("invoice has no tariff class (tipopeaje)")]
    MissingTariffClass,

    /// The invoice file cannot be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration cannot be parsed or holds invalid values.
    #[error("configuration error: {0}")]
    Config(String),

    /// A result cannot be rendered.
    #[error("report error: {0}")]
    Report(String),
}
