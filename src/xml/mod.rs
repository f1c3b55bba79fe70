//! Invoice XML parsing.
//!
//! The document shape:
//!
//! ```xml
//! <factura xmlns="http://localhost/sctd/B7031">
//!   <tipopeaje>RL.1</tipopeaje>
//!   <importetotal>12.34</importetotal>
//!   <cups>ES0217010100000000AB</cups>
//!   <listaconceptos>
//!     <concepto>
//!       <codconcepto>2002</codconcepto>
//!       <desconcepto>Término fijo</desconcepto>
//!       <unidad>30</unidad>
//!       <precunidad>0.0612</precunidad>
//!       <importe>1.84</importe>
//!     </concepto>
//!   </listaconceptos>
//! </factura>
//! ```

mod parse;

use std::path::Path;

use crate::core::{ConceptLine, InvoiceHeader};

pub use parse::{from_xml_bytes, from_xml_path, parse_invoice};

/// Element names of the invoice schema.
pub mod tags {
    pub const FACTURA: &str = "factura";
    pub const TIPO_PEAJE: &str = "tipopeaje";
    pub const IMPORTE_TOTAL: &str = "importetotal";
    pub const CUPS: &str = "cups";
    pub const LISTA_CONCEPTOS: &str = "listaconceptos";
    pub const CONCEPTO: &str = "concepto";
    pub const COD_CONCEPTO: &str = "codconcepto";
    pub const DES_CONCEPTO: &str = "desconcepto";
    pub const UNIDAD: &str = "unidad";
    pub const PREC_UNIDAD: &str = "precunidad";
    pub const IMPORTE: &str = "importe";
}

/// Where the invoice document comes from.
#[derive(Debug, Clone, Copy)]
pub enum InvoiceInput<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
}

impl<'a> From<&'a [u8]> for InvoiceInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for InvoiceInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Path> for InvoiceInput<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a std::path::PathBuf> for InvoiceInput<'a> {
    fn from(path: &'a std::path::PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Header and concept lines of one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvoice {
    pub header: InvoiceHeader,
    pub lines: Vec<ConceptLine>,
}

impl ParsedInvoice {
    pub fn into_parts(self) -> (InvoiceHeader, Vec<ConceptLine>) {
        (self.header, self.lines)
    }
}
