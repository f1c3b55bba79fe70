use std::path::Path;
use std::str::FromStr;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use rust_decimal::Decimal;

use crate::core::{ConceptLine, InvoiceHeader, PeajesError};

use super::{InvoiceInput, ParsedInvoice, tags};

/// Parse an invoice from bytes or a file.
pub fn parse_invoice(input: InvoiceInput<'_>, namespace: &str) -> Result<ParsedInvoice, PeajesError> {
    match input {
        InvoiceInput::Bytes(bytes) => from_xml_bytes(bytes, namespace),
        InvoiceInput::Path(path) => from_xml_path(path, namespace),
    }
}

/// Parse an invoice file.
pub fn from_xml_path(path: &Path, namespace: &str) -> Result<ParsedInvoice, PeajesError> {
    let bytes = std::fs::read(path).map_err(|source| PeajesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_xml_bytes(&bytes, namespace)
}

/// Parse an invoice document held in memory.
///
/// `<factura>` must be in `namespace` and be either the document root or a
/// direct child of it.
pub fn from_xml_bytes(xml: &[u8], namespace: &str) -> Result<ParsedInvoice, PeajesError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let ns = namespace.as_bytes();
    let mut p = FacturaParsed::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position();
        match reader.read_resolved_event_into(&mut buf) {
            Ok((res, Event::Start(ref e))) => {
                let frame = Frame::new(&res, e, ns);
                p.open(&mut stack, frame);
            }
            Ok((res, Event::Empty(ref e))) => {
                let frame = Frame::new(&res, e, ns);
                p.open(&mut stack, frame);
                p.close(&mut stack);
            }
            Ok((_, Event::Text(ref e))) => {
                let text = e
                    .unescape()
                    .map_err(|e| PeajesError::Xml(format!("bad text content: {e}")))?;
                p.text(&stack, &text);
            }
            Ok((_, Event::CData(e))) => {
                let raw = e.into_inner();
                p.text(&stack, &String::from_utf8_lossy(&raw));
            }
            Ok((_, Event::End(_))) => p.close(&mut stack),
            Ok((_, Event::Eof)) => break,
            Err(e) => {
                return Err(PeajesError::Xml(format!(
                    "parse error after byte {position}: {e}"
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(PeajesError::Xml(format!(
            "unexpected end of document inside <{}>",
            stack.last().map(|f| f.local.as_str()).unwrap_or_default()
        )));
    }

    p.into_invoice(namespace)
}

/// An open element: local name and whether it is in the invoice namespace.
struct Frame {
    local: String,
    in_ns: bool,
}

impl Frame {
    fn new(res: &ResolveResult<'_>, e: &BytesStart<'_>, ns: &[u8]) -> Self {
        let in_ns = matches!(res, ResolveResult::Bound(Namespace(uri)) if *uri == ns);
        Self {
            local: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            in_ns,
        }
    }
}

/// Text of the first element with a given name; later repeats are ignored.
#[derive(Default)]
struct Field {
    text: Option<String>,
    closed: bool,
}

impl Field {
    fn push(&mut self, text: &str) {
        if !self.closed {
            self.text.get_or_insert_with(String::new).push_str(text);
        }
    }

    fn into_text(self) -> Option<String> {
        self.text
    }
}

#[derive(Default)]
struct RawConcept {
    code: Field,
    description: Field,
    quantity: Field,
    unit_price: Field,
    amount: Field,
}

#[derive(Default)]
struct FacturaParsed {
    /// Stack depth of the `<factura>` element once found.
    factura_depth: Option<usize>,
    factura_closed: bool,

    tariff_class: Field,
    total_amount: Field,
    supply_point_id: Field,

    concepts: Vec<RawConcept>,
    current: Option<RawConcept>,
}

impl FacturaParsed {
    /// Local names of the open elements below `<factura>`, or `None` when
    /// outside it or when any of them is foreign to the namespace.
    fn inner_path<'s>(&self, stack: &'s [Frame]) -> Option<Vec<&'s str>> {
        let depth = self.factura_depth?;
        if self.factura_closed || stack.len() <= depth {
            return None;
        }
        let inner = &stack[depth + 1..];
        if inner.iter().any(|f| !f.in_ns) {
            return None;
        }
        Some(inner.iter().map(|f| f.local.as_str()).collect())
    }

    fn open(&mut self, stack: &mut Vec<Frame>, frame: Frame) {
        let depth = stack.len();
        let is_factura = frame.in_ns && frame.local == tags::FACTURA && depth <= 1;
        stack.push(frame);

        if self.factura_depth.is_none() && is_factura {
            self.factura_depth = Some(depth);
            return;
        }
        if let Some([tags::LISTA_CONCEPTOS, tags::CONCEPTO]) = self.inner_path(stack).as_deref() {
            self.current = Some(RawConcept::default());
        }
    }

    fn close(&mut self, stack: &mut Vec<Frame>) {
        if let Some(path) = self.inner_path(stack) {
            if let [tags::LISTA_CONCEPTOS, tags::CONCEPTO] = path.as_slice() {
                if let Some(concept) = self.current.take() {
                    self.concepts.push(concept);
                }
            } else if let Some(field) = self.field(&path) {
                field.closed = true;
            }
        }
        stack.pop();
        if self.factura_depth == Some(stack.len()) {
            self.factura_closed = true;
        }
    }

    fn text(&mut self, stack: &[Frame], text: &str) {
        let Some(path) = self.inner_path(stack) else {
            return;
        };
        if let Some(field) = self.field(&path) {
            field.push(text);
        }
    }

    /// The field an element path below `<factura>` fills, if any.
    fn field(&mut self, path: &[&str]) -> Option<&mut Field> {
        match path {
            [tags::TIPO_PEAJE] => Some(&mut self.tariff_class),
            [tags::IMPORTE_TOTAL] => Some(&mut self.total_amount),
            [tags::CUPS] => Some(&mut self.supply_point_id),
            [tags::LISTA_CONCEPTOS, tags::CONCEPTO, name] => {
                let c = self.current.as_mut()?;
                match *name {
                    tags::COD_CONCEPTO => Some(&mut c.code),
                    tags::DES_CONCEPTO => Some(&mut c.description),
                    tags::UNIDAD => Some(&mut c.quantity),
                    tags::PREC_UNIDAD => Some(&mut c.unit_price),
                    tags::IMPORTE => Some(&mut c.amount),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn into_invoice(self, namespace: &str) -> Result<ParsedInvoice, PeajesError> {
        if self.factura_depth.is_none() {
            return Err(PeajesError::MalformedInvoice(format!(
                "no <{}> element in namespace '{namespace}'",
                tags::FACTURA
            )));
        }

        let total_amount = match non_empty(self.total_amount.into_text()) {
            Some(v) => Some(parse_decimal(&v).ok_or_else(|| {
                PeajesError::MalformedInvoice(format!(
                    "<{}> is not a number: '{v}'",
                    tags::IMPORTE_TOTAL
                ))
            })?),
            None => None,
        };
        let header = InvoiceHeader {
            tariff_class: non_empty(self.tariff_class.into_text()),
            total_amount,
            supply_point_id: non_empty(self.supply_point_id.into_text()),
        };

        let lines = self
            .concepts
            .into_iter()
            .enumerate()
            .map(|(index, c)| {
                Ok(ConceptLine {
                    code: non_empty(c.code.into_text()).unwrap_or_default(),
                    description: non_empty(c.description.into_text()),
                    quantity: concept_number(index, tags::UNIDAD, c.quantity.into_text())?,
                    declared_unit_price: concept_number(index, tags::PREC_UNIDAD, c.unit_price.into_text())?,
                    declared_amount: concept_number(index, tags::IMPORTE, c.amount.into_text())?,
                })
            })
            .collect::<Result<Vec<_>, PeajesError>>()?;

        tracing::info!(
            tariff_class = ?header.tariff_class,
            concepts = lines.len(),
            "parsed invoice"
        );
        Ok(ParsedInvoice { header, lines })
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Absent or empty numeric fields default to zero.
fn concept_number(
    index: usize,
    field: &'static str,
    text: Option<String>,
) -> Result<Decimal, PeajesError> {
    match non_empty(text) {
        None => Ok(Decimal::ZERO),
        Some(v) => parse_decimal(&v).ok_or(PeajesError::MalformedConcept {
            index,
            field,
            value: v,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_NAMESPACE;
    use rust_decimal_macros::dec;

    fn parse(xml: &str) -> Result<ParsedInvoice, PeajesError> {
        from_xml_bytes(xml.as_bytes(), DEFAULT_NAMESPACE)
    }

    #[test]
    fn parses_header_and_concepts_in_order() {
        let inv = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<factura xmlns="http://localhost/sctd/B7031">
  <tipopeaje> RL.2 </tipopeaje>
  <importetotal>123.45</importetotal>
  <cups>ES0217010100000000AB</cups>
  <listaconceptos>
    <concepto>
      <codconcepto>2002</codconcepto>
      <desconcepto>Término fijo</desconcepto>
      <unidad>30</unidad>
      <precunidad>0.0612</precunidad>
      <importe>1.84</importe>
    </concepto>
    <concepto>
      <codconcepto>2000</codconcepto>
      <unidad>1500</unidad>
      <precunidad>0.0318</precunidad>
      <importe>47.70</importe>
    </concepto>
  </listaconceptos>
</factura>"#,
        )
        .unwrap();

        assert_eq!(inv.header.tariff_class.as_deref(), Some("RL.2"));
        assert_eq!(inv.header.total_amount, Some(dec!(123.45)));
        assert_eq!(inv.header.supply_point_id.as_deref(), Some("ES0217010100000000AB"));
        assert_eq!(inv.lines.len(), 2);
        assert_eq!(inv.lines[0].code, "2002");
        assert_eq!(inv.lines[0].description.as_deref(), Some("Término fijo"));
        assert_eq!(inv.lines[0].quantity, dec!(30));
        assert_eq!(inv.lines[1].code, "2000");
        assert_eq!(inv.lines[1].description, None);
        assert_eq!(inv.lines[1].declared_amount, dec!(47.70));
    }

    #[test]
    fn factura_nested_under_root_is_found() {
        let inv = parse(
            r#"<MensajeFacturacion xmlns:s="http://localhost/sctd/B7031">
  <s:factura>
    <s:tipopeaje>RL.1</s:tipopeaje>
  </s:factura>
</MensajeFacturacion>"#,
        )
        .unwrap();
        assert_eq!(inv.header.tariff_class.as_deref(), Some("RL.1"));
        assert!(inv.lines.is_empty());
    }

    #[test]
    fn wrong_namespace_is_malformed_invoice() {
        let err = parse(r#"<factura xmlns="urn:other"><tipopeaje>RL.1</tipopeaje></factura>"#)
            .unwrap_err();
        assert!(matches!(err, PeajesError::MalformedInvoice(_)));

        let err = parse("<factura><tipopeaje>RL.1</tipopeaje></factura>").unwrap_err();
        assert!(matches!(err, PeajesError::MalformedInvoice(_)));
    }

    #[test]
    fn deeply_nested_factura_is_not_top_level() {
        let err = parse(
            r#"<a xmlns="http://localhost/sctd/B7031"><b><factura><tipopeaje>X</tipopeaje></factura></b></a>"#,
        )
        .unwrap_err();
        assert!(matches!(err, PeajesError::MalformedInvoice(_)));
    }

    #[test]
    fn missing_tariff_class_is_not_a_parse_error() {
        let inv = parse(r#"<factura xmlns="http://localhost/sctd/B7031"><tipopeaje/></factura>"#)
            .unwrap();
        assert_eq!(inv.header.tariff_class, None);
    }

    #[test]
    fn absent_and_empty_numbers_default_to_zero() {
        let inv = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031">
  <listaconceptos>
    <concepto><codconcepto>2006</codconcepto><unidad></unidad><precunidad/></concepto>
    <concepto/>
  </listaconceptos>
</factura>"#,
        )
        .unwrap();
        assert_eq!(inv.lines.len(), 2);
        assert_eq!(inv.lines[0].quantity, Decimal::ZERO);
        assert_eq!(inv.lines[0].declared_unit_price, Decimal::ZERO);
        assert_eq!(inv.lines[0].declared_amount, Decimal::ZERO);
        assert_eq!(inv.lines[1].code, "");
    }

    #[test]
    fn non_numeric_concept_field_fails() {
        let err = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031">
  <listaconceptos>
    <concepto><codconcepto>2002</codconcepto><unidad>1</unidad></concepto>
    <concepto><codconcepto>2000</codconcepto><precunidad>0,0318</precunidad></concepto>
  </listaconceptos>
</factura>"#,
        )
        .unwrap_err();
        match err {
            PeajesError::MalformedConcept { index, field, value } => {
                assert_eq!(index, 1);
                assert_eq!(field, "precunidad");
                assert_eq!(value, "0,0318");
            }
            other => panic!("expected MalformedConcept, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_total_fails() {
        let err = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031"><importetotal>abc</importetotal></factura>"#,
        )
        .unwrap_err();
        assert!(matches!(err, PeajesError::MalformedInvoice(_)));
    }

    #[test]
    fn foreign_namespace_children_are_ignored() {
        let inv = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031" xmlns:x="urn:x">
  <x:tipopeaje>WRONG</x:tipopeaje>
  <tipopeaje>RL.3</tipopeaje>
  <listaconceptos><x:concepto><codconcepto>2002</codconcepto></x:concepto></listaconceptos>
</factura>"#,
        )
        .unwrap();
        assert_eq!(inv.header.tariff_class.as_deref(), Some("RL.3"));
        assert!(inv.lines.is_empty());
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let inv = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031">
  <listaconceptos><concepto>
    <codconcepto>2011</codconcepto>
    <desconcepto><![CDATA[Cargo <ministerio>]]></desconcepto>
    <importe>1e1</importe>
  </concepto></listaconceptos>
</factura>"#,
        )
        .unwrap();
        assert_eq!(inv.lines[0].description.as_deref(), Some("Cargo <ministerio>"));
        assert_eq!(inv.lines[0].declared_amount, dec!(10));
    }

    #[test]
    fn broken_xml_is_xml_error() {
        assert!(matches!(
            parse(r#"<factura xmlns="http://localhost/sctd/B7031"><cups>1</factura>"#),
            Err(PeajesError::Xml(_))
        ));
        assert!(matches!(
            parse(r#"<factura xmlns="http://localhost/sctd/B7031"><cups>1</cups>"#),
            Err(PeajesError::Xml(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = from_xml_path(Path::new("/nonexistent/factura.xml"), DEFAULT_NAMESPACE)
            .unwrap_err();
        assert!(matches!(err, PeajesError::Io { .. }));
    }

    #[test]
    fn repeated_elements_keep_the_first_value() {
        let inv = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031">
  <tipopeaje>RL.1</tipopeaje>
  <tipopeaje>RL.2</tipopeaje>
  <listaconceptos>
    <concepto>
      <codconcepto>2002</codconcepto>
      <importe>1</importe>
      <importe>2</importe>
    </concepto>
  </listaconceptos>
</factura>"#,
        )
        .unwrap();
        assert_eq!(inv.header.tariff_class.as_deref(), Some("RL.1"));
        assert_eq!(inv.lines[0].declared_amount, dec!(1));
    }

    #[test]
    fn split_text_within_one_element_is_joined() {
        let inv = parse(
            r#"<factura xmlns="http://localhost/sctd/B7031">
  <tipopeaje>RL.<![CDATA[1]]></tipopeaje>
</factura>"#,
        )
        .unwrap();
        assert_eq!(inv.header.tariff_class.as_deref(), Some("RL.1"));
    }
}
