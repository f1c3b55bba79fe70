//! CSV and JSON rendering of validation results.

use rust_decimal::Decimal;

use crate::core::{LineResult, PeajesError, ValidationOutput};

/// Column headers of the CSV line table.
pub const CSV_HEADERS: [&str; 10] = [
    "codconcepto",
    "desconcepto",
    "unidad",
    "precunidad_xml",
    "precunidad_boe",
    "precio_ok",
    "importe_xml",
    "importe_calc",
    "importe_ok",
    "estado",
];

/// One CSV row per line result; null fields become empty cells.
pub fn to_csv(output: &ValidationOutput) -> Result<String, PeajesError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_err)?;
    for line in &output.lines {
        writer.write_record(csv_row(line)).map_err(csv_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PeajesError::Report(format!("CSV flush error: {e}")))?;
    String::from_utf8(bytes).map_err(|e| PeajesError::Report(format!("CSV UTF-8 error: {e}")))
}

/// The whole output as pretty-printed JSON.
pub fn to_json(output: &ValidationOutput) -> Result<String, PeajesError> {
    serde_json::to_string_pretty(output)
        .map_err(|e| PeajesError::Report(format!("JSON error: {e}")))
}

fn csv_row(line: &LineResult) -> [String; 10] {
    [
        line.code.clone(),
        line.description.clone().unwrap_or_default(),
        decimal(line.quantity),
        decimal(line.declared_unit_price),
        line.reference_unit_price.map(decimal).unwrap_or_default(),
        flag(line.price_matches),
        decimal(line.declared_amount),
        decimal(line.computed_amount),
        flag(line.amount_matches),
        line.status.to_string(),
    ]
}

fn decimal(d: Decimal) -> String {
    d.normalize().to_string()
}

fn flag(b: Option<bool>) -> String {
    b.map(|b| b.to_string()).unwrap_or_default()
}

fn csv_err(e: csv::Error) -> PeajesError {
    PeajesError::Report(format!("CSV write error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use rust_decimal_macros::dec;

    fn output() -> ValidationOutput {
        let header = InvoiceHeader {
            tariff_class: Some("X".into()),
            total_amount: None,
            supply_point_id: None,
        };
        let lines = vec![
            ConceptLine::new("2002", dec!(1), dec!(10.0), dec!(10.0)).description("Término, fijo"),
            ConceptLine::new("9999", dec!(5), dec!(3.0), dec!(15.0)),
        ];
        let tables = ReferenceTables::empty().with_table(
            ReferenceSheet::Local,
            Table::new("REF_peajes_local", &["peaje", "tf", "tv"])
                .with_row(vec!["X".into(), dec!(10).into(), dec!(2).into()]),
        );
        let (lines, summary) = validate(&header, &lines, &tables, &Tolerances::default()).unwrap();
        ValidationOutput {
            meta: header,
            lines,
            summary,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_line() {
        let csv = to_csv(&output()).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            "codconcepto,desconcepto,unidad,precunidad_xml,precunidad_boe,precio_ok,importe_xml,importe_calc,importe_ok,estado"
        );
        assert_eq!(rows[1], "2002,\"Término, fijo\",1,10,10,true,10,10,true,OK");
        assert_eq!(rows[2], "9999,,5,3,,,15,15,,NO_RULE");
    }

    #[test]
    fn json_uses_wire_statuses_and_nulls() {
        let json = to_json(&output()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["overall_status"], "OK");
        assert_eq!(value["lines"][1]["status"], "NO_RULE");
        assert!(value["lines"][1]["reference_unit_price"].is_null());
        assert_eq!(value["summary"]["line_count"], 2);
    }
}
