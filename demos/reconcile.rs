//! Reconcile concept lines against in-memory reference tables.

use peajes::core::*;
use rust_decimal_macros::dec;

fn main() {
    let tables = ReferenceTables::empty()
        .with_table(
            ReferenceSheet::Local,
            Table::new("REF_peajes_local", &["peaje", "tf", "tv"])
                .with_row(vec!["RL.1".into(), dec!(0.0254).into(), dec!(0.0391).into()]),
        )
        .with_table(
            ReferenceSheet::Transporte,
            Table::new("REF_peajes_transporte", &[rules::TRANSPORT_LONG_COLUMN])
                .with_row(vec![dec!(0.0150).into()]),
        );

    let header = InvoiceHeader {
        tariff_class: Some("RL.1".into()),
        ..Default::default()
    };
    let lines = [
        ConceptLine::new("2002", dec!(30), dec!(0.0254), dec!(0.76)).description("Término fijo"),
        ConceptLine::new("2000", dec!(1500), dec!(0.0400), dec!(60.00)).description("Término variable"),
        ConceptLine::new("2006", dec!(30), dec!(0.0150), dec!(0.45)).description("Transporte"),
        ConceptLine::new("1020", dec!(1), dec!(0.60), dec!(0.60)).description("Alquiler contador"),
    ];

    match validate(&header, &lines, &tables, &Tolerances::default()) {
        Ok((rows, summary)) => {
            for row in &rows {
                println!("{} {:<18} {}", row.code, row.description.as_deref().unwrap_or(""), row.status);
            }
            println!(
                "{} lines, {} errors, {} without rule: {}",
                summary.line_count, summary.error_count, summary.no_rule_count, summary.overall_status
            );
        }
        Err(e) => eprintln!("validation failed: {e}"),
    }
}
