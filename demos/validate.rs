//! Validate an invoice file against a reference workbook.
//!
//! ```sh
//! cargo run --example validate -- factura.xml tablas.xlsx
//! ```

use std::path::PathBuf;

use peajes::core::LineStatus;
use peajes::validate_invoice;

fn main() {
    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let (Some(invoice), Some(reference)) = (args.next(), args.next()) else {
        eprintln!("usage: validate <factura.xml> <tablas.xlsx>");
        std::process::exit(1);
    };

    let output = match validate_invoice(invoice.as_path(), &reference) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let s = &output.summary;
    println!("tipopeaje {}: {} lines, {} errors", s.tariff_class, s.line_count, s.error_count);
    for line in &output.lines {
        let reference = line
            .reference_unit_price
            .map(|p| p.normalize().to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<6} declared {:>10} reference {:>10}  {}",
            line.code,
            line.declared_unit_price.normalize(),
            reference,
            line.status
        );
        if line.status == LineStatus::Error {
            println!("         computed amount {} vs declared {}", line.computed_amount, line.declared_amount);
        }
    }
    println!("overall: {}", s.overall_status);
}
