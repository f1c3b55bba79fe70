use rust_decimal::Decimal;

use super::error::PeajesError;
use super::rules::RuleTable;
use super::tables::ReferenceTables;
use super::types::*;

/// Validate parsed concept lines with the regulated rule table.
///
/// Fails with [`PeajesError::MissingTariffClass`] before any line is
/// processed when the header lacks a tariff class.
pub fn validate(
    header: &InvoiceHeader,
    lines: &[ConceptLine],
    tables: &ReferenceTables,
    tolerances: &Tolerances,
) -> Result<(Vec<LineResult>, InvoiceSummary), PeajesError> {
    let header = header.complete()?;
    reconcile(&header, lines, tables, &RuleTable::regulated(), tolerances)
}

/// Reconcile each line against its reference price and summarize.
///
/// Lines are independent; output order follows `lines`.
pub fn reconcile(
    header: &CompleteHeader,
    lines: &[ConceptLine],
    tables: &ReferenceTables,
    rules: &RuleTable,
    tolerances: &Tolerances,
) -> Result<(Vec<LineResult>, InvoiceSummary), PeajesError> {
    let tariff_class = header.tariff_class();

    let mut results = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let reference = rules.resolve(&line.code, tariff_class, tables)?;
        let result = reconcile_line(index, line, reference, tolerances)?;
        match result.status {
            LineStatus::NoRule => {
                tracing::warn!(code = %line.code, tariff_class, "no reference price for concept");
            }
            status => {
                tracing::debug!(
                    code = %line.code,
                    %status,
                    declared = %line.declared_unit_price,
                    reference = ?result.reference_unit_price,
                    "concept reconciled"
                );
            }
        }
        results.push(result);
    }

    let summary = summarize(header, &results);
    tracing::info!(
        tariff_class,
        lines = summary.line_count,
        errors = summary.error_count,
        no_rule = summary.no_rule_count,
        status = %summary.overall_status,
        "invoice reconciled"
    );
    Ok((results, summary))
}

/// Compare one line with its (possibly absent) reference price.
///
/// `index` is the line's position, reported when its numbers overflow.
pub fn reconcile_line(
    index: usize,
    line: &ConceptLine,
    reference: Option<Decimal>,
    tolerances: &Tolerances,
) -> Result<LineResult, PeajesError> {
    let overflow = |operation: &'static str| PeajesError::Arithmetic {
        index,
        code: line.code.clone(),
        operation,
    };
    let computed_amount = line
        .computed_amount()
        .ok_or_else(|| overflow("unidad * precunidad"))?;

    let (price_matches, amount_matches, status) = match reference {
        None => (None, None, LineStatus::NoRule),
        Some(reference) => {
            let price_diff = line
                .declared_unit_price
                .checked_sub(reference)
                .ok_or_else(|| overflow("precunidad - reference price"))?;
            let amount_diff = line
                .declared_amount
                .checked_sub(computed_amount)
                .ok_or_else(|| overflow("importe - computed amount"))?;
            let price_ok = price_diff.abs() <= tolerances.price;
            let amount_ok = amount_diff.abs() <= tolerances.amount;
            let status = if price_ok && amount_ok {
                LineStatus::Ok
            } else {
                LineStatus::Error
            };
            (Some(price_ok), Some(amount_ok), status)
        }
    };

    Ok(LineResult {
        code: line.code.clone(),
        description: line.description.clone(),
        quantity: line.quantity,
        declared_unit_price: line.declared_unit_price,
        reference_unit_price: reference,
        price_matches,
        declared_amount: line.declared_amount,
        computed_amount,
        amount_matches,
        status,
    })
}

/// Build the invoice summary from line results.
pub fn summarize(header: &CompleteHeader, results: &[LineResult]) -> InvoiceSummary {
    let error_count = results
        .iter()
        .filter(|r| r.status == LineStatus::Error)
        .count();
    let no_rule_count = results
        .iter()
        .filter(|r| r.status == LineStatus::NoRule)
        .count();

    InvoiceSummary {
        tariff_class: header.tariff_class().to_string(),
        supply_point_id: header.supply_point_id().map(str::to_string),
        declared_total_amount: header.total_amount(),
        declared_lines_total: results
            .iter()
            .try_fold(Decimal::ZERO, |total, r| total.checked_add(r.declared_amount)),
        line_count: results.len(),
        error_count,
        no_rule_count,
        overall_status: if error_count == 0 {
            OverallStatus::Ok
        } else {
            OverallStatus::Ko
        },
    }
}
