use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use peajes::core::{OverallStatus, RowSelector, RuleTable, ValidationOutput, ValidatorConfig};
use peajes::{Validator, report};

#[derive(Parser)]
#[command(name = "peajes")]
#[command(about = "Validate invoice concept lines against regulated BOE tolls")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one invoice XML.
    Validate {
        #[arg(long)]
        invoice: PathBuf,
        /// Reference workbook; falls back to the configured one.
        #[arg(long, env = "PEAJES_REFERENCE")]
        reference: Option<PathBuf>,
        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// List the regulated concept rules.
    Rules,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli.command) {
        Ok(OverallStatus::Ok) => ExitCode::SUCCESS,
        Ok(OverallStatus::Ko) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn run(command: Commands) -> Result<OverallStatus> {
    match command {
        Commands::Validate {
            invoice,
            reference,
            config,
            namespace,
            format,
        } => {
            let mut cfg = match &config {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("reading config {}", path.display()))?;
                    ValidatorConfig::from_toml(&text)?
                }
                None => ValidatorConfig::default(),
            }
            .with_env_overrides()?;
            if let Some(ns) = namespace {
                cfg.namespace = ns;
            }
            if let Some(reference) = reference {
                cfg.reference_path = Some(reference);
            }
            if cfg.reference_path.is_none() {
                bail!("no reference workbook given (--reference or reference_path in config)");
            }

            let output = Validator::new(cfg)
                .validate_with_configured_reference(&invoice)
                .with_context(|| format!("validating {}", invoice.display()))?;

            match format {
                Format::Table => print_table(&output),
                Format::Csv => print!("{}", report::to_csv(&output)?),
                Format::Json => println!("{}", report::to_json(&output)?),
            }
            Ok(output.summary.overall_status)
        }
        Commands::Rules => {
            print_rules(&RuleTable::regulated());
            Ok(OverallStatus::Ok)
        }
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn print_table(output: &ValidationOutput) {
    let s = &output.summary;
    println!("tipopeaje:    {}", s.tariff_class);
    println!("cups:         {}", opt(s.supply_point_id.as_deref()));
    println!("importetotal: {}", opt(s.declared_total_amount));
    println!(
        "conceptos:    {} ({} error, {} sin regla)",
        s.line_count, s.error_count, s.no_rule_count
    );
    println!("estado:       {}", s.overall_status);
    println!();
    println!(
        "{:<6} {:<30} {:>12} {:>12} {:>12} {:>12} {:>12}  {}",
        "cod", "concepto", "unidad", "prec_xml", "prec_boe", "importe", "calculado", "estado"
    );
    for l in &output.lines {
        let mut desc = l.description.clone().unwrap_or_default();
        if desc.chars().count() > 30 {
            desc = desc.chars().take(29).collect::<String>() + "…";
        }
        println!(
            "{:<6} {:<30} {:>12} {:>12} {:>12} {:>12} {:>12}  {}",
            l.code,
            desc,
            l.quantity.normalize(),
            l.declared_unit_price.normalize(),
            opt(l.reference_unit_price.map(|p| p.normalize())),
            l.declared_amount.normalize(),
            l.computed_amount,
            l.status
        );
    }
}

fn print_rules(rules: &RuleTable) {
    for rule in rules.iter() {
        let rows = match &rule.rows {
            RowSelector::ByTariffClass { key_column } => format!("{key_column} = tipopeaje"),
            RowSelector::First => "first row".to_string(),
        };
        println!(
            "{}  {:<22} {:<18} {}",
            rule.code,
            rule.sheet.sheet_name(),
            rows,
            rule.columns.join(" | ")
        );
    }
}
