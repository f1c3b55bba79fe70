use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::PeajesError;
use super::types::Tolerances;

/// Default namespace of the `<factura>` document.
pub const DEFAULT_NAMESPACE: &str = "http://localhost/sctd/B7031";

/// Validator settings.
///
/// ```toml
/// namespace = "http://localhost/sctd/B7031"
/// reference_path = "data/tablas.xlsx"
///
/// [tolerance]
/// price = "0.000001"
/// amount = "0.01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub tolerance: Tolerances,
    /// Reference workbook used when the caller does not pass one.
    #[serde(default)]
    pub reference_path: Option<PathBuf>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            tolerance: Tolerances::default(),
            reference_path: None,
        }
    }
}

impl ValidatorConfig {
    pub fn from_toml(input: &str) -> Result<Self, PeajesError> {
        let config: ValidatorConfig =
            toml::from_str(input).map_err(|e| PeajesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PEAJES_NAMESPACE`, `PEAJES_TOL_PRICE`, `PEAJES_TOL_AMOUNT` and
    /// `PEAJES_REFERENCE` when set.
    pub fn with_env_overrides(self) -> Result<Self, PeajesError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env_overrides`](Self::with_env_overrides) with an
    /// arbitrary variable source.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PeajesError> {
        if let Some(ns) = lookup("PEAJES_NAMESPACE") {
            self.namespace = ns;
        }
        if let Some(v) = lookup("PEAJES_TOL_PRICE") {
            self.tolerance.price = parse_tolerance("PEAJES_TOL_PRICE", &v)?;
        }
        if let Some(v) = lookup("PEAJES_TOL_AMOUNT") {
            self.tolerance.amount = parse_tolerance("PEAJES_TOL_AMOUNT", &v)?;
        }
        if let Some(p) = lookup("PEAJES_REFERENCE") {
            self.reference_path = Some(PathBuf::from(p));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), PeajesError> {
        if self.namespace.trim().is_empty() {
            return Err(PeajesError::Config("namespace must not be empty".into()));
        }
        if self.tolerance.price.is_sign_negative() {
            return Err(PeajesError::Config(format!(
                "price tolerance must not be negative, got {}",
                self.tolerance.price
            )));
        }
        if self.tolerance.amount.is_sign_negative() {
            return Err(PeajesError::Config(format!(
                "amount tolerance must not be negative, got {}",
                self.tolerance.amount
            )));
        }
        Ok(())
    }
}

fn parse_tolerance(key: &str, value: &str) -> Result<Decimal, PeajesError> {
    let v = value.trim();
    Decimal::from_str(v)
        .or_else(|_| Decimal::from_scientific(v))
        .map_err(|_| PeajesError::Config(format!("{key}: '{value}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ValidatorConfig::from_toml("").unwrap();
        assert_eq!(config, ValidatorConfig::default());
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn toml_overrides_fields() {
        let config = ValidatorConfig::from_toml(
            r#"
namespace = "urn:example:factura"
reference_path = "data/tablas.xlsx"

[tolerance]
price = "0.0001"
"#,
        )
        .unwrap();
        assert_eq!(config.namespace, "urn:example:factura");
        assert_eq!(config.tolerance.price, dec!(0.0001));
        assert_eq!(config.tolerance.amount, dec!(0.01));
        assert_eq!(config.reference_path, Some(PathBuf::from("data/tablas.xlsx")));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let err = ValidatorConfig::from_toml("[tolerance]\namount = \"-0.01\"").unwrap_err();
        assert!(matches!(err, PeajesError::Config(_)));
    }

    #[test]
    fn bad_toml_rejected() {
        assert!(matches!(
            ValidatorConfig::from_toml("namespace = "),
            Err(PeajesError::Config(_))
        ));
    }

    #[test]
    fn overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PEAJES_TOL_AMOUNT", "0.05"),
            ("PEAJES_TOL_PRICE", "1e-4"),
            ("PEAJES_REFERENCE", "/srv/boe.xlsx"),
        ]
        .into_iter()
        .collect();
        let config = ValidatorConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.tolerance.amount, dec!(0.05));
        assert_eq!(config.tolerance.price, dec!(0.0001));
        assert_eq!(config.reference_path, Some(PathBuf::from("/srv/boe.xlsx")));
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn unparseable_override_rejected() {
        let err = ValidatorConfig::default()
            .with_overrides(|k| (k == "PEAJES_TOL_PRICE").then(|| "tiny".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PEAJES_TOL_PRICE"));
    }
}
