use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::columns;
use crate::naming::{NameTaxonomy, DEFAULT_EXTENSION, DEFAULT_NAME_PATTERN};
use crate::price::DEFAULT_TOLERANCE;
use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "orders".into()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            input: InputConfig::default(),
            checks: ChecksConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_pattern")]
    pub file_name_pattern: String,
}

fn default_delimiter() -> String {
    "|".into()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.into()
}

fn default_pattern() -> String {
    DEFAULT_NAME_PATTERN.into()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            extension: default_extension(),
            file_name_pattern: default_pattern(),
        }
    }
}

impl InputConfig {
    /// Delimiter as the single byte the CSV reader needs.
    pub fn delimiter_byte(&self) -> Result<u8, ReconError> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ReconError::ConfigValidation(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChecksConfig {
    #[serde(default = "default_business_key")]
    pub business_key: Vec<String>,
    #[serde(default = "default_context_key")]
    pub context_key: Vec<String>,
    #[serde(default = "default_tolerance")]
    pub price_tolerance: f64,
}

pub fn default_business_key() -> Vec<String> {
    use columns::*;
    [
        ORDER_ID, PRODUCT_ID, CUSTOMER_ID, ORDER_DATE, SHIP_DATE, COUNTRY, SALES, QUANTITY,
        DISCOUNT, PROFIT,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

pub fn default_context_key() -> Vec<String> {
    use columns::*;
    [
        PRODUCT_ID, SHIP_MODE, CUSTOMER_ID, CUSTOMER_NAME, SEGMENT, COUNTRY, CITY, STATE,
        POSTAL_CODE, REGION,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            business_key: default_business_key(),
            context_key: default_context_key(),
            price_tolerance: default_tolerance(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_report")]
    pub report: String,
    #[serde(default = "default_marts_dir")]
    pub marts_dir: String,
    #[serde(default = "default_mart_counts")]
    pub mart_counts: String,
    #[serde(default = "default_archive")]
    pub archive: String,
    #[serde(default = "default_review")]
    pub review: String,
}

fn default_report() -> String {
    "Inconsistencies_Analysis.xlsx".into()
}

fn default_marts_dir() -> String {
    "data_marts".into()
}

fn default_mart_counts() -> String {
    "Data_Marts_Rows.csv".into()
}

fn default_archive() -> String {
    "Data_Marts.zip".into()
}

fn default_review() -> String {
    "inconsistencies_to_review.csv".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report: default_report(),
            marts_dir: default_marts_dir(),
            mart_counts: default_mart_counts(),
            archive: default_archive(),
            review: default_review(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate(&Schema::canonical())?;
        Ok(config)
    }

    pub fn validate(&self, schema: &Schema) -> Result<(), ReconError> {
        self.input.delimiter_byte()?;
        self.name_taxonomy()?;

        if self.input.extension.is_empty() {
            return Err(ReconError::ConfigValidation("input.extension must not be empty".into()));
        }

        let tol = self.checks.price_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "checks.price_tolerance must be a non-negative number, got {tol}"
            )));
        }

        for (label, key) in [
            ("business_key", &self.checks.business_key),
            ("context_key", &self.checks.context_key),
        ] {
            if key.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "checks.{label} must name at least one column"
                )));
            }
            if let Some(unknown) = key.iter().find(|c| !schema.contains(c)) {
                return Err(ReconError::ConfigValidation(format!(
                    "checks.{label}: unknown column '{unknown}'"
                )));
            }
        }

        let out = &self.output;
        for (label, value) in [
            ("report", &out.report),
            ("marts_dir", &out.marts_dir),
            ("mart_counts", &out.mart_counts),
            ("archive", &out.archive),
            ("review", &out.review),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "output.{label} must not be empty"
                )));
            }
        }

        Ok(())
    }

    pub fn name_taxonomy(&self) -> Result<NameTaxonomy, ReconError> {
        NameTaxonomy::new(&self.input.file_name_pattern)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
