use crate::error::{GeoflowError, Result};
use crate::parser::TransactionReader;
use crate::rules::{default_rules, PostalRule, RuleTable};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory by `PipelineConfig::discover`
pub const DEFAULT_CONFIG_FILE: &str = "geoflow.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub reference_path: PathBuf,
    pub reference_delimiter: char,
    pub input_delimiter: char,
    pub include_passthrough_fields: bool,
    pub null_markers: Vec<String>,
    pub output_suffix: String,
    pub postal_rules: Vec<PostalRule>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            reference_path: PathBuf::from("data/allcountries_zip_to_latlong.txt"),
            reference_delimiter: '\t',
            input_delimiter: ',',
            include_passthrough_fields: false,
            // "NA" is left out on purpose: it is Namibia's country code
            null_markers: ["NULL", "null", "NaN", "nan", "N/A", "n/a", "None"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_suffix: "_latlong.json".to_string(),
            postal_rules: default_rules(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeoflowError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `geoflow.toml` from the working directory if present, defaults otherwise
    pub fn discover() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        self.reference_delimiter_byte()?;
        self.input_delimiter_byte()?;
        Ok(())
    }

    pub fn reference_delimiter_byte(&self) -> Result<u8> {
        delimiter_byte("reference_delimiter", self.reference_delimiter)
    }

    pub fn input_delimiter_byte(&self) -> Result<u8> {
        delimiter_byte("input_delimiter", self.input_delimiter)
    }

    pub fn rule_table(&self) -> RuleTable {
        RuleTable::from_rules(self.postal_rules.clone())
    }

    pub fn transaction_reader(&self) -> Result<TransactionReader> {
        Ok(TransactionReader::new(
            self.input_delimiter_byte()?,
            self.include_passthrough_fields,
            self.null_markers.clone(),
        ))
    }

    /// Artifact path for an output base name, e.g. `data/txns` → `data/txns_latlong.json`
    pub fn output_path(&self, out_base: &Path) -> PathBuf {
        let mut name = out_base.as_os_str().to_os_string();
        name.push(&self.output_suffix);
        PathBuf::from(name)
    }
}

fn delimiter_byte(field: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(GeoflowError::Config(format!(
            "{} must be a single ASCII character, got {:?}",
            field, c
        )))
    }
}
