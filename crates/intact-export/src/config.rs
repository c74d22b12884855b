//! Export configuration
//!
//! Loaded from `EXPORT_*` environment variables. A named rule set picks the
//! filter flags, individual variables then override them.

use crate::chunk::DEFAULT_LARGE_SCALE_THRESHOLD;
use crate::cluster::DEFAULT_CLUSTER_CHUNK_SIZE;
use crate::error::{ExportError, Result};
use crate::filter::FilterConfig;
use crate::lines::{FormatVersion, LineFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Score below which the `mi-score` rule excludes an interaction
pub const DEFAULT_MI_SCORE_THRESHOLD: f64 = 0.6;

pub const DEFAULT_ASSIGNED_BY: &str = "IntAct";

/// Named filter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExportRule {
    /// Drop spoke-expanded and non-UniProt interactions
    #[default]
    Default,
    /// Drop non-UniProt interactions and those scoring below the MI-score threshold
    MiScore,
    /// Export everything resolvable
    All,
}

impl ExportRule {
    pub fn filter_config(&self) -> FilterConfig {
        match self {
            ExportRule::Default => FilterConfig {
                exclude_spoke_expanded: true,
                exclude_non_uniprot_interactors: true,
                ..FilterConfig::default()
            },
            ExportRule::MiScore => FilterConfig {
                exclude_non_uniprot_interactors: true,
                exclude_low_confidence: true,
                confidence_threshold: Some(DEFAULT_MI_SCORE_THRESHOLD),
                ..FilterConfig::default()
            },
            ExportRule::All => FilterConfig::default(),
        }
    }
}

impl FromStr for ExportRule {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ExportRule::Default),
            "mi-score" | "mi_score" | "miscore" => Ok(ExportRule::MiScore),
            "all" => Ok(ExportRule::All),
            _ => Err(ExportError::Config(format!("Unknown export rule: {}", s))),
        }
    }
}

impl fmt::Display for ExportRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportRule::Default => f.write_str("default"),
            ExportRule::MiScore => f.write_str("mi-score"),
            ExportRule::All => f.write_str("all"),
        }
    }
}

/// Configuration of one export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub rule: ExportRule,
    pub filter: FilterConfig,
    pub cc_version: FormatVersion,
    pub go_version: FormatVersion,
    pub gpi_version: FormatVersion,
    /// Raw interactions clustered per parallel batch
    pub cluster_chunk_size: usize,
    /// Maximum interactions per chunked publication file
    pub large_scale_threshold: usize,
    /// Value of the assigned-by and generated-by columns
    pub assigned_by: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::for_rule(ExportRule::Default)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ExportError::Config(format!("Invalid value for {}: {} ({})", name, value, e)))
}

impl ExportConfig {
    pub fn for_rule(rule: ExportRule) -> Self {
        Self {
            rule,
            filter: rule.filter_config(),
            cc_version: FormatVersion::V1,
            go_version: FormatVersion::V1,
            gpi_version: FormatVersion::V1,
            cluster_chunk_size: DEFAULT_CLUSTER_CHUNK_SIZE,
            large_scale_threshold: DEFAULT_LARGE_SCALE_THRESHOLD,
            assigned_by: DEFAULT_ASSIGNED_BY.to_string(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rule = match lookup("EXPORT_RULE") {
            Some(value) => value.parse()?,
            None => ExportRule::default(),
        };
        let mut config = Self::for_rule(rule);

        if let Some(value) = lookup("EXPORT_EXCLUDE_SPOKE") {
            config.filter.exclude_spoke_expanded = parse_var("EXPORT_EXCLUDE_SPOKE", &value)?;
        }
        if let Some(value) = lookup("EXPORT_EXCLUDE_NON_UNIPROT") {
            config.filter.exclude_non_uniprot_interactors = parse_var("EXPORT_EXCLUDE_NON_UNIPROT", &value)?;
        }
        if let Some(value) = lookup("EXPORT_EXCLUDE_NEGATIVE") {
            config.filter.exclude_negative = parse_var("EXPORT_EXCLUDE_NEGATIVE", &value)?;
        }
        if let Some(value) = lookup("EXPORT_EXCLUDE_LOW_CONFIDENCE") {
            config.filter.exclude_low_confidence = parse_var("EXPORT_EXCLUDE_LOW_CONFIDENCE", &value)?;
        }
        if let Some(value) = lookup("EXPORT_CONFIDENCE_THRESHOLD") {
            config.filter.confidence_threshold = if value.trim().is_empty() {
                None
            } else {
                Some(parse_var("EXPORT_CONFIDENCE_THRESHOLD", &value)?)
            };
        }
        if let Some(value) = lookup("EXPORT_DETECTION_METHODS") {
            let methods: BTreeSet<String> = value
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            config.filter.allowed_detection_methods = Some(methods);
        }

        if let Some(value) = lookup("EXPORT_CC_VERSION") {
            config.cc_version = value.parse()?;
        }
        if let Some(value) = lookup("EXPORT_GO_VERSION") {
            config.go_version = value.parse()?;
        }
        if let Some(value) = lookup("EXPORT_GPI_VERSION") {
            config.gpi_version = value.parse()?;
        }
        if let Some(value) = lookup("EXPORT_CLUSTER_CHUNK_SIZE") {
            config.cluster_chunk_size = parse_var("EXPORT_CLUSTER_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = lookup("EXPORT_LARGE_SCALE_THRESHOLD") {
            config.large_scale_threshold = parse_var("EXPORT_LARGE_SCALE_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("EXPORT_ASSIGNED_BY") {
            config.assigned_by = value.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Version each line format is rendered in
    pub fn version_of(&self, format: LineFormat) -> FormatVersion {
        match format {
            LineFormat::Cc => self.cc_version,
            LineFormat::Dr => FormatVersion::V1,
            LineFormat::Go => self.go_version,
            LineFormat::Gpi => self.gpi_version,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;

        for format in LineFormat::ALL {
            let version = self.version_of(format);
            if !format.supports(version) {
                return Err(ExportError::Config(format!(
                    "{} output does not support version {}",
                    format, version
                )));
            }
        }
        if self.cluster_chunk_size == 0 {
            return Err(ExportError::Config(
                "EXPORT_CLUSTER_CHUNK_SIZE must be greater than 0".to_string(),
            ));
        }
        if self.large_scale_threshold == 0 {
            return Err(ExportError::Config(
                "EXPORT_LARGE_SCALE_THRESHOLD must be greater than 0".to_string(),
            ));
        }
        if self.assigned_by.is_empty() {
            return Err(ExportError::Config("EXPORT_ASSIGNED_BY must not be empty".to_string()));
        }
        Ok(())
    }
}
