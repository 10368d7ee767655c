//! Configuration management for AuthorMatch
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! The `similarity` and `neighbor` sections select which formula variant is
//! active. The variants are observably different algorithms over the same
//! data, so none of them is treated as canonical.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input, cache and output locations
    pub paths: PathsConfig,

    /// Year normalization bounds
    pub years: YearConfig,

    /// Feature similarity variant selection
    pub similarity: SimilarityConfig,

    /// Neighbor fallback settings
    pub neighbor: NeighborConfig,

    /// Batch pipeline switches
    pub pipeline: PipelineConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the raw CSV tables
    pub data_dir: PathBuf,

    /// Root of the artifact cache
    pub cache_dir: PathBuf,

    /// Directory receiving feature and neighbor files
    pub output_dir: PathBuf,

    /// Directory receiving the compacted raw tables
    pub compact_dir: PathBuf,

    /// Optional newline-separated stop-word list (built-in English list otherwise)
    pub stop_words_file: Option<PathBuf>,

    pub author_file: String,
    pub paper_file: String,
    pub conference_file: String,
    pub journal_file: String,
    pub paper_author_file: String,
    pub train_file: String,
    pub valid_file: String,
    pub valid_solution_file: String,
    pub test_file: String,

    /// Train-format file derived from the validation tables
    pub valid_to_train_file: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct YearConfig {
    /// Year mapped to 0.0
    pub min_year: i32,

    /// Year mapped to 1.0
    pub max_year: i32,
}

/// String distance formula
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StringMetric {
    /// 0.5*jaro + 0.25*(1 - lev/norm) + 0.25*(1 - damerau/norm)
    Weighted,
    /// Weighted with truncating integer division of the edit ratios
    WeightedFloor,
    /// 0.5*jaro + 0.5*(1/lev + 1/damerau), bonus of 1 on exact edit match
    DivisionSafe,
}

/// Sparse vector distance over publish-count profiles
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VectorMetric {
    /// Dimensions present on either side contribute
    BothSides,
    /// Only dimensions present on both sides contribute
    Overlap,
}

/// Author-pair components
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorFields {
    PublishCount,
    PublishCountAffiliation,
}

/// Paper-pair components
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaperFields {
    TitleVenue,
    TitleVenueKeywords,
}

/// Denominator used when averaging over a candidate list
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeanPolicy {
    /// Divide each component by the number of nonzero contributions to it
    NonZeroContributions,
    /// Divide every component by the candidate count
    AllCandidates,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Metric for title, venue, keyword and affiliation strings
    pub string_metric: StringMetric,

    /// Metric for the author publish-count profile
    pub profile_metric: VectorMetric,

    pub author_fields: AuthorFields,
    pub paper_fields: PaperFields,
    pub mean_policy: MeanPolicy,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NeighborConfig {
    /// Number of neighbors reported per query author
    pub k: usize,

    /// Metric for the affiliation component
    pub string_metric: StringMetric,

    pub affiliation_weight: f64,
    pub year_weight: f64,
    pub count_weight: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the independent population steps on worker tasks
    pub parallel_population: bool,

    /// Drop label ids absent from the paper table, and label rows of
    /// authors absent from the PaperAuthor table
    pub filter_labels: bool,

    /// Append a timestamp to output file names
    pub timestamp_outputs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (debug, info, warn, error or an EnvFilter directive)
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    pub metrics_port: u16,

    /// Service name attached to logs
    pub service_name: String,
}

// Default value functions
fn default_data_dir() -> PathBuf { PathBuf::from("original_data") }
fn default_cache_dir() -> PathBuf { PathBuf::from("pickles") }
fn default_output_dir() -> PathBuf { PathBuf::from("preprocess") }
fn default_compact_dir() -> PathBuf { PathBuf::from("compressed_data") }
fn default_min_year() -> i32 { 1900 }
fn default_max_year() -> i32 { 2013 }
fn default_neighbor_k() -> usize { 5 }
fn default_neighbor_weight() -> f64 { 0.33 }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "authormatch".to_string() }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            output_dir: default_output_dir(),
            compact_dir: default_compact_dir(),
            stop_words_file: None,
            author_file: "Author.csv".to_string(),
            paper_file: "Paper.csv".to_string(),
            conference_file: "Conference.csv".to_string(),
            journal_file: "Journal.csv".to_string(),
            paper_author_file: "PaperAuthor.csv".to_string(),
            train_file: "Train.csv".to_string(),
            valid_file: "Valid.csv".to_string(),
            valid_solution_file: "ValidSolution.csv".to_string(),
            test_file: "Test.csv".to_string(),
            valid_to_train_file: "ValidToTrain.csv".to_string(),
        }
    }
}

impl Default for YearConfig {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            string_metric: StringMetric::Weighted,
            profile_metric: VectorMetric::Overlap,
            author_fields: AuthorFields::PublishCount,
            paper_fields: PaperFields::TitleVenue,
            mean_policy: MeanPolicy::NonZeroContributions,
        }
    }
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            k: default_neighbor_k(),
            string_metric: StringMetric::DivisionSafe,
            affiliation_weight: default_neighbor_weight(),
            year_weight: default_neighbor_weight(),
            count_weight: default_neighbor_weight(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_population: false,
            filter_labels: false,
            timestamp_outputs: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_port: 0,
            service_name: default_service_name(),
        }
    }
}

impl PathsConfig {
    /// Resolve a raw table file name against the data directory
    pub fn input(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__NEIGHBOR__K=10
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make normalization or ranking meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.min_year >= self.years.max_year {
            return Err(ConfigError::Message(format!(
                "years.min_year ({}) must be below years.max_year ({})",
                self.years.min_year, self.years.max_year
            )));
        }
        if self.neighbor.k == 0 {
            return Err(ConfigError::Message("neighbor.k must be at least 1".to_string()));
        }
        let weights = [
            self.neighbor.affiliation_weight,
            self.neighbor.year_weight,
            self.neighbor.count_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Message(
                "neighbor weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.years.min_year, 1900);
        assert_eq!(config.years.max_year, 2013);
        assert_eq!(config.neighbor.k, 5);
        assert_eq!(config.neighbor.string_metric, StringMetric::DivisionSafe);
        assert_eq!(config.similarity.mean_policy, MeanPolicy::NonZeroContributions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_input_paths() {
        let config = AppConfig::default();
        assert_eq!(
            config.paths.input(&config.paths.paper_file),
            PathBuf::from("original_data/Paper.csv")
        );
    }

    #[test]
    fn test_invalid_year_bounds() {
        let mut config = AppConfig::default();
        config.years.min_year = 2013;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_overrides_variant() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[similarity]\n\
             string_metric = \"division_safe\"\n\
             paper_fields = \"title_venue_keywords\"\n\n\
             [neighbor]\n\
             k = 3"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.similarity.string_metric, StringMetric::DivisionSafe);
        assert_eq!(config.similarity.paper_fields, PaperFields::TitleVenueKeywords);
        assert_eq!(config.similarity.author_fields, AuthorFields::PublishCount);
        assert_eq!(config.neighbor.k, 3);
        assert_eq!(config.paths.paper_file, "Paper.csv");
    }
}
