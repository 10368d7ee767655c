//! Batch pipeline
//!
//! Sequences catalog population, label-file passes and neighbor search
//! for the `features` binary, plus the table-level commands (compaction,
//! validation conversion, CSV merging) that need no catalog.

use crate::errors::{FeatureError, Result};
use crate::merge::merge_csv;
use crate::output::{feature_header, FeatureWriter, NeighborWriter};
use crate::processor::{emit_neighbors, FeatureEmitter};
use crate::validation::{build_validation_training, write_train_csv};
use authormatch_common::catalog::loader::{read_query_rows, read_train_rows};
use authormatch_common::catalog::{compact_tables, Catalog, LabelList, LabelSets};
use authormatch_common::metrics::StageTimer;
use authormatch_common::{AppConfig, ArtifactCache, CatalogLoader};
use authormatch_similarity::compare::AggregateComparator;
use authormatch_similarity::neighbor::NeighborMatcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Label sets persisted after a training pass
pub const TRAIN_ARTIFACT: &str = "train";

pub const TRAIN_OUTPUT: &str = "preprocess.csv";
pub const TEST_OUTPUT: &str = "preprocess_test.csv";
pub const VALID_OUTPUT: &str = "preprocess_valid.csv";

/// Driver command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Training pass, then test features and neighbor search concurrently
    Run,
    Train,
    Test,
    Valid,
    /// Neighbor search over a query file (Test by default)
    Neighbors { queries: Option<String> },
    /// Write compacted copies of the raw tables
    Compact,
    /// Write the ValidToTrain table
    SplitValid,
    Merge { inputs: Vec<PathBuf>, dest: PathBuf },
}

impl Command {
    /// Parse the arguments following the program name
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Some((mode, rest)) = args.split_first() else {
            return Ok(Command::Run);
        };

        let command = match (mode.as_str(), rest) {
            ("run", []) => Command::Run,
            ("train", []) => Command::Train,
            ("test", []) => Command::Test,
            ("valid", []) => Command::Valid,
            ("neighbors", []) => Command::Neighbors { queries: None },
            ("neighbors", [file]) => Command::Neighbors {
                queries: Some(file.clone()),
            },
            ("compact", []) => Command::Compact,
            ("split-valid", []) => Command::SplitValid,
            ("merge", [inputs @ .., dest]) if !inputs.is_empty() => Command::Merge {
                inputs: inputs.iter().map(PathBuf::from).collect(),
                dest: PathBuf::from(dest),
            },
            _ => {
                return Err(FeatureError::Usage(format!(
                    "unrecognized arguments: {}\n{}",
                    args.join(" "),
                    USAGE
                )))
            }
        };

        Ok(command)
    }
}

pub const USAGE: &str = "usage: features \
    [run | train | test | valid | neighbors [query-file] | compact | split-valid \
    | merge <in...> <out>]";

/// Output name of a neighbor pass over `queries`, e.g. `Test.csv` ->
/// `preprocess_testfull.csv`
pub fn neighbor_output(queries: &str) -> String {
    let stem = Path::new(queries)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    format!("preprocess_{}full.csv", stem)
}

/// Execute one command
pub async fn execute(config: AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Compact => {
            compact_tables(&config.paths, config.years)?;
        }
        Command::SplitValid => {
            split_valid(&config)?;
        }
        Command::Merge { inputs, dest } => {
            merge_csv(&inputs, &dest)?;
        }
        command => {
            let pipeline = Pipeline::prepare(config).await?;
            match command {
                Command::Run => {
                    pipeline.run().await?;
                }
                Command::Train => {
                    pipeline.train()?;
                }
                Command::Test => {
                    let file = pipeline.config.paths.test_file.clone();
                    pipeline.unknown_pass("test", &file, TEST_OUTPUT)?;
                }
                Command::Valid => {
                    let file = pipeline.config.paths.valid_file.clone();
                    pipeline.unknown_pass("valid", &file, VALID_OUTPUT)?;
                }
                Command::Neighbors { queries } => {
                    let labels = pipeline.labels()?;
                    let file = queries.unwrap_or_else(|| pipeline.config.paths.test_file.clone());
                    pipeline.neighbors(&labels, &file)?;
                }
                Command::Compact | Command::SplitValid | Command::Merge { .. } => {}
            }
        }
    }

    Ok(())
}

/// Build the ValidToTrain table from ValidSolution and Valid
#[instrument(skip_all)]
pub fn split_valid(config: &AppConfig) -> Result<PathBuf> {
    let paths = &config.paths;
    let solution = read_query_rows(&paths.input(&paths.valid_solution_file), "valid_solution")?;
    let valid = read_query_rows(&paths.input(&paths.valid_file), "valid")?;

    let rows = build_validation_training(&solution, &valid);
    let dest = paths.input(&paths.valid_to_train_file);
    write_train_csv(&dest, &rows)?;

    Ok(dest)
}

/// Populated catalog plus everything a pass needs
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<AppConfig>,
    catalog: Arc<Catalog>,
    cache: ArtifactCache,

    /// Suffix appended to output file names
    stamp: Option<String>,
}

impl Pipeline {
    /// Populate the catalog and prepare the output directory
    pub async fn prepare(config: AppConfig) -> Result<Self> {
        let loader = CatalogLoader::from_config(&config)?;
        let catalog = loader.populate().await?;
        let cache = loader.cache().clone();

        std::fs::create_dir_all(&config.paths.output_dir)
            .map_err(|e| FeatureError::output(&config.paths.output_dir, e))?;

        let stamp = config
            .pipeline
            .timestamp_outputs
            .then(|| chrono::Local::now().format("%Y%m%d%H%M%S").to_string());

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            cache,
            stamp,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Output file path, with the run timestamp when enabled
    pub fn output_path(&self, name: &str) -> PathBuf {
        let file = match &self.stamp {
            Some(stamp) => format!("{}.{}", name, stamp),
            None => name.to_string(),
        };
        self.config.paths.output_dir.join(file)
    }

    fn emitter(&self) -> FeatureEmitter<'_> {
        FeatureEmitter::new(
            &self.catalog,
            AggregateComparator::new(self.config.similarity),
            self.config.pipeline.filter_labels,
        )
    }

    /// Training pass over the Train table; persists the label sets
    pub fn train(&self) -> Result<LabelSets> {
        let timer = StageTimer::start("train");
        let paths = &self.config.paths;
        let rows = read_train_rows(&paths.input(&paths.train_file))?;

        let emitter = self.emitter();
        let mut writer = FeatureWriter::create(
            self.output_path(TRAIN_OUTPUT),
            &feature_header(emitter.comparator()),
        )?;
        let mut labels = LabelSets::new();
        emitter.emit_training("train", rows, &mut labels, &mut writer)?;

        let path = writer.path().to_path_buf();
        let written = writer.finish()?;
        self.cache.store(TRAIN_ARTIFACT, &labels)?;

        timer.finish();
        info!(
            path = %path.display(),
            rows = written,
            labeled = labels.labeled_count(),
            "Training features written"
        );
        Ok(labels)
    }

    /// Label sets from the last training pass, training first when absent
    pub fn labels(&self) -> Result<LabelSets> {
        match self.cache.get::<LabelSets>(TRAIN_ARTIFACT)? {
            Some(labels) => {
                info!(labeled = labels.labeled_count(), "Reusing stored training labels");
                Ok(labels)
            }
            None => self.train(),
        }
    }

    /// Unknown-label pass over a Valid or Test table
    pub fn unknown_pass(&self, pass: &'static str, file: &str, output: &str) -> Result<LabelList> {
        let timer = StageTimer::start(pass);
        let rows = read_query_rows(&self.config.paths.input(file), pass)?;

        let emitter = self.emitter();
        let mut writer =
            FeatureWriter::create(self.output_path(output), &feature_header(emitter.comparator()))?;
        let mut unknown = LabelList::new();
        emitter.emit_unknown(pass, rows, &mut unknown, &mut writer)?;

        let path = writer.path().to_path_buf();
        let written = writer.finish()?;

        timer.finish();
        info!(path = %path.display(), rows = written, "Unknown-label features written");
        Ok(unknown)
    }

    /// Neighbor search for every author in a query table
    pub fn neighbors(&self, labels: &LabelSets, file: &str) -> Result<usize> {
        let timer = StageTimer::start("neighbors");
        let rows = read_query_rows(&self.config.paths.input(file), "neighbors")?;

        let matcher = NeighborMatcher::new(self.config.neighbor);
        let mut writer = NeighborWriter::create(
            self.output_path(&neighbor_output(file)),
            self.config.neighbor.k,
        )?;
        let queries = emit_neighbors(
            &self.catalog,
            labels,
            &matcher,
            rows,
            self.config.pipeline.filter_labels,
            &mut writer,
        )?;
        writer.finish()?;

        timer.finish();
        Ok(queries)
    }

    /// Training pass, then the test pass and neighbor search side by side
    ///
    /// Both concurrent tasks only read the catalog and the training labels;
    /// the test task's unknown list is merged in after the join.
    pub async fn run(&self) -> Result<LabelSets> {
        let labels = Arc::new(self.train()?);
        let test_file = self.config.paths.test_file.clone();

        let test = {
            let pipeline = self.clone();
            let file = test_file.clone();
            tokio::task::spawn_blocking(move || pipeline.unknown_pass("test", &file, TEST_OUTPUT))
        };
        let neighbors = {
            let pipeline = self.clone();
            let labels = Arc::clone(&labels);
            tokio::task::spawn_blocking(move || pipeline.neighbors(&labels, &test_file))
        };

        let (unknown, queries) = tokio::try_join!(test, neighbors)?;
        let unknown = unknown?;
        let queries = queries?;

        let mut labels = Arc::try_unwrap(labels).unwrap_or_else(|shared| (*shared).clone());
        labels.extend_unknown(unknown);

        info!(queries, labeled = labels.labeled_count(), "Run complete");
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(Vec::<String>::new()).unwrap(), Command::Run);
        assert_eq!(Command::parse(["train"]).unwrap(), Command::Train);
        assert_eq!(Command::parse(["compact"]).unwrap(), Command::Compact);
        assert_eq!(
            Command::parse(["neighbors", "Valid.csv"]).unwrap(),
            Command::Neighbors {
                queries: Some("Valid.csv".to_string())
            }
        );
        assert_eq!(
            Command::parse(["merge", "a.csv", "b.csv", "out.csv"]).unwrap(),
            Command::Merge {
                inputs: vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")],
                dest: PathBuf::from("out.csv"),
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_usage() {
        assert!(matches!(Command::parse(["merge", "out.csv"]), Err(FeatureError::Usage(_))));
        assert!(matches!(Command::parse(["train", "extra"]), Err(FeatureError::Usage(_))));
        assert!(matches!(Command::parse(["compact", "x"]), Err(FeatureError::Usage(_))));
        assert!(matches!(Command::parse(["bogus"]), Err(FeatureError::Usage(_))));
    }

    #[test]
    fn test_neighbor_output_names() {
        assert_eq!(neighbor_output("Test.csv"), "preprocess_testfull.csv");
        assert_eq!(neighbor_output("Valid.csv"), "preprocess_validfull.csv");
    }
}
