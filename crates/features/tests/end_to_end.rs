//! End-to-end batch over a small fixture dataset

use authormatch_common::AppConfig;
use authormatch_features::pipeline::{neighbor_output, split_valid, TEST_OUTPUT, TRAIN_OUTPUT};
use authormatch_features::{execute, Command, Pipeline};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn fixture() -> (TempDir, AppConfig) {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("original_data");
    fs::create_dir_all(&data).unwrap();

    write(
        &data,
        "Paper.csv",
        "Id,Title,Year,ConferenceId,JournalId,Keyword\n\
         1,fast algorithm,2000,10,0,\n\
         2,slow algorithm,2005,0,20,\n",
    );
    write(&data, "Author.csv", "Id,Name,Affiliation\n100,Ann,mit\n");
    write(&data, "Conference.csv", "Id,ShortName,FullName\n10,NN,Neural Networks\n");
    write(&data, "Journal.csv", "Id,ShortName,FullName\n20,ML,Machine Learning\n");
    write(
        &data,
        "PaperAuthor.csv",
        "PaperId,AuthorId,Name,Affiliation\n1,100,Ann,\n2,100,Ann,\n",
    );
    write(
        &data,
        "Train.csv",
        "AuthorId,ConfirmedPaperIds,DeletedPaperIds\n100,1,2\n",
    );
    write(&data, "Test.csv", "AuthorId,PaperIds\n200,1 2\n");
    write(&data, "Valid.csv", "AuthorId,PaperIds\n100,1 2\n");
    write(&data, "ValidSolution.csv", "AuthorId,PaperIds\n100,1\n");

    let mut config = AppConfig::default();
    config.paths.data_dir = data;
    config.paths.cache_dir = dir.path().join("pickles");
    config.paths.output_dir = dir.path().join("preprocess");
    config.paths.compact_dir = dir.path().join("compressed_data");
    config.pipeline.timestamp_outputs = false;
    (dir, config)
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn training_rows_for_single_author() {
    let (_dir, config) = fixture();
    let output = config.paths.output_dir.join(TRAIN_OUTPUT);

    execute(config, Command::Train).await.unwrap();

    let rows = read_rows(&output);
    assert_eq!(
        rows[0],
        vec!["AuthorId", "PaperId", "PaperYear", "PublishCount", "PaperTitle", "Publish", "mark"]
    );
    assert_eq!(rows.len(), 3);

    let year = |y: f64| ((y - 1900.0) / (2013.0 - 1900.0)).to_string();

    // Confirmed first, then deleted
    assert_eq!(rows[1][..3], ["100", "1", year(2000.0).as_str()]);
    assert_eq!(rows[1][6], "1");
    assert_eq!(rows[2][..3], ["100", "2", year(2005.0).as_str()]);
    assert_eq!(rows[2][6], "-1");

    // No co-authors besides the author
    assert_eq!(rows[1][3], "0");
    assert_eq!(rows[2][3], "0");

    // Paper similarity compares against the author's other paper only
    assert_ne!(rows[1][4], "0");
    assert_ne!(rows[1][5], "0");
    assert_eq!(rows[1][4], rows[2][4]);
}

#[tokio::test]
async fn run_writes_test_features_and_neighbors() {
    let (_dir, config) = fixture();
    let output_dir = config.paths.output_dir.clone();

    let pipeline = Pipeline::prepare(config).await.unwrap();
    let labels = pipeline.run().await.unwrap();

    assert_eq!(labels.confirmed(100), &[1]);
    assert_eq!(labels.deleted(100), &[2]);
    assert_eq!(labels.unknown(200), &[1, 2]);

    let test_rows = read_rows(&output_dir.join(TEST_OUTPUT));
    assert_eq!(test_rows.len(), 3);
    assert!(test_rows[1..].iter().all(|row| row[6] == "0"));

    let neighbor_rows = read_rows(&output_dir.join(neighbor_output("Test.csv")));
    assert_eq!(neighbor_rows[0][..3], ["AuthorId", "NeighborId1", "Score1"]);
    assert_eq!(neighbor_rows[1][..2], ["200", "100"]);
    assert_eq!(neighbor_rows[1].len(), 3);
}

#[tokio::test]
async fn neighbors_reuse_stored_labels() {
    let (_dir, config) = fixture();
    let train_input = config.paths.input(&config.paths.train_file);

    execute(config.clone(), Command::Train).await.unwrap();
    fs::remove_file(train_input).unwrap();

    // Train.csv is gone; the stored label sets are used instead
    execute(config.clone(), Command::Neighbors { queries: None })
        .await
        .unwrap();
    assert!(config
        .paths
        .output_dir
        .join("preprocess_testfull.csv")
        .is_file());
}

#[test]
fn split_valid_then_merge() {
    let (dir, config) = fixture();

    let valid_to_train = split_valid(&config).unwrap();
    assert_eq!(
        fs::read_to_string(&valid_to_train).unwrap(),
        "AuthorId,ConfirmedPaperIds,DeletedPaperIds\n100,1,2\n"
    );

    let merged = dir.path().join("Train+Valid.csv");
    let train = config.paths.input(&config.paths.train_file);
    tokio_test::block_on(execute(
        config,
        Command::Merge {
            inputs: vec![train, valid_to_train],
            dest: merged.clone(),
        },
    ))
    .unwrap();

    assert_eq!(
        fs::read_to_string(&merged).unwrap(),
        "AuthorId,ConfirmedPaperIds,DeletedPaperIds\n100,1,2\n100,1,2\n"
    );
}

#[tokio::test]
async fn compacted_tables_feed_training() {
    let (_dir, mut config) = fixture();
    let compact_dir = config.paths.compact_dir.clone();

    execute(config.clone(), Command::Compact).await.unwrap();

    // Author 200 has no PaperAuthor entry
    assert_eq!(
        fs::read_to_string(compact_dir.join("Test.csv")).unwrap(),
        "AuthorId,PaperIds\n"
    );

    config.paths.data_dir = compact_dir;
    let output = config.paths.output_dir.join(TRAIN_OUTPUT);
    execute(config, Command::Train).await.unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][..2], ["100", "1"]);
    assert_eq!(rows[2][..2], ["100", "2"]);
}

#[tokio::test]
async fn missing_input_aborts() {
    let (_dir, config) = fixture();
    fs::remove_file(config.paths.input(&config.paths.paper_file)).unwrap();

    let err = execute(config, Command::Train).await.unwrap_err();
    assert!(err.to_string().contains("Paper.csv"));
}
