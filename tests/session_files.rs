//! Loading datasets from files through a configured session.

use std::io::Write;
use std::path::PathBuf;

use histofit::config::SessionConfig;
use histofit::curve::{normal_pdf, DistributionKind};
use histofit::dataset::Dataset;
use histofit::session::{Axis, Direction, Session, BIN_COUNT_PRESETS};
use histofit::EngineError;
use tempfile::TempDir;

fn write_dataset(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

/// A symmetric, bell-shaped dataset and a strongly skewed one.
fn fixtures() -> (TempDir, SessionConfig) {
    let dir = tempfile::tempdir().unwrap();
    let bell: Vec<String> = [-2.0, -1.0, -1.0, -0.5, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 2.0]
        .iter()
        .map(ToString::to_string)
        .collect();
    let bell = write_dataset(
        &dir,
        "bell.dat",
        &format!("{}\n{}\n", bell.len(), bell.join(" ")),
    );
    let skewed: Vec<String> = (1..=60).map(|i| (i * i * i).to_string()).collect();
    let skewed = write_dataset(
        &dir,
        "skewed.dat",
        &format!("{}\n{}\n", skewed.len(), skewed.join("\n")),
    );
    let config = SessionConfig::new()
        .with_seed(2024)
        .with_dataset("bell", bell)
        .with_dataset("skewed", skewed);
    (dir, config)
}

#[test]
fn loads_named_datasets() {
    let (_dir, config) = fixtures();
    let mut session = Session::new(config).unwrap();

    session.load("bell").unwrap();
    let summary = session.summary().unwrap();
    assert_eq!(summary.source.as_deref(), Some("bell.dat"));
    assert_eq!(summary.count, 11);
    assert_eq!(summary.minimum, -2.0);
    assert_eq!(summary.maximum, 2.0);
    assert!(session.normality().unwrap().is_normal);

    session.load("skewed").unwrap();
    assert_eq!(session.summary().unwrap().count, 60);
    assert!(!session.normality().unwrap().is_normal);
}

#[test]
fn reloading_is_deterministic() {
    let (_dir, config) = fixtures();
    let mut session = Session::new(config).unwrap();

    session.load("skewed").unwrap();
    let dataset = session.dataset().unwrap().clone();
    let histogram = session.histogram().unwrap().clone();

    session.load("bell").unwrap();
    session.load("skewed").unwrap();
    assert_eq!(session.dataset().unwrap(), &dataset);
    assert_eq!(session.histogram().unwrap(), &histogram);
}

#[test]
fn histogram_presets_conserve_samples() {
    let (_dir, config) = fixtures();
    let mut session = Session::new(config).unwrap();
    session.load("skewed").unwrap();
    for bins in BIN_COUNT_PRESETS {
        session.set_bin_count(bins).unwrap();
        let histogram = session.histogram().unwrap();
        assert_eq!(histogram.bin_count(), bins);
        assert_eq!(histogram.counts().iter().sum::<usize>(), 60);
        assert!((histogram.total_probability() - 1.0).abs() < 1e-9);
        assert_eq!(*histogram.boundaries().last().unwrap(), 216_000.0);
    }
}

#[test]
fn bin_count_survives_reload() {
    let (_dir, config) = fixtures();
    let mut session = Session::new(config).unwrap();
    session.load("bell").unwrap();
    session.set_bin_count(4).unwrap();
    session.load("skewed").unwrap();
    assert_eq!(session.histogram().unwrap().bin_count(), 4);
}

#[test]
fn missing_file_keeps_previous_dataset() {
    let (dir, config) = fixtures();
    let config = config.with_dataset("gone", dir.path().join("gone.dat"));
    let mut session = Session::new(config).unwrap();
    session.load("bell").unwrap();

    let err = session.load("gone").unwrap_err();
    assert!(matches!(err, EngineError::FileUnavailable { .. }));
    assert!(err.to_string().contains("gone.dat"));
    assert_eq!(session.summary().unwrap().source.as_deref(), Some("bell.dat"));
}

#[test]
fn truncated_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(&dir, "short.dat", "10\n1 2 3\n");
    let mut session = Session::new(SessionConfig::new()).unwrap();
    assert!(matches!(
        session.load_path(&path),
        Err(EngineError::MalformedInput(_))
    ));
    assert!(!session.is_loaded());
    assert!(matches!(
        Dataset::from_path(&path),
        Err(EngineError::MalformedInput(_))
    ));
}

#[test]
fn curves_follow_parameters() {
    let (_dir, config) = fixtures();
    let mut session = Session::new(config).unwrap();
    session.load("bell").unwrap();
    session.set_parameter_step(0.5).unwrap();
    session
        .adjust_parameter(Direction::Increase, Axis::Location)
        .unwrap();
    session
        .adjust_parameter(Direction::Increase, Axis::Spread)
        .unwrap();

    let curve = session.curve(DistributionKind::Normal).unwrap();
    assert!(curve.xs().windows(2).all(|w| w[0] <= w[1]));
    for (x, y) in curve.points() {
        assert!((y - normal_pdf(x, 0.5, 1.5)).abs() < 1e-15);
    }
}

#[test]
fn config_file_round_trip() {
    let (dir, config) = fixtures();
    let path = dir.path().join("histofit.toml");
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let parsed = SessionConfig::from_toml(&text).unwrap();
    assert_eq!(parsed, config);

    let mut session = Session::new(parsed).unwrap();
    session.load("bell").unwrap();
    assert!(session.is_loaded());
}
