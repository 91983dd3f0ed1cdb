use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

const RESULTS: &str = "\
100,95.2,0.012,0.99,0.01
200,190.1,0.015,0.98,0.02
300,281.7,0.031,0.95,0.05
400,352.4,0.094,0.88,0.12
";

#[test]
fn writes_the_figure_with_default_paths() {
  let dir = tempdir().unwrap();
  fs::write(dir.path().join("taskA_1.csv"), RESULTS).unwrap();

  cargo_bin_cmd!("delayplot").current_dir(dir.path()).arg("--no-show").assert().success();

  let pdf = fs::read(dir.path().join("All_Graph.pdf")).unwrap();
  assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn rerunning_overwrites_the_figure() {
  let dir = tempdir().unwrap();
  let output = dir.path().join("All_Graph.pdf");
  fs::write(dir.path().join("taskA_1.csv"), RESULTS).unwrap();
  fs::write(&output, "stale").unwrap();

  for _ in 0..2 {
    cargo_bin_cmd!("delayplot").current_dir(dir.path()).arg("--no-show").assert().success();
    let pdf = fs::read(&output).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(pdf.ends_with(b"%%EOF") || pdf.ends_with(b"%%EOF\n"));
  }
}

#[test]
fn explicit_paths_are_honored() {
  let dir = tempdir().unwrap();
  let input = dir.path().join("results.csv");
  let output = dir.path().join("delay.pdf");
  fs::write(&input, RESULTS).unwrap();

  cargo_bin_cmd!("delayplot")
    .arg(&input)
    .arg("-o")
    .arg(&output)
    .arg("--no-show")
    .assert()
    .success()
    .stderr(predicate::str::contains("wrote"));

  assert!(fs::metadata(&output).unwrap().len() > 0);
}

#[test]
fn non_numeric_value_fails_before_plotting() {
  let dir = tempdir().unwrap();
  fs::write(dir.path().join("taskA_1.csv"), "100,95.2,0.012\n200,190.1,fast\n").unwrap();

  cargo_bin_cmd!("delayplot")
    .current_dir(dir.path())
    .arg("--no-show")
    .assert()
    .failure()
    .stderr(predicate::str::contains("line 2").and(predicate::str::contains("fast")));

  assert!(!dir.path().join("All_Graph.pdf").exists());
}

#[test]
fn blank_line_fails_before_plotting() {
  let dir = tempdir().unwrap();
  fs::write(dir.path().join("taskA_1.csv"), "100,95.2,0.012\n\n200,190.1,0.015\n").unwrap();

  cargo_bin_cmd!("delayplot")
    .current_dir(dir.path())
    .arg("--no-show")
    .assert()
    .failure()
    .stderr(predicate::str::contains("line 2"));

  assert!(!dir.path().join("All_Graph.pdf").exists());
}

#[test]
fn missing_input_fails() {
  let dir = tempdir().unwrap();

  cargo_bin_cmd!("delayplot")
    .current_dir(dir.path())
    .arg("--no-show")
    .assert()
    .failure()
    .stderr(predicate::str::contains("taskA_1.csv"));

  assert!(!dir.path().join("All_Graph.pdf").exists());
}

#[test]
fn unsupported_output_format_fails() {
  let dir = tempdir().unwrap();
  fs::write(dir.path().join("taskA_1.csv"), RESULTS).unwrap();

  cargo_bin_cmd!("delayplot")
    .current_dir(dir.path())
    .args(["--no-show", "-o", "graph.svg"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("graph.svg"));
}
