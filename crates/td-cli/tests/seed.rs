use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_seed_creates_database_once() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("td")
        .arg("--dir")
        .arg(dir.path())
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 7 issues"));

    assert!(dir.path().join(".todos").join("issues.json").exists());

    cargo_bin_cmd!("td")
        .arg("--dir")
        .arg(dir.path())
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing seeded"));
}
