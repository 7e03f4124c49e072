use std::fs;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::Deserialize;
use syncserve_fs::{Error, NormalizedPath, load_config};
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct Sample {
    repo: String,
    port: u16,
}

#[rstest]
#[case("config.toml", "repo = \"https://example.com/a.git\"\nport = 8080\n")]
#[case("config.json", r#"{"repo": "https://example.com/a.git", "port": 8080}"#)]
#[case("config.yaml", "repo: https://example.com/a.git\nport: 8080\n")]
#[case("config.yml", "repo: https://example.com/a.git\nport: 8080\n")]
fn test_load_each_format(#[case] name: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(name);
    fs::write(&path, content).unwrap();

    let loaded: Sample = load_config(&NormalizedPath::new(&path)).unwrap();
    assert_eq!(
        loaded,
        Sample {
            repo: "https://example.com/a.git".into(),
            port: 8080,
        }
    );
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.ini");
    fs::write(&path, "repo=x").unwrap();

    let err = load_config::<Sample>(&NormalizedPath::new(&path)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { ref extension } if extension == "ini"));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "repo = ").unwrap();

    let err = load_config::<Sample>(&NormalizedPath::new(&path)).unwrap_err();
    assert!(err.to_string().contains("TOML"), "got {err}");
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");

    let err = load_config::<Sample>(&NormalizedPath::new(&path)).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
