//! Configuration tier tests: CLI > environment > TOML file > defaults
//!
//! Note: Uses serial_test to prevent environment variable races; every test
//! that sets or clears a variable is marked #[serial].

use std::env;
use std::io::Write;
use std::time::Duration;

use brewlog_common::config::{ConfigArgs, DEFAULT_DATABASE, DEFAULT_STORE_URI};
use clap::Parser;
use serial_test::serial;

#[derive(Parser, Debug)]
struct TestArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

const VARS: [&str; 9] = [
    "BREWLOG_CONFIG",
    "MONGO_URI",
    "MONGO_DB",
    "MONGO_COLLECTION_MADURADORES",
    "MONGO_COLLECTION_LOTES",
    "MONGO_TIMEOUT_MS",
    "BREWLOG_HOST",
    "BREWLOG_PORT",
    "BREWLOG_CORS_ORIGINS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

fn parse(args: &[&str]) -> TestArgs {
    TestArgs::try_parse_from(std::iter::once("brewlog").chain(args.iter().copied()))
        .expect("Should parse arguments")
}

#[test]
#[serial]
fn test_no_overrides_uses_defaults() {
    clear_env();
    let config = parse(&[]).config.resolve().unwrap();
    assert_eq!(config.store.uri, DEFAULT_STORE_URI);
    assert_eq!(config.store.database, DEFAULT_DATABASE);
    assert_eq!(config.store.maduradores_collection, "maduradores");
    assert_eq!(config.store.lotes_collection, "lotes");
}

#[test]
#[serial]
fn test_environment_tier() {
    clear_env();
    env::set_var("MONGO_URI", "mongodb://db.internal:27017");
    env::set_var("MONGO_TIMEOUT_MS", "1500");
    env::set_var("BREWLOG_CORS_ORIGINS", "http://a.test,http://b.test");

    let config = parse(&[]).config.resolve().unwrap();
    clear_env();

    assert_eq!(config.store.uri, "mongodb://db.internal:27017");
    assert_eq!(config.store.timeout, Duration::from_millis(1500));
    assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
}

#[test]
#[serial]
fn test_command_line_beats_environment() {
    clear_env();
    env::set_var("MONGO_DB", "from_env");

    let config = parse(&["--mongo-db", "from_cli", "--port", "9100"])
        .config
        .resolve()
        .unwrap();
    clear_env();

    assert_eq!(config.store.database, "from_cli");
    assert_eq!(config.server.port, 9100);
}

#[test]
#[serial]
fn test_toml_file_under_environment() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[store]\ndatabase = \"from_file\"\nlotes_collection = \"batches\"\n\n[server]\nport = 7000"
    )
    .unwrap();

    env::set_var("MONGO_DB", "from_env");
    let path = file.path().to_str().unwrap().to_string();
    let config = parse(&["--config", &path]).config.resolve().unwrap();
    clear_env();

    assert_eq!(config.store.database, "from_env");
    assert_eq!(config.store.lotes_collection, "batches");
    assert_eq!(config.server.port, 7000);
}
