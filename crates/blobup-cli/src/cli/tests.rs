use super::*;
use blobup_core::strategy::StrategyKind;
use clap::Parser;

#[test]
fn parses_start_with_defaults() {
    let cli = Cli::try_parse_from(["blobup", "start"]).unwrap();
    match cli.command {
        CliCommand::Start { config, strategy } => {
            assert!(config.is_none());
            assert!(matches!(strategy, StrategyKind::RoundRobin));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn parses_start_with_strategy_and_config() {
    let cli = Cli::try_parse_from([
        "blobup",
        "start",
        "--strategy",
        "least-loaded",
        "--config",
        "/tmp/blobup.toml",
    ])
    .unwrap();
    match cli.command {
        CliCommand::Start { config, strategy } => {
            assert_eq!(config.unwrap().to_str(), Some("/tmp/blobup.toml"));
            assert!(matches!(strategy, StrategyKind::LeastLoaded));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn parses_resume() {
    let cli = Cli::try_parse_from(["blobup", "resume", "-s", "weighted"]).unwrap();
    match cli.command {
        CliCommand::Resume { strategy, .. } => {
            assert!(matches!(strategy, StrategyKind::Weighted));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn parses_status() {
    let cli = Cli::try_parse_from(["blobup", "status"]).unwrap();
    assert!(matches!(cli.command, CliCommand::Status));
}

#[test]
fn parses_upload_with_files() {
    let cli = Cli::try_parse_from(["blobup", "upload", "a.bin", "b.bin", "--no-start"]).unwrap();
    match cli.command {
        CliCommand::Upload {
            files, no_start, ..
        } => {
            assert_eq!(files, vec!["a.bin".to_string(), "b.bin".to_string()]);
            assert!(no_start);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn upload_requires_at_least_one_file() {
    assert!(Cli::try_parse_from(["blobup", "upload"]).is_err());
}

#[test]
fn rejects_unknown_strategy() {
    assert!(Cli::try_parse_from(["blobup", "start", "--strategy", "bogus"]).is_err());
}
