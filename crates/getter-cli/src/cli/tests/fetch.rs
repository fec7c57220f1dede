//! Tests for the fetch subcommand.

use super::parse;
use clap::Parser;
use crate::cli::{Cli, CliCommand};
use std::path::Path;

#[test]
fn cli_parse_fetch_defaults() {
    match parse(&["getter", "fetch", "example.com/file.iso"]) {
        CliCommand::Fetch {
            url,
            output,
            workers,
            sha256,
        } => {
            assert_eq!(url, "example.com/file.iso");
            assert!(output.is_none());
            assert!(workers.is_none());
            assert!(!sha256);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_all_flags() {
    match parse(&[
        "getter",
        "fetch",
        "http://example.com:8080/x.bin",
        "-o",
        "/tmp/x.bin",
        "--workers",
        "8",
        "--sha256",
    ]) {
        CliCommand::Fetch {
            url,
            output,
            workers,
            sha256,
        } => {
            assert_eq!(url, "http://example.com:8080/x.bin");
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/x.bin")));
            assert_eq!(workers, Some(8));
            assert!(sha256);
        }
        _ => panic!("expected Fetch with flags"),
    }
}

#[test]
fn cli_parse_fetch_short_workers() {
    match parse(&["getter", "fetch", "h/p", "-w", "2"]) {
        CliCommand::Fetch { workers, .. } => assert_eq!(workers, Some(2)),
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_fetch_requires_url() {
    assert!(Cli::try_parse_from(["getter", "fetch"]).is_err());
}

#[test]
fn cli_fetch_rejects_non_numeric_workers() {
    assert!(Cli::try_parse_from(["getter", "fetch", "h/p", "-w", "many"]).is_err());
}
