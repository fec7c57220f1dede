//! Tests for probe and checksum subcommands.

use super::parse;
use clap::Parser;
use crate::cli::{Cli, CliCommand};
use std::path::Path;

#[test]
fn cli_parse_probe() {
    match parse(&["getter", "probe", "example.com/a"]) {
        CliCommand::Probe { url, workers, json } => {
            assert_eq!(url, "example.com/a");
            assert!(workers.is_none());
            assert!(!json);
        }
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_parse_probe_json_workers() {
    match parse(&["getter", "probe", "example.com/a", "--json", "-w", "3"]) {
        CliCommand::Probe { workers, json, .. } => {
            assert_eq!(workers, Some(3));
            assert!(json);
        }
        _ => panic!("expected Probe with --json"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["getter", "checksum", "/tmp/file.iso"]) {
        CliCommand::Checksum { path } => {
            assert_eq!(path, Path::new("/tmp/file.iso"));
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(["getter", "frobnicate"]).is_err());
}
