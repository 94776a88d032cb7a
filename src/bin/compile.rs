//! `dnsdb-compile`: reads a line-oriented zone source file and compiles
//! it into an in-memory store, reporting row/point counts. The real
//! embedded engine this feeds in production is out of scope for this
//! crate; this binary exercises the same compiler pipeline against
//! [`dnsdb::store::MemStore`] so the format and the worker fan-out can
//! be validated without it.
use std::fs;
use std::process::ExitCode;

use clap::{App, Arg};
use dnsdb::compiler::{compile, CompileConfig};
use dnsdb::keys::SchemaVersion;
use dnsdb::store::{MemBulkBuilder, MemStore};

fn main() -> ExitCode {
    env_logger::init();

    let matches = App::new("dnsdb-compile")
        .about("compiles a zone source file into an in-memory store")
        .arg(Arg::with_name("input").required(true).help("path to the source file"))
        .arg(
            Arg::with_name("workers")
                .long("workers")
                .takes_value(true)
                .help("parser worker threads (default: available parallelism)"),
        )
        .arg(
            Arg::with_name("schema")
                .long("schema")
                .takes_value(true)
                .possible_values(&["v1", "v2"])
                .default_value("v2"),
        )
        .get_matches();

    let path = matches.value_of("input").unwrap();
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::error!("failed to read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();

    let mut cfg = CompileConfig::default();
    if let Some(workers) = matches.value_of("workers").and_then(|v| v.parse().ok()) {
        cfg.workers = workers;
    }
    cfg.schema = match matches.value_of("schema") {
        Some("v1") => SchemaVersion::V1,
        _ => SchemaVersion::V2,
    };

    let store = MemStore::new();
    let mut builder = MemBulkBuilder::new(store.clone());

    match compile(&lines, &cfg, &mut builder) {
        Ok(stats) => {
            log::info!(
                "compiled {} lines ({} skipped): {} rows, {} range points, {} map bindings",
                stats.lines_read,
                stats.lines_skipped,
                stats.primitive_rows,
                stats.range_points,
                stats.map_bindings
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("compile failed: {e}");
            ExitCode::FAILURE
        }
    }
}
