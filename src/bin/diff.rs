//! `dnsdb-diff`: compiles two zone source files independently and
//! reports which keys differ between the resulting stores. Useful for
//! reviewing a source change before it's pushed through the real
//! compiler pipeline.
use std::fs;
use std::process::ExitCode;

use clap::{App, Arg};
use dnsdb::compiler::{compile, CompileConfig};
use dnsdb::store::{KvStore, MemBulkBuilder, MemStore};

fn compile_file(path: &str, cfg: &CompileConfig) -> Option<MemStore> {
    let text = fs::read_to_string(path)
        .map_err(|e| log::error!("failed to read {path}: {e}"))
        .ok()?;
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    let store = MemStore::new();
    let mut builder = MemBulkBuilder::new(store.clone());
    compile(&lines, cfg, &mut builder)
        .map_err(|e| log::error!("failed to compile {path}: {e}"))
        .ok()?;
    Some(store)
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = App::new("dnsdb-diff")
        .about("diffs the compiled output of two zone source files")
        .arg(Arg::with_name("before").required(true))
        .arg(Arg::with_name("after").required(true))
        .get_matches();

    let cfg = CompileConfig::default();
    let (Some(before), Some(after)) = (
        compile_file(matches.value_of("before").unwrap(), &cfg),
        compile_file(matches.value_of("after").unwrap(), &cfg),
    ) else {
        return ExitCode::FAILURE;
    };

    let before_keys: Vec<(Vec<u8>, Vec<u8>)> = before.snapshot();
    let after_keys: Vec<(Vec<u8>, Vec<u8>)> = after.snapshot();

    let mut added = 0;
    let mut removed = 0;
    let mut changed = 0;

    for (key, value) in &after_keys {
        match before.get(key) {
            Ok(Some(old_value)) if &old_value != value => {
                changed += 1;
                println!("~ {:02x?}", key);
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => {
                added += 1;
                println!("+ {:02x?}", key);
            }
        }
    }
    for (key, _) in &before_keys {
        if after.get(key).ok().flatten().is_none() {
            removed += 1;
            println!("- {:02x?}", key);
        }
    }

    log::info!("{added} added, {removed} removed, {changed} changed");
    ExitCode::SUCCESS
}
