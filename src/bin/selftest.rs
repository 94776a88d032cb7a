//! `dnsdb-selftest`: compiles a small fixed zone into memory and drives
//! it through the lookup/assembly path end to end, exiting non-zero on
//! the first mismatch. Meant to run in CI against a freshly built
//! binary before anything touches production traffic.
use std::net::Ipv4Addr;
use std::process::ExitCode;

use clap::App;
use dnsdb::answer::{self, AssembledAnswer};
use dnsdb::compiler::{compile, CompileConfig};
use dnsdb::location::LocationId;
use dnsdb::name;
use dnsdb::record::{TYPE_A, TYPE_NS, TYPE_SOA};
use dnsdb::rng::seeded;
use dnsdb::store::{MemBulkBuilder, MemStore};

const FIXTURE: &str = "\
.example.com,a.ns.example.com,dns.example.com,1,7200,1800,604800,300,
+www.example.com,203.0.113.10,300
+www.example.com,203.0.113.11,300
";

fn check(label: &str, ok: bool) -> bool {
    if ok {
        log::info!("ok: {label}");
    } else {
        log::error!("FAILED: {label}");
    }
    ok
}

fn main() -> ExitCode {
    env_logger::init();
    let _ = App::new("dnsdb-selftest").about("end-to-end smoke test").get_matches();

    let store = MemStore::new();
    let mut builder = MemBulkBuilder::new(store.clone());
    let lines: Vec<String> = FIXTURE.lines().map(|l| l.to_string()).collect();
    let cfg = CompileConfig::default();

    let mut all_ok = true;
    match compile(&lines, &cfg, &mut builder) {
        Ok(stats) => all_ok &= check("compile produced rows", stats.primitive_rows > 0),
        Err(e) => {
            log::error!("compile failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    let apex = name::pack("example.com").unwrap();
    match dnsdb::authority::find_zone_cut(&store, &apex) {
        Ok(cut) => all_ok &= check("soa found at apex", cut.soa.is_some_and(|soa| soa.rtype == TYPE_SOA)),
        Err(_) => all_ok &= check("soa found at apex", false),
    }

    let ns_name = name::pack("example.com").unwrap();
    match answer::assemble(&store, TYPE_NS, &ns_name, &LocationId::None) {
        Ok(Some(AssembledAnswer { rows, .. })) => all_ok &= check("ns row present", !rows.is_empty()),
        _ => all_ok &= check("ns row present", false),
    }

    let www = name::pack("www.example.com").unwrap();
    match answer::assemble(&store, TYPE_A, &www, &LocationId::None) {
        Ok(Some(AssembledAnswer { rows, .. })) => {
            all_ok &= check("two weighted A candidates found", rows.len() == 2);
            let mut rng = seeded(1);
            let picked = answer::pick_weighted(&mut rng, &rows, 1);
            let expected = [Ipv4Addr::new(203, 0, 113, 10).octets().to_vec(), Ipv4Addr::new(203, 0, 113, 11).octets().to_vec()];
            all_ok &= check(
                "picked address is one of the two candidates",
                picked.chosen.len() == 1 && expected.contains(&picked.chosen[0].rdata),
            );
        }
        _ => all_ok &= check("www A rows resolved", false),
    }

    if all_ok {
        log::info!("selftest passed");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
