//! Runtime configuration read from `FBDNS_*` environment variables. Every
//! knob has a hardcoded default; an override is logged at startup so a
//! misconfigured environment is visible in the log, not just in behavior.
use std::time::Duration;

/// Process-wide tunables resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Whether the legacy V1 location-lookup bitmap keys each mask
    /// length separately (`FBDNS_SEPARATE_MASKLENS`, default `false`).
    pub separate_masklens: bool,
    /// Compiler worker pool size (`FBDNS_COMPILE_WORKERS`, default: one
    /// worker per available core).
    pub compile_workers: usize,
    /// Maximum time a `reload()` call waits for the swap to complete
    /// before returning `ReloadTimeout` (`FBDNS_RELOAD_TIMEOUT_MS`,
    /// default 30s).
    pub reload_timeout: Duration,
    /// Active key schema for newly compiled databases
    /// (`FBDNS_SCHEMA_VERSION`, `v1` or `v2`, default `v2`).
    pub schema: crate::keys::SchemaVersion,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            separate_masklens: false,
            compile_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            reload_timeout: Duration::from_secs(30),
            schema: crate::keys::SchemaVersion::V2,
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => {
            let parsed = matches!(v.as_str(), "1" | "true" | "yes");
            log::info!("{name} overridden to {parsed} (raw {v:?})");
            parsed
        }
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name).ok().and_then(|v| v.parse().ok()) {
        Some(v) => {
            log::info!("{name} overridden to {v}");
            v
        }
        None => default,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name).ok().and_then(|v| v.parse().ok()) {
        Some(v) => {
            log::info!("{name} overridden to {v}");
            v
        }
        None => default,
    }
}

impl Config {
    /// Reads every `FBDNS_*` variable, falling back to its default and
    /// logging any override actually applied.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let schema = match std::env::var("FBDNS_SCHEMA_VERSION").as_deref() {
            Ok("v1") => {
                log::info!("FBDNS_SCHEMA_VERSION overridden to v1");
                crate::keys::SchemaVersion::V1
            }
            _ => defaults.schema,
        };
        Config {
            separate_masklens: env_bool("FBDNS_SEPARATE_MASKLENS", defaults.separate_masklens),
            compile_workers: env_usize("FBDNS_COMPILE_WORKERS", defaults.compile_workers),
            reload_timeout: Duration::from_millis(env_u64(
                "FBDNS_RELOAD_TIMEOUT_MS",
                defaults.reload_timeout.as_millis() as u64,
            )),
            schema,
        }
    }
}
