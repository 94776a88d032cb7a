//! `dnsdb`: the storage, codec and lookup core of an authoritative DNS
//! data engine. The crate is deliberately agnostic to the query
//! transport — it answers "what records exist for this name, from this
//! client's vantage point" and leaves wire I/O to a caller.
pub mod additional;
pub mod answer;
pub mod authority;
pub mod compiler;
pub mod config;
pub mod ecs;
pub mod error;
pub mod keys;
pub mod location;
pub mod location_lookup;
pub mod map_lookup;
pub mod name;
pub mod network_order;
pub mod record;
pub mod record_iter;
pub mod reload;
pub mod rng;
pub mod store;
pub mod subnet;
pub mod wire;
pub mod wrs;

pub use error::{DnsDbError, DnsDbResult};
