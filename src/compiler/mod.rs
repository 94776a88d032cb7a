//! Compiler (component K): turns line-oriented zone source text into
//! the sorted (key, row) batches a [`crate::store::BulkBuilder`]
//! ingests. Parsing fans out across a worker pool of native threads
//! (there is no I/O to await, so there is nothing async buys here);
//! subnet rearranging and final key assembly happen on the caller's
//! thread once every worker's partial result is back.
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use crate::error::DnsDbResult;
use crate::keys::{self, Features, SchemaVersion};
use crate::location::{LocationId, MapClass};
use crate::name;
use crate::record::{self, ParseContext, PrimitiveRr};
use crate::store::{BulkBuilder, SortedBatch};
use crate::subnet::{self, Assignment, IpNet};

/// Compiler knobs independent of the worker pool (spec §4.K).
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub schema: SchemaVersion,
    pub workers: usize,
    pub default_serial: u32,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            schema: SchemaVersion::V2,
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            default_serial: 0,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileStats {
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub primitive_rows: usize,
    pub range_points: usize,
    pub map_bindings: usize,
}

/// One map's accumulated subnet assignments, keyed by `(class, map_id)`.
#[derive(Default)]
struct MapAccumulator {
    assignments: Vec<Assignment>,
    has_default_v4: bool,
    has_default_v6: bool,
}

#[derive(Default)]
struct WorkerOutput {
    rows: Vec<(Vec<u8>, Vec<u8>)>,
    map_assignments: Vec<((MapClass, [u8; 2]), Assignment, bool, bool)>,
    map_bindings: Vec<(Vec<u8>, [u8; 2])>,
    lines_skipped: usize,
}

fn parse_cidr(text: &str) -> Option<IpNet> {
    let (addr, prefix) = text.split_once('/')?;
    let prefix_len: u8 = prefix.parse().ok()?;
    if let Ok(v4) = addr.parse::<std::net::Ipv4Addr>() {
        Some(IpNet::v4(v4, prefix_len))
    } else if let Ok(v6) = addr.parse::<std::net::Ipv6Addr>() {
        Some(IpNet::v6(v6, prefix_len))
    } else {
        None
    }
}

fn rr_key(schema: SchemaVersion, rr: &PrimitiveRr) -> DnsDbResult<Vec<u8>> {
    let packed = name::pack(&rr.owner)?;
    let loc_id = LocationId::from_raw(&rr.loc)?;
    let loc_bytes = match loc_id {
        LocationId::None => [0, 0],
        LocationId::Short(b) => b,
        LocationId::Long(_) => [0xFF, 0xFF],
    };
    Ok(match schema {
        SchemaVersion::V2 => keys::rr_key_v2(&name::reverse(&packed), loc_bytes),
        SchemaVersion::V1 => keys::rr_key_v1(loc_bytes, &packed),
    })
}

fn compile_chunk(lines: &[String], ctx: &ParseContext) -> DnsDbResult<WorkerOutput> {
    let mut out = WorkerOutput::default();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.lines_skipped += 1;
            continue;
        }
        let rec = record::parse_line(trimmed, ctx)?;
        match &rec {
            record::Record::Net { cidr_text, loc } => {
                let Some(cidr) = parse_cidr(cidr_text) else {
                    out.lines_skipped += 1;
                    continue;
                };
                let is_default = cidr.prefix_len == if cidr.is_v4 { 96 } else { 0 };
                out.map_assignments.push((
                    (MapClass::Resolver, [0, 0]),
                    Assignment { cidr, loc: loc.clone() },
                    is_default && cidr.is_v4,
                    is_default && !cidr.is_v4,
                ));
            }
            record::Record::MapBinding { class, owner, map_id } => {
                let packed = name::pack(owner)?;
                let key = keys::map_binding_key(*class, &packed, owner.starts_with("*."));
                out.map_bindings.push((key, *map_id));
            }
            record::Record::Comment | record::Record::RangePoint { .. } => {}
            _ => {
                for primitive in rec.derived_records() {
                    let key = rr_key(ctx.schema, &primitive)?;
                    let row = record::encode_row(&primitive)?;
                    out.rows.push((key, row));
                }
            }
        }
    }
    Ok(out)
}

/// Parses `lines` across `cfg.workers` native threads and writes the
/// resulting rows, range points, map bindings and features marker into
/// `builder`, then ingests it. Returns summary counters for the caller's
/// build log.
pub fn compile(lines: &[String], cfg: &CompileConfig, builder: &mut dyn BulkBuilder) -> DnsDbResult<CompileStats> {
    let ctx = ParseContext {
        schema: cfg.schema,
        default_serial: cfg.default_serial,
    };
    let worker_count = cfg.workers.max(1);
    let chunk_size = lines.len().div_ceil(worker_count).max(1);

    let (tx, rx) = mpsc::channel::<DnsDbResult<WorkerOutput>>();
    thread::scope(|scope| {
        for chunk in lines.chunks(chunk_size) {
            let tx = tx.clone();
            let ctx = ctx;
            scope.spawn(move || {
                let result = compile_chunk(chunk, &ctx);
                let _ = tx.send(result);
            });
        }
    });
    drop(tx);

    let mut stats = CompileStats {
        lines_read: lines.len(),
        ..Default::default()
    };
    let mut rows_by_key: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();
    let mut map_accumulators: BTreeMap<(MapClass, [u8; 2]), MapAccumulator> = BTreeMap::new();
    let mut map_binding_rows: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();

    for result in rx {
        let worker_out = result?;
        stats.lines_skipped += worker_out.lines_skipped;
        for (key, row) in worker_out.rows {
            rows_by_key.entry(key).or_default().push(row);
            stats.primitive_rows += 1;
        }
        for (map_key, assignment, is_default_v4, is_default_v6) in worker_out.map_assignments {
            let acc = map_accumulators.entry(map_key).or_default();
            acc.assignments.push(assignment);
            acc.has_default_v4 |= is_default_v4;
            acc.has_default_v6 |= is_default_v6;
        }
        for (key, map_id) in worker_out.map_bindings {
            map_binding_rows.entry(key).or_default().push(map_id.to_vec());
            stats.map_bindings += 1;
        }
    }

    for ((_class, map_id), acc) in map_accumulators {
        let points = subnet::rearrange(&acc.assignments, acc.has_default_v4, acc.has_default_v6)?;
        for point in points {
            let key = keys::range_point_key(map_id, point.ip, point.mask_len);
            rows_by_key.entry(key).or_default().push(point.loc_id.encode());
            stats.range_points += 1;
        }
    }

    let mut batches: Vec<SortedBatch> = rows_by_key
        .into_iter()
        .map(|(key, values)| SortedBatch { key, values })
        .collect();
    batches.extend(
        map_binding_rows
            .into_iter()
            .map(|(key, values)| SortedBatch { key, values }),
    );

    let features = match cfg.schema {
        SchemaVersion::V1 => Features::V1_KEYS,
        SchemaVersion::V2 => Features::V2_KEYS,
    };
    batches.push(SortedBatch {
        key: keys::FEATURES_KEY.to_vec(),
        values: vec![features.encode().to_vec()],
    });

    builder.write_segment(batches)?;
    builder.ingest(false)?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KvStore, MemBulkBuilder, MemStore};

    #[test]
    fn compiles_addr_record_into_a_single_row() {
        let store = MemStore::new();
        let mut builder = MemBulkBuilder::new(store.clone());
        let lines = vec!["+www.example.com,1.2.3.4,60".to_string()];
        let cfg = CompileConfig {
            workers: 2,
            ..Default::default()
        };
        let stats = compile(&lines, &cfg, &mut builder).unwrap();
        assert_eq!(stats.primitive_rows, 1);

        let key = keys::rr_key_v2(&name::reverse(&name::pack("www.example.com").unwrap()), [0, 0]);
        let rows = crate::record_iter::rows_at(&store, &key).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rdata, vec![1, 2, 3, 4]);
    }

    #[test]
    fn compiles_subnet_assignment_into_range_points() {
        let store = MemStore::new();
        let mut builder = MemBulkBuilder::new(store.clone());
        let lines = vec!["%10.0.0.0/24,\\000\\007".to_string()];
        let cfg = CompileConfig::default();
        let stats = compile(&lines, &cfg, &mut builder).unwrap();
        assert!(stats.range_points >= 1);
    }

    #[test]
    fn writes_a_features_marker_for_the_active_schema() {
        let store = MemStore::new();
        let mut builder = MemBulkBuilder::new(store.clone());
        compile(&[], &CompileConfig::default(), &mut builder).unwrap();
        let value = store.get(keys::FEATURES_KEY).unwrap().unwrap();
        let chunks = crate::store::decode_chunks(&value).unwrap();
        let features = Features::decode(chunks[0]);
        assert!(features.contains(Features::V2_KEYS));
    }

    #[test]
    fn explicit_default_ranges_compile_without_panicking() {
        let store = MemStore::new();
        let mut builder = MemBulkBuilder::new(store.clone());
        let lines = vec!["%0.0.0.0/0,\\000\\001".to_string(), "%::/0,\\000\\002".to_string()];
        let stats = compile(&lines, &CompileConfig::default(), &mut builder).unwrap();
        assert!(stats.range_points >= 2);

        let v4_key = keys::range_point_key([0, 0], subnet::V4_REGION_START, 96);
        let v4_value = store.get(&v4_key).unwrap().expect("v4 /0 start point stored");
        let (v4_loc, _) = LocationId::decode(crate::store::decode_chunks(&v4_value).unwrap()[0]).unwrap();
        assert_eq!(v4_loc, LocationId::short(1));

        let v6_key = keys::range_point_key([0, 0], std::net::Ipv6Addr::UNSPECIFIED, 0);
        let v6_value = store.get(&v6_key).unwrap().expect("v6 /0 start point stored");
        let (v6_loc, _) = LocationId::decode(crate::store::decode_chunks(&v6_value).unwrap()[0]).unwrap();
        assert_eq!(v6_loc, LocationId::short(2));
    }

    #[test]
    fn blank_lines_are_skipped_not_errors() {
        let store = MemStore::new();
        let mut builder = MemBulkBuilder::new(store.clone());
        let lines = vec!["".to_string(), "  ".to_string(), "+a.com,1.2.3.4,60".to_string()];
        let stats = compile(&lines, &CompileConfig::default(), &mut builder).unwrap();
        assert_eq!(stats.lines_skipped, 2);
        assert_eq!(stats.primitive_rows, 1);
    }
}
