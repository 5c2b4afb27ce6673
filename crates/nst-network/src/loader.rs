//! CSV network loader.
//!
//! # CSV format
//!
//! Two tables, one row per node and one row per link.  IDs must be dense
//! (`0..n`) but rows may appear in any order.
//!
//! ```csv
//! node_id,x,y,elevation_m
//! 0,0,0,12.0
//! 1,0,1000,7.0
//! 2,0,2000,2.0
//! ```
//!
//! ```csv
//! link_id,upstream_node,downstream_node,length_m,slope,width_m,flow_depth_m
//! 0,0,1,1000,0.005,10,1.5
//! 1,1,2,,,12,1.8
//! ```
//!
//! `length_m` and `slope` may be left empty: the link then takes its length
//! from the node coordinates and its slope from the node elevations.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use nst_core::{NodeId, PlanarPoint};

use crate::network::{LinkGeometry, RiverNetwork, RiverNetworkBuilder};
use crate::{NetworkError, NetworkResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    node_id:     u32,
    x:           f64,
    y:           f64,
    elevation_m: f64,
}

#[derive(Deserialize)]
struct LinkRecord {
    link_id:         u32,
    upstream_node:   u32,
    downstream_node: u32,
    length_m:        Option<f64>,
    slope:           Option<f64>,
    width_m:         f64,
    flow_depth_m:    f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a network from a node CSV and a link CSV.
pub fn load_network_csv(nodes: &Path, links: &Path, min_slope: f64) -> NetworkResult<RiverNetwork> {
    let nodes = std::fs::File::open(nodes)?;
    let links = std::fs::File::open(links)?;
    load_network_readers(nodes, links, min_slope)
}

/// Like [`load_network_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`).
pub fn load_network_readers<N: Read, L: Read>(
    nodes:     N,
    links:     L,
    min_slope: f64,
) -> NetworkResult<RiverNetwork> {
    let mut node_rows: Vec<NodeRecord> = csv::Reader::from_reader(nodes)
        .deserialize::<NodeRecord>()
        .collect::<Result<_, _>>()
        .map_err(|e: csv::Error| NetworkError::Parse(e.to_string()))?;
    node_rows.sort_unstable_by_key(|r| r.node_id);
    check_dense("node_id", node_rows.iter().map(|r| r.node_id))?;

    let mut link_rows: Vec<LinkRecord> = csv::Reader::from_reader(links)
        .deserialize::<LinkRecord>()
        .collect::<Result<_, _>>()
        .map_err(|e: csv::Error| NetworkError::Parse(e.to_string()))?;
    link_rows.sort_unstable_by_key(|r| r.link_id);
    check_dense("link_id", link_rows.iter().map(|r| r.link_id))?;

    let mut b = RiverNetworkBuilder::with_capacity(node_rows.len(), link_rows.len())
        .min_slope(min_slope);
    for r in &node_rows {
        b.add_node(PlanarPoint::new(r.x, r.y), r.elevation_m);
    }
    for r in &link_rows {
        let up = NodeId(r.upstream_node);
        let down = NodeId(r.downstream_node);
        match (r.length_m, r.slope) {
            (Some(length_m), Some(slope)) => {
                b.add_link(up, down, LinkGeometry::new(length_m, slope, r.width_m, r.flow_depth_m));
            }
            (None, None) => {
                b.add_link_from_nodes(up, down, r.width_m, r.flow_depth_m);
            }
            _ => {
                return Err(NetworkError::Parse(format!(
                    "link {}: length_m and slope must both be given or both be empty",
                    r.link_id
                )));
            }
        }
    }

    Ok(b.build()?)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// IDs (already sorted) must be exactly `0, 1, …, n-1`.
fn check_dense(column: &str, ids: impl Iterator<Item = u32>) -> NetworkResult<()> {
    for (expected, id) in ids.enumerate() {
        if id as usize != expected {
            return Err(NetworkError::Parse(format!(
                "{column} values must be dense from 0; expected {expected}, found {id}"
            )));
        }
    }
    Ok(())
}
