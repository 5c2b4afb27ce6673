//! Hydraulic forcing: the flow depth on each link for each step.
//!
//! # CSV format
//!
//! One column per link, headed by its link id in order, one row per step:
//!
//! ```csv
//! 0,1,2
//! 1.2,1.4,1.9
//! 0.8,1.0,1.3
//! ```
//!
//! Row `k` drives step `k + 1` (the step that produces ledger slice
//! `k + 1`).  Steps past the last row reuse the last row.

use std::io::Read;
use std::path::Path;

use nst_core::{LinkId, Timestep};
use nst_network::RiverNetwork;

use crate::{TransportError, TransportResult};

/// Supplies the raw flow depth of `link` during `step`.
///
/// Values are passed through as given; the engine rejects non-finite depths
/// and clamps negative ones.
pub trait FlowDepthSource {
    fn flow_depth_m(&self, step: Timestep, link: LinkId, network: &RiverNetwork) -> f64;
}

/// Constant forcing: every step uses the network's baseline depths.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFlowDepth;

impl FlowDepthSource for NetworkFlowDepth {
    #[inline]
    fn flow_depth_m(&self, _step: Timestep, link: LinkId, network: &RiverNetwork) -> f64 {
        network.flow_depth_m(link)
    }
}

/// A per-step table of flow depths.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDepthSeries {
    rows: Vec<Vec<f64>>,
}

impl FlowDepthSeries {
    /// Every row must have one depth per network link, and there must be at
    /// least one row.
    pub fn new(rows: Vec<Vec<f64>>, network: &RiverNetwork) -> TransportResult<Self> {
        let expected = network.link_count();
        if rows.is_empty() {
            return Err(TransportError::Parse("flow-depth series has no rows".into()));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != expected) {
            return Err(TransportError::ForcingShape { expected, got: row.len() });
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, step: Timestep) -> &[f64] {
        let k = step.index().saturating_sub(1).min(self.rows.len() - 1);
        &self.rows[k]
    }
}

impl FlowDepthSource for FlowDepthSeries {
    #[inline]
    fn flow_depth_m(&self, step: Timestep, link: LinkId, _network: &RiverNetwork) -> f64 {
        self.row(step)[link.index()]
    }
}

pub fn load_flow_depth_csv(path: &Path, network: &RiverNetwork) -> TransportResult<FlowDepthSeries> {
    let file = std::fs::File::open(path)?;
    load_flow_depth_reader(file, network)
}

/// Like [`load_flow_depth_csv`] but accepts any `Read` source.
pub fn load_flow_depth_reader<R: Read>(reader: R, network: &RiverNetwork) -> TransportResult<FlowDepthSeries> {
    let parse_err = |e: csv::Error| TransportError::Parse(e.to_string());
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers().map_err(parse_err)?;
    for (expected, h) in headers.iter().enumerate() {
        if h.trim().parse::<usize>().ok() != Some(expected) {
            return Err(TransportError::Parse(format!(
                "column {expected} must be headed by link id {expected}, found `{h}`"
            )));
        }
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(parse_err)?;
        let row = record
            .iter()
            .map(|field| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| TransportError::Parse(format!("row {}: `{field}`: {e}", rows.len() + 1)))
            })
            .collect::<TransportResult<Vec<f64>>>()?;
        rows.push(row);
    }
    FlowDepthSeries::new(rows, network)
}
