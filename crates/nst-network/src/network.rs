//! River network representation and builder.
//!
//! # Data layout
//!
//! Links are stored as parallel arrays indexed by `LinkId`.  Each link
//! carries its reach geometry (length, slope, width, baseline flow depth) and
//! its single downstream link.  Upstream adjacency is stored in **Compressed
//! Sparse Row** form: the links draining into link `l` occupy
//!
//! ```text
//! upstream_links[ upstream_start[l] .. upstream_start[l+1] ]
//! ```
//!
//! `build()` also precomputes the upstream-to-downstream topological order
//! consumed by the transport engine every step.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps projected `(x, y)` to the nearest `NodeId`.
//! Used at load time to snap sediment source locations onto the network.

use std::collections::VecDeque;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use nst_core::{LinkId, NodeId, PlanarPoint};

use crate::ConfigurationError;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── LinkGeometry ──────────────────────────────────────────────────────────────

/// Reach geometry and baseline hydraulics for one link.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinkGeometry {
    /// Reach length in metres.  Zero is allowed (degenerate junction reach).
    pub length_m:     f64,
    /// Channel bed slope (m/m).
    pub slope:        f64,
    /// Channel width in metres.
    pub width_m:      f64,
    /// Baseline flow depth in metres, used when no forcing series is given.
    pub flow_depth_m: f64,
}

impl LinkGeometry {
    pub fn new(length_m: f64, slope: f64, width_m: f64, flow_depth_m: f64) -> Self {
        Self { length_m, slope, width_m, flow_depth_m }
    }
}

// ── RiverNetwork ──────────────────────────────────────────────────────────────

/// Directed river network draining to a single outlet.
///
/// All per-link fields are `pub` for direct indexed access on hot paths.  Do
/// not construct directly; use [`RiverNetworkBuilder`], which enforces the
/// topology contract.
pub struct RiverNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Projected position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<PlanarPoint>,

    /// Bed elevation of each node in metres.
    pub node_elevation_m: Vec<f64>,

    // ── Link data (indexed by LinkId) ─────────────────────────────────────
    pub link_upstream_node:   Vec<NodeId>,
    pub link_downstream_node: Vec<NodeId>,
    pub link_length_m:        Vec<f64>,
    pub link_slope:           Vec<f64>,
    pub link_width_m:         Vec<f64>,
    pub link_flow_depth_m:    Vec<f64>,

    /// Single downstream link; `LinkId::INVALID` for the outlet.
    pub downstream_link: Vec<LinkId>,

    // ── Derived topology ──────────────────────────────────────────────────
    upstream_start: Vec<u32>,
    upstream_links: Vec<LinkId>,
    /// Link draining each node, `LinkId::INVALID` for the terminal node.
    node_out_link:  Vec<LinkId>,
    topo_order:     Vec<LinkId>,
    outlet:         LinkId,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<NodeEntry>,
}

impl RiverNetwork {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_length_m.len()
    }

    /// `true` if `link` indexes a real link of this network.
    #[inline]
    pub fn contains_link(&self, link: LinkId) -> bool {
        link.index() < self.link_count()
    }

    // ── Per-link accessors ────────────────────────────────────────────────

    #[inline]
    pub fn length_m(&self, link: LinkId) -> f64 {
        self.link_length_m[link.index()]
    }

    #[inline]
    pub fn slope(&self, link: LinkId) -> f64 {
        self.link_slope[link.index()]
    }

    #[inline]
    pub fn width_m(&self, link: LinkId) -> f64 {
        self.link_width_m[link.index()]
    }

    #[inline]
    pub fn flow_depth_m(&self, link: LinkId) -> f64 {
        self.link_flow_depth_m[link.index()]
    }

    /// The link receiving flow from `link`, or `None` at the outlet.
    #[inline]
    pub fn downstream(&self, link: LinkId) -> Option<LinkId> {
        let d = self.downstream_link[link.index()];
        d.is_valid().then_some(d)
    }

    /// Links draining directly into `link`.  Contiguous slice, no allocation.
    #[inline]
    pub fn upstream(&self, link: LinkId) -> &[LinkId] {
        let start = self.upstream_start[link.index()] as usize;
        let end   = self.upstream_start[link.index() + 1] as usize;
        &self.upstream_links[start..end]
    }

    /// The single link through which sediment leaves the network.
    #[inline]
    pub fn outlet(&self) -> LinkId {
        self.outlet
    }

    #[inline]
    pub fn is_outlet(&self, link: LinkId) -> bool {
        link == self.outlet
    }

    /// Every link, each appearing after all links upstream of it.
    #[inline]
    pub fn topological_order(&self) -> &[LinkId] {
        &self.topo_order
    }

    /// Iterator over all `LinkId`s in index order.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.link_count() as u32).map(LinkId)
    }

    /// The link draining `node`, or `None` for the terminal node.
    pub fn link_draining(&self, node: NodeId) -> Option<LinkId> {
        self.node_out_link
            .get(node.index())
            .copied()
            .filter(|l| l.is_valid())
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos`.  `None` only if the network has no nodes.
    pub fn nearest_node(&self, pos: PlanarPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.x, pos.y])
            .map(|e| e.id)
    }

    /// The link a sediment source at `pos` feeds: the link draining the
    /// nearest node, or the outlet when that node is the terminal node.
    pub fn nearest_link(&self, pos: PlanarPoint) -> Option<LinkId> {
        let node = self.nearest_node(pos)?;
        self.link_draining(node).or(Some(self.outlet))
    }
}

// ── RiverNetworkBuilder ───────────────────────────────────────────────────────

/// Construct a [`RiverNetwork`] incrementally, then call [`build`](Self::build).
///
/// Links keep their insertion order as `LinkId`.  `build()` validates the
/// topology and geometry, derives downstream/upstream adjacency and the
/// topological order, and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use nst_core::PlanarPoint;
/// use nst_network::{LinkGeometry, RiverNetworkBuilder};
///
/// let mut b = RiverNetworkBuilder::new();
/// let head = b.add_node(PlanarPoint::new(0.0, 0.0), 12.0);
/// let mid  = b.add_node(PlanarPoint::new(0.0, 1_000.0), 7.0);
/// let out  = b.add_node(PlanarPoint::new(0.0, 2_000.0), 2.0);
/// let a = b.add_link(head, mid, LinkGeometry::new(1_000.0, 0.005, 10.0, 1.5));
/// let c = b.add_link(mid, out, LinkGeometry::new(1_000.0, 0.005, 12.0, 1.8));
/// let net = b.build().unwrap();
/// assert_eq!(net.downstream(a), Some(c));
/// assert!(net.is_outlet(c));
/// ```
pub struct RiverNetworkBuilder {
    nodes:      Vec<PlanarPoint>,
    elevations: Vec<f64>,
    raw_links:  Vec<RawLink>,
    min_slope:  f64,
}

struct RawLink {
    upstream:   NodeId,
    downstream: NodeId,
    geometry:   Option<LinkGeometry>,
    /// Width and flow depth for links whose length/slope come from nodes.
    width_m:      f64,
    flow_depth_m: f64,
}

impl RiverNetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      Vec::new(),
            elevations: Vec::new(),
            raw_links:  Vec::new(),
            min_slope:  0.0,
        }
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes:      Vec::with_capacity(nodes),
            elevations: Vec::with_capacity(nodes),
            raw_links:  Vec::with_capacity(links),
            min_slope:  0.0,
        }
    }

    /// Floor applied to slopes derived from node elevations.
    pub fn min_slope(mut self, min_slope: f64) -> Self {
        self.min_slope = min_slope;
        self
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: PlanarPoint, elevation_m: f64) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.elevations.push(elevation_m);
        id
    }

    /// Add a link flowing from `upstream` to `downstream` with explicit
    /// geometry.
    pub fn add_link(&mut self, upstream: NodeId, downstream: NodeId, geometry: LinkGeometry) -> LinkId {
        let id = LinkId(self.raw_links.len() as u32);
        self.raw_links.push(RawLink {
            upstream,
            downstream,
            geometry: Some(geometry),
            width_m: geometry.width_m,
            flow_depth_m: geometry.flow_depth_m,
        });
        id
    }

    /// Add a link whose length is the straight-line distance between its
    /// nodes and whose slope is the elevation drop over that length,
    /// floored at [`min_slope`](Self::min_slope).
    pub fn add_link_from_nodes(
        &mut self,
        upstream:     NodeId,
        downstream:   NodeId,
        width_m:      f64,
        flow_depth_m: f64,
    ) -> LinkId {
        let id = LinkId(self.raw_links.len() as u32);
        self.raw_links.push(RawLink { upstream, downstream, geometry: None, width_m, flow_depth_m });
        id
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.raw_links.len() }

    /// Validate and consume the builder.
    ///
    /// Time complexity: O(L) for adjacency and topological sort plus
    /// O(N log N) for the R-tree bulk load.
    pub fn build(self) -> Result<RiverNetwork, ConfigurationError> {
        let node_count = self.nodes.len();
        let link_count = self.raw_links.len();
        if link_count == 0 {
            return Err(ConfigurationError::Empty);
        }

        // ── Endpoints and geometry ────────────────────────────────────────
        let mut geometry = Vec::with_capacity(link_count);
        for (i, raw) in self.raw_links.iter().enumerate() {
            let link = LinkId(i as u32);
            for node in [raw.upstream, raw.downstream] {
                if node.index() >= node_count {
                    return Err(ConfigurationError::UnknownNode { link, node });
                }
            }
            if raw.upstream == raw.downstream {
                return Err(ConfigurationError::SelfLoop { link, node: raw.upstream });
            }
            let g = match raw.geometry {
                Some(g) => g,
                None => {
                    let up = raw.upstream.index();
                    let down = raw.downstream.index();
                    let length_m = self.nodes[up].distance_m(self.nodes[down]);
                    let drop = self.elevations[up] - self.elevations[down];
                    let slope = if length_m > 0.0 { drop / length_m } else { 0.0 };
                    LinkGeometry {
                        length_m,
                        slope: slope.max(self.min_slope),
                        width_m: raw.width_m,
                        flow_depth_m: raw.flow_depth_m,
                    }
                }
            };
            validate_geometry(link, &g)?;
            geometry.push(g);
        }

        // ── Downstream adjacency ──────────────────────────────────────────
        let mut node_out_link = vec![LinkId::INVALID; node_count];
        for (i, raw) in self.raw_links.iter().enumerate() {
            let slot = &mut node_out_link[raw.upstream.index()];
            if slot.is_valid() {
                return Err(ConfigurationError::Distributary {
                    node:   raw.upstream,
                    first:  *slot,
                    second: LinkId(i as u32),
                });
            }
            *slot = LinkId(i as u32);
        }
        let downstream_link: Vec<LinkId> = self
            .raw_links
            .iter()
            .map(|raw| node_out_link[raw.downstream.index()])
            .collect();

        // ── Upstream CSR ──────────────────────────────────────────────────
        let mut upstream_start = vec![0u32; link_count + 1];
        for d in downstream_link.iter().filter(|d| d.is_valid()) {
            upstream_start[d.index() + 1] += 1;
        }
        for i in 1..=link_count {
            upstream_start[i] += upstream_start[i - 1];
        }
        let mut fill = upstream_start.clone();
        let mut upstream_links = vec![LinkId::INVALID; upstream_start[link_count] as usize];
        for (i, d) in downstream_link.iter().enumerate() {
            if d.is_valid() {
                let slot = &mut fill[d.index()];
                upstream_links[*slot as usize] = LinkId(i as u32);
                *slot += 1;
            }
        }

        // ── Topological order (Kahn) ──────────────────────────────────────
        let topo_order = topological_order(&downstream_link, &upstream_start)?;

        // ── Single outlet ─────────────────────────────────────────────────
        let outlets: Vec<LinkId> = downstream_link
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_valid())
            .map(|(i, _)| LinkId(i as u32))
            .collect();
        // Acyclic and non-empty guarantees at least one outlet.
        if outlets.len() > 1 {
            return Err(ConfigurationError::MultipleOutlets(outlets));
        }
        let outlet = outlets[0];

        // ── R-tree ────────────────────────────────────────────────────────
        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, p)| NodeEntry { point: [p.x, p.y], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        Ok(RiverNetwork {
            node_pos:             self.nodes,
            node_elevation_m:     self.elevations,
            link_upstream_node:   self.raw_links.iter().map(|r| r.upstream).collect(),
            link_downstream_node: self.raw_links.iter().map(|r| r.downstream).collect(),
            link_length_m:        geometry.iter().map(|g| g.length_m).collect(),
            link_slope:           geometry.iter().map(|g| g.slope).collect(),
            link_width_m:         geometry.iter().map(|g| g.width_m).collect(),
            link_flow_depth_m:    geometry.iter().map(|g| g.flow_depth_m).collect(),
            downstream_link,
            upstream_start,
            upstream_links,
            node_out_link,
            topo_order,
            outlet,
            spatial_idx,
        })
    }
}

impl Default for RiverNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Build helpers ─────────────────────────────────────────────────────────────

fn validate_geometry(link: LinkId, g: &LinkGeometry) -> Result<(), ConfigurationError> {
    let bad = |field, value| Err(ConfigurationError::InvalidGeometry { link, field, value });
    if !g.length_m.is_finite() || g.length_m < 0.0 {
        return bad("length_m", g.length_m);
    }
    if !g.slope.is_finite() || g.slope < 0.0 {
        return bad("slope", g.slope);
    }
    if !g.width_m.is_finite() || g.width_m <= 0.0 {
        return bad("width_m", g.width_m);
    }
    if !g.flow_depth_m.is_finite() || g.flow_depth_m < 0.0 {
        return bad("flow_depth_m", g.flow_depth_m);
    }
    Ok(())
}

/// Kahn's algorithm over the link graph.  Headwater links are seeded in
/// ascending `LinkId` order so the result is deterministic.
fn topological_order(
    downstream_link: &[LinkId],
    upstream_start:  &[u32],
) -> Result<Vec<LinkId>, ConfigurationError> {
    let link_count = downstream_link.len();
    let mut pending: Vec<u32> = (0..link_count)
        .map(|i| upstream_start[i + 1] - upstream_start[i])
        .collect();

    let mut queue: VecDeque<LinkId> = (0..link_count)
        .filter(|&i| pending[i] == 0)
        .map(|i| LinkId(i as u32))
        .collect();

    let mut order = Vec::with_capacity(link_count);
    while let Some(link) = queue.pop_front() {
        order.push(link);
        let d = downstream_link[link.index()];
        if d.is_valid() {
            pending[d.index()] -= 1;
            if pending[d.index()] == 0 {
                queue.push_back(d);
            }
        }
    }

    if order.len() < link_count {
        // Every leftover link either sits on a cycle or drains into one;
        // walking downstream link_count times is guaranteed to land on it.
        let mut link = LinkId(pending.iter().position(|&p| p > 0).unwrap_or(0) as u32);
        for _ in 0..link_count {
            link = downstream_link[link.index()];
        }
        return Err(ConfigurationError::Cycle { link });
    }
    Ok(order)
}
