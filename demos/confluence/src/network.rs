//! Synthetic two-tributary catchment.
//!
//! ```text
//!   coarse_head      fine_head
//!        \ L0          / L1
//!         \           /
//!          confluence
//!              |  L2
//!           mid_reach
//!              |  L3 (outlet)
//!            mouth
//! ```
//!
//! Lengths come from node coordinates and slopes from node elevations.

use nst_core::{LinkId, PlanarPoint};
use nst_network::{RiverNetwork, RiverNetworkBuilder};

/// Returns `(network, [coarse_trib, fine_trib, mainstem, outlet])`.
pub fn build_network() -> anyhow::Result<(RiverNetwork, [LinkId; 4])> {
    let mut b = RiverNetworkBuilder::with_capacity(5, 4).min_slope(1e-4);

    let coarse_head = b.add_node(PlanarPoint::new(-1_200.0, 1_600.0), 62.0);
    let fine_head   = b.add_node(PlanarPoint::new(1_500.0, 1_800.0), 48.0);
    let confluence  = b.add_node(PlanarPoint::new(0.0, 0.0), 30.0);
    let mid_reach   = b.add_node(PlanarPoint::new(300.0, -2_500.0), 18.0);
    let mouth       = b.add_node(PlanarPoint::new(500.0, -5_000.0), 10.0);

    let coarse_trib = b.add_link_from_nodes(coarse_head, confluence, 8.0, 0.8);
    let fine_trib   = b.add_link_from_nodes(fine_head, confluence, 6.0, 0.7);
    let mainstem    = b.add_link_from_nodes(confluence, mid_reach, 14.0, 1.2);
    let outlet      = b.add_link_from_nodes(mid_reach, mouth, 16.0, 1.4);

    Ok((b.build()?, [coarse_trib, fine_trib, mainstem, outlet]))
}
