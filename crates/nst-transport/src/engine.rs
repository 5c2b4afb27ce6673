//! The transport step.

use tracing::{debug, warn};

use nst_core::{DomainError, DomainResult, LinkId, ParcelId, Timestep};
use nst_network::RiverNetwork;
use nst_parcel::{ParcelLedger, ParcelSlice};

use crate::active_layer::{bed_surface, partition};
use crate::config::TransporterConfig;
use crate::forcing::FlowDepthSource;
use crate::formula::{BedSurface, FlowConditions, Formula, Grain, SAND_UPPER_DIAMETER_M, TransportFormula};
use crate::{TransportError, TransportResult};

// ── Reports ───────────────────────────────────────────────────────────────────

/// In-network volume that does not match the step's abrasion and export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassBalanceViolation {
    /// `previous − abrasion − exported`.
    pub expected_m3: f64,
    pub actual_m3:   f64,
    pub residual_m3: f64,
}

/// What one committed step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step:                 Timestep,
    /// Elapsed time of the committed slice.
    pub time_secs:            f64,
    pub dt_secs:              f64,
    /// Parcels that travelled a non-zero distance.
    pub moved_parcels:        usize,
    /// Carries of a parcel from one link into the next.  Exits through the
    /// outlet are counted in `exported_parcels` instead.
    pub link_transitions:     usize,
    pub exported_parcels:     usize,
    /// Post-abrasion volume of parcels that left through the outlet this step.
    pub exported_volume_m3:   f64,
    pub abrasion_volume_m3:   f64,
    pub in_network_volume_m3: f64,
    /// Links whose negative flow depth was clamped to zero.
    pub clamped_depths:       usize,
    pub mass_balance:         Option<MassBalanceViolation>,
}

impl StepReport {
    fn idle(step: Timestep, time_secs: f64, in_network_volume_m3: f64) -> Self {
        Self {
            step,
            time_secs,
            dt_secs: 0.0,
            moved_parcels: 0,
            link_transitions: 0,
            exported_parcels: 0,
            exported_volume_m3: 0.0,
            abrasion_volume_m3: 0.0,
            in_network_volume_m3,
            clamped_depths: 0,
            mass_balance: None,
        }
    }
}

// ── Per-link state for one step ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct LinkState {
    flow:        FlowConditions,
    /// Composition of the active layer at the start of the step.
    surface:     Option<BedSurface>,
    thickness_m: f64,
}

/// Outcome of one parcel's scan-ahead.
struct Advance {
    link:        LinkId,
    position:    f64,
    distance_m:  f64,
    arrival:     Option<f64>,
    transitions: usize,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Advances a [`ParcelLedger`] one step at a time over a fixed network.
///
/// # Type parameter
///
/// `F` is the bedload relation.  The default [`Formula`] dispatches on the
/// choice made in [`TransporterConfig::formula`]; any other
/// [`TransportFormula`] can be plugged in with [`with_formula`](Self::with_formula).
pub struct TransportEngine<F: TransportFormula = Formula> {
    pub config:  TransporterConfig,
    pub formula: F,
}

impl TransportEngine<Formula> {
    pub fn new(config: TransporterConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { formula: config.formula, config })
    }
}

impl<F: TransportFormula> TransportEngine<F> {
    /// Use `formula` instead of the configured one.
    pub fn with_formula(config: TransporterConfig, formula: F) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { config, formula })
    }

    /// Compute the next slice from the ledger's current one and append it.
    ///
    /// On error nothing is appended.
    pub fn step<S: FlowDepthSource + ?Sized>(
        &self,
        network: &RiverNetwork,
        ledger:  &mut ParcelLedger,
        forcing: &S,
        dt_secs: f64,
    ) -> TransportResult<StepReport> {
        if ledger.link_count() != network.link_count() {
            return Err(TransportError::LinkCountMismatch {
                network: network.link_count(),
                ledger:  ledger.link_count(),
            });
        }
        if !(dt_secs.is_finite() && dt_secs >= 0.0) {
            return Err(DomainError::InvalidDuration(dt_secs).into());
        }
        let step = ledger.last_step().next();
        let prev = ledger.current_slice();
        let t0 = prev.time_secs;
        let in_prev = prev.in_network_volume_m3();

        if dt_secs == 0.0 {
            let slice = prev.carried_forward(t0);
            ledger.append_timestep(step, slice)?;
            debug!(%step, "zero-duration step carried forward");
            return Ok(StepReport::idle(step, t0, in_prev));
        }

        let (depths, clamped_depths) = resolve_depths(step, network, forcing)?;
        let densities = ledger.densities();
        let abrasion_rates = ledger.abrasion_rates();
        let n = prev.len();

        let mut next = prev.clone();
        next.time_secs = t0 + dt_secs;

        // ③ partition the pre-step bed, ④ active-layer composition.
        let mut members = parcels_by_link(&next, network.link_count());
        let links: Vec<LinkState> = network
            .link_ids()
            .map(|link| {
                let flow = self.flow(network, link, depths[link.index()]);
                let thickness_m = self.repartition(network, link, &flow, &mut members[link.index()], &mut next, densities);
                let active = members[link.index()].iter().filter(|p| next.active[p.index()]);
                LinkState { flow, surface: bed_surface(active, &next, densities), thickness_m }
            })
            .collect();

        let velocity = self.velocities(&next, &links, densities);

        // ⑤ move, links upstream first.  Only parcels that start the step
        // active on a link are moved, so a parcel carried downstream is never
        // moved twice.
        let mut distance = vec![0.0; n];
        let mut exited: Vec<ParcelId> = Vec::new();
        let mut transitions = 0;
        for &link in network.topological_order() {
            for &p in &members[link.index()] {
                let i = p.index();
                if !next.active[i] || velocity[i] <= 0.0 {
                    continue;
                }
                let grain = Grain { diameter_m: next.diameter_m[i], density: densities[i] };
                let adv = self.advance(network, &links, link, next.position[i], velocity[i], grain, t0, dt_secs);

                transitions += adv.transitions;
                distance[i] = adv.distance_m;
                next.distance_traveled_m[i] += adv.distance_m;
                if let Some(t) = adv.arrival {
                    next.arrival_time_secs[i] = t;
                }
                next.link[i] = adv.link;
                if adv.link.is_out_of_network() {
                    // ⑥ export
                    next.position[i] = 0.0;
                    next.active[i] = false;
                    exited.push(p);
                } else {
                    next.position[i] = adv.position;
                }
            }
        }

        // ⑦ re-partition the post-movement bed.
        let mut members = parcels_by_link(&next, network.link_count());
        for link in network.link_ids() {
            let flow = links[link.index()].flow;
            self.repartition(network, link, &flow, &mut members[link.index()], &mut next, densities);
        }

        // ⑧ abrasion
        let mut abrasion = 0.0;
        let mut moved = 0;
        for (i, &d) in distance.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            moved += 1;
            let v0 = next.volume_m3[i];
            let v1 = (v0 * (1.0 - abrasion_rates[i] * d)).max(0.0);
            if v0 > 0.0 && v1 < v0 {
                next.diameter_m[i] *= (v1 / v0).cbrt();
                next.volume_m3[i] = v1;
                abrasion += v0 - v1;
            }
        }

        // ⑨ mass balance
        let exported: f64 = exited.iter().map(|p| next.volume_m3[p.index()]).sum();
        let in_now = next.in_network_volume_m3();
        let expected = in_prev - abrasion - exported;
        let residual = in_now - expected;
        let mass_balance = (residual.abs() / in_prev.abs().max(f64::EPSILON) > self.config.mass_balance_tolerance)
            .then(|| {
                warn!(%step, expected_m3 = expected, actual_m3 = in_now, residual_m3 = residual, "mass balance violated");
                MassBalanceViolation { expected_m3: expected, actual_m3: in_now, residual_m3: residual }
            });

        // ⑩ append
        let time_secs = next.time_secs;
        ledger.append_timestep(step, next)?;

        let report = StepReport {
            step,
            time_secs,
            dt_secs,
            moved_parcels: moved,
            link_transitions: transitions,
            exported_parcels: exited.len(),
            exported_volume_m3: exported,
            abrasion_volume_m3: abrasion,
            in_network_volume_m3: in_now,
            clamped_depths,
            mass_balance,
        };
        debug!(
            %step,
            moved = report.moved_parcels,
            transitions = report.link_transitions,
            exported = report.exported_parcels,
            exported_m3 = report.exported_volume_m3,
            abraded_m3 = report.abrasion_volume_m3,
            "transport step committed"
        );
        Ok(report)
    }

    // ── Hydraulics and velocity ───────────────────────────────────────────

    fn flow(&self, network: &RiverNetwork, link: LinkId, depth_m: f64) -> FlowConditions {
        FlowConditions::new(depth_m, network.slope(link), self.config.fluid_density, self.config.gravity)
    }

    /// Set active flags for the parcels on `link` and return the active-layer
    /// thickness used.
    fn repartition(
        &self,
        network:   &RiverNetwork,
        link:      LinkId,
        flow:      &FlowConditions,
        parcels:   &mut [ParcelId],
        slice:     &mut ParcelSlice,
        densities: &[f64],
    ) -> f64 {
        if parcels.is_empty() {
            return 0.0;
        }
        let thickness_m = bed_surface(parcels.iter(), slice, densities)
            .map_or(0.0, |bed| self.config.active_layer.thickness_m(flow, &bed));
        // A zero-length link holds no bed; everything on it passes through.
        let length_m = network.length_m(link);
        let capacity = if length_m == 0.0 {
            f64::INFINITY
        } else {
            thickness_m * network.width_m(link) * length_m * (1.0 - self.config.porosity)
        };
        partition(parcels, slice, capacity);
        thickness_m
    }

    fn velocity(&self, flow: &FlowConditions, bed: &BedSurface, thickness_m: f64, grain: Grain) -> f64 {
        if flow.shear_stress_pa <= 0.0 || thickness_m <= 0.0 || grain.diameter_m <= 0.0 {
            return 0.0;
        }
        let q = self.formula.unit_flux(flow, bed, grain);
        if !(q.is_finite() && q > 0.0) {
            return 0.0;
        }
        q / ((1.0 - self.config.porosity) * thickness_m)
    }

    /// Velocity of a parcel on `state`'s link.  A link with no active layer
    /// is treated as covered by the parcel's own grain.
    fn velocity_on(&self, state: &LinkState, grain: Grain) -> f64 {
        match state.surface {
            Some(bed) => self.velocity(&state.flow, &bed, state.thickness_m, grain),
            None => {
                let bed = BedSurface {
                    mean_diameter_m: grain.diameter_m,
                    sand_fraction:   if grain.diameter_m < SAND_UPPER_DIAMETER_M { 1.0 } else { 0.0 },
                    mean_density:    grain.density,
                };
                let thickness_m = self.config.active_layer.thickness_m(&state.flow, &bed);
                self.velocity(&state.flow, &bed, thickness_m, grain)
            }
        }
    }

    fn velocities(&self, slice: &ParcelSlice, links: &[LinkState], densities: &[f64]) -> Vec<f64> {
        let compute = |i: usize| -> f64 {
            let link = slice.link[i];
            if link.is_out_of_network() || !slice.active[i] {
                return 0.0;
            }
            let grain = Grain { diameter_m: slice.diameter_m[i], density: densities[i] };
            self.velocity_on(&links[link.index()], grain)
        };

        #[cfg(not(feature = "parallel"))]
        {
            (0..slice.len()).map(compute).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            (0..slice.len()).into_par_iter().map(compute).collect()
        }
    }

    // ── Scan-ahead ────────────────────────────────────────────────────────

    /// Move one parcel for `dt` seconds starting at `position` on `link`.
    ///
    /// Each pass either stops the parcel inside a link or carries it over a
    /// link end, so `link_count + 1` passes always suffice on an acyclic
    /// network.  Zero-length links are crossed at no time cost.
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        network:  &RiverNetwork,
        links:    &[LinkState],
        mut link: LinkId,
        position: f64,
        velocity: f64,
        grain:    Grain,
        t0:       f64,
        dt:       f64,
    ) -> Advance {
        let mut out = Advance { link, position, distance_m: 0.0, arrival: None, transitions: 0 };
        let mut v = velocity;
        let mut remaining = dt;

        for _ in 0..=network.link_count() {
            if v <= 0.0 {
                break;
            }
            let length = network.length_m(link);
            let to_end = (1.0 - out.position) * length;
            if to_end > 0.0 {
                let time_to_end = to_end / v;
                if time_to_end > remaining {
                    let d = v * remaining;
                    out.distance_m += d;
                    out.position = (out.position + d / length).min(1.0);
                    break;
                }
                remaining -= time_to_end;
                out.distance_m += to_end;
            }

            let crossed_at = t0 + (dt - remaining);
            out.arrival = Some(crossed_at);
            match network.downstream(link) {
                None => {
                    out.link = LinkId::OUT_OF_NETWORK;
                    out.position = 0.0;
                    return out;
                }
                Some(down) => {
                    link = down;
                    out.link = down;
                    out.position = 0.0;
                    out.transitions += 1;
                    v = self.velocity_on(&links[down.index()], grain);
                }
            }
        }
        out
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Flow depth per link for `step`: non-finite values are rejected, negative
/// ones clamped to zero.  Returns the depths and the number clamped.
fn resolve_depths<S: FlowDepthSource + ?Sized>(
    step:    Timestep,
    network: &RiverNetwork,
    forcing: &S,
) -> DomainResult<(Vec<f64>, usize)> {
    let mut clamped = 0;
    let depths = network
        .link_ids()
        .map(|link| {
            let depth = forcing.flow_depth_m(step, link, network);
            if !depth.is_finite() {
                return Err(DomainError::NonFiniteFlowDepth { link, depth });
            }
            if depth < 0.0 {
                warn!(%step, %link, depth, "negative flow depth clamped to zero");
                clamped += 1;
                return Ok(0.0);
            }
            Ok(depth)
        })
        .collect::<DomainResult<Vec<f64>>>()?;
    Ok((depths, clamped))
}

/// In-network parcels grouped by their link in `slice`.
fn parcels_by_link(slice: &ParcelSlice, link_count: usize) -> Vec<Vec<ParcelId>> {
    let mut members = vec![Vec::new(); link_count];
    for p in slice.parcel_ids() {
        let link = slice.link[p.index()];
        if !link.is_out_of_network() {
            members[link.index()].push(p);
        }
    }
    members
}
