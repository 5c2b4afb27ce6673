//! Bedload transport relations.
//!
//! A [`TransportFormula`] maps the flow on a link and the composition of its
//! active layer to the unit-width bedload flux (m²/s) of one grain class,
//! assuming that class fully covers the bed.  The engine turns the flux into
//! a parcel's virtual velocity:
//!
//! ```text
//! v = q / ((1 − porosity) × L_active)
//! ```
//!
//! Both relations return zero for zero shear stress.

use serde::{Deserialize, Serialize};

/// Flow on a link for the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowConditions {
    /// Depth-slope product bed shear stress `ρ g H S`, Pa.
    pub shear_stress_pa: f64,
    pub fluid_density:   f64,
    pub gravity:         f64,
}

impl FlowConditions {
    pub fn new(depth_m: f64, slope: f64, fluid_density: f64, gravity: f64) -> Self {
        Self {
            shear_stress_pa: fluid_density * gravity * depth_m * slope,
            fluid_density,
            gravity,
        }
    }

    /// `√(τ / ρ)`.
    pub fn shear_velocity(&self) -> f64 {
        (self.shear_stress_pa / self.fluid_density).sqrt()
    }

    /// Submerged specific gravity `ρs / ρ − 1` of sediment with density `rho_s`.
    pub fn submerged_specific_gravity(&self, rho_s: f64) -> f64 {
        rho_s / self.fluid_density - 1.0
    }

    /// Shields number of a grain of diameter `d` and density `rho_s`.
    pub fn shields(&self, d: f64, rho_s: f64) -> f64 {
        self.shear_stress_pa / (self.fluid_density * self.submerged_specific_gravity(rho_s) * self.gravity * d)
    }
}

/// Composition of a link's active layer, volume-weighted over active parcels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedSurface {
    pub mean_diameter_m: f64,
    /// Volume fraction finer than 2 mm.
    pub sand_fraction:   f64,
    pub mean_density:    f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grain {
    pub diameter_m: f64,
    pub density:    f64,
}

pub const SAND_UPPER_DIAMETER_M: f64 = 0.002;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// A bedload relation.  Implementations must return a finite value `≥ 0`.
pub trait TransportFormula: Send + Sync {
    fn unit_flux(&self, flow: &FlowConditions, bed: &BedSurface, grain: Grain) -> f64;
}

// ── Wilcock & Crowe (2003) ────────────────────────────────────────────────────

/// Surface-based mixed-size relation with a sand-dependent reference stress
/// and a hiding function.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WilcockCrowe;

impl TransportFormula for WilcockCrowe {
    fn unit_flux(&self, flow: &FlowConditions, bed: &BedSurface, grain: Grain) -> f64 {
        let tau = flow.shear_stress_pa;
        if tau <= 0.0 {
            return 0.0;
        }
        let r_mean = flow.submerged_specific_gravity(bed.mean_density);
        let tau_rsg = flow.fluid_density
            * r_mean
            * flow.gravity
            * bed.mean_diameter_m
            * (0.021 + 0.015 * (-20.0 * bed.sand_fraction).exp());

        let ratio = grain.diameter_m / bed.mean_diameter_m;
        let b = 0.67 / (1.0 + (1.5 - ratio).exp());
        let tau_ri = tau_rsg * ratio.powf(b);
        let phi = tau / tau_ri;

        let w = if phi < 1.35 {
            0.002 * phi.powf(7.5)
        } else {
            14.0 * (1.0 - 0.894 / phi.sqrt()).powf(4.5)
        };

        // W* = R g q / u*³
        let r = flow.submerged_specific_gravity(grain.density);
        w * flow.shear_velocity().powi(3) / (r * flow.gravity)
    }
}

// ── Meyer-Peter & Müller ──────────────────────────────────────────────────────

/// Excess-Shields-stress relation `q* = a (τ* − τ*c)^n`.
///
/// The default coefficients are the Wong & Parker (2006) correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeyerPeterMuller {
    pub coefficient:      f64,
    pub exponent:         f64,
    pub critical_shields: f64,
}

impl Default for MeyerPeterMuller {
    fn default() -> Self {
        Self { coefficient: 3.97, exponent: 1.5, critical_shields: 0.0495 }
    }
}

impl MeyerPeterMuller {
    /// The original 1948 coefficients.
    pub fn classic() -> Self {
        Self { coefficient: 8.0, exponent: 1.5, critical_shields: 0.047 }
    }
}

impl TransportFormula for MeyerPeterMuller {
    fn unit_flux(&self, flow: &FlowConditions, _bed: &BedSurface, grain: Grain) -> f64 {
        let excess = flow.shields(grain.diameter_m, grain.density) - self.critical_shields;
        if excess <= 0.0 {
            return 0.0;
        }
        let r = flow.submerged_specific_gravity(grain.density);
        let q_star = self.coefficient * excess.powf(self.exponent);
        q_star * (r * flow.gravity * grain.diameter_m).sqrt() * grain.diameter_m
    }
}

// ── Config-selected formula ───────────────────────────────────────────────────

/// The formula named in a [`TransporterConfig`](crate::TransporterConfig).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formula {
    WilcockCrowe,
    MeyerPeterMuller(MeyerPeterMuller),
}

impl Default for Formula {
    fn default() -> Self {
        Formula::WilcockCrowe
    }
}

impl TransportFormula for Formula {
    fn unit_flux(&self, flow: &FlowConditions, bed: &BedSurface, grain: Grain) -> f64 {
        match self {
            Formula::WilcockCrowe        => WilcockCrowe.unit_flux(flow, bed, grain),
            Formula::MeyerPeterMuller(f) => f.unit_flux(flow, bed, grain),
        }
    }
}
