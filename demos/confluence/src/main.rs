//! confluence: smallest end-to-end run of the rust_nst sediment router.
//!
//! Two tributaries with different lithologies and grain sizes feed a
//! mainstem.  A flood pulse passes through mid-run; parcel snapshots, link
//! summaries and step summaries are written to `output/confluence/`.
//!
//! ```text
//! cargo run -p confluence --release [-- path/to/run.json]
//! ```

mod network;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use nst_core::{LinkId, Timestep};
use nst_network::RiverNetwork;
use nst_output::{CsvWriter, OutputWriter, SimOutputObserver};
use nst_parcel::{
    Attribute, GrainSizeDistribution, GroupBy, InitialParcel, ParcelLedger, ParcelLedgerBuilder, ParcelSeeder, Query,
    Reducer, link_summaries,
};
use nst_sim::{SimBuilder, SimConfig, SimObserver};
use nst_transport::{FlowDepthSeries, StepReport};

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const OUTPUT_DIR:         &str = "output/confluence";
const BED_THICKNESS_M:    f64  = 0.3;
const PARCEL_VOLUME_M3:   f64  = 25.0;
const FLOOD_START_STEP:   usize = 60;
const FLOOD_STEPS:        usize = 48;
const FLOOD_DEPTH_FACTOR: f64  = 2.5;

/// Hourly steps for ten days, daily output.
const DEFAULT_RUN_JSON: &str = r#"{
    "run": {
        "dt_secs": 3600,
        "total_steps": 240,
        "seed": 42,
        "output_interval_steps": 24
    },
    "transport": {
        "porosity": 0.35,
        "formula": { "kind": "wilcock_crowe" },
        "active_layer": { "kind": "grain_size_dependent", "multiplier": 2.0 }
    }
}"#;

// ── Application components ────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Lithology {
    #[default]
    Granite,
    Sandstone,
}

// ── Observer wrapper to count rows ────────────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:         SimOutputObserver<W>,
    snapshot_rows: usize,
    step_rows:     usize,
    peak_export:   Option<StepReport>,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: SimOutputObserver<W>) -> Self {
        Self { inner, snapshot_rows: 0, step_rows: 0, peak_export: None }
    }
}

impl<W: OutputWriter> SimObserver for CountingObserver<W> {
    fn on_step_end(&mut self, report: &StepReport) {
        self.step_rows += 1;
        let busier = self.peak_export.is_none_or(|p| report.exported_volume_m3 > p.exported_volume_m3);
        if busier && report.exported_volume_m3 > 0.0 {
            self.peak_export = Some(*report);
        }
        self.inner.on_step_end(report);
    }

    fn on_snapshot(&mut self, step: Timestep, ledger: &ParcelLedger, network: &RiverNetwork) {
        self.snapshot_rows += ledger.parcel_count();
        self.inner.on_snapshot(step, ledger, network);
    }

    fn on_sim_end(&mut self, final_step: Timestep, ledger: &ParcelLedger) {
        self.inner.on_sim_end(final_step, ledger);
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

/// Coarse granite gravel on the steep tributary, finer sandstone gravel with
/// some sand on the gentle one, mixed gravel along the mainstem.
fn seed_parcels(network: &RiverNetwork, links: [LinkId; 4], seed: u64) -> Result<Vec<(InitialParcel, Lithology)>> {
    let [coarse, fine, mainstem, outlet] = links;
    let bed_volume = |l: LinkId| BED_THICKNESS_M * network.width_m(l) * network.length_m(l);

    let granite = ParcelSeeder::new(
        GrainSizeDistribution::new(vec![0.016, 0.032, 0.064], &[0.3, 0.5, 0.2])?,
        PARCEL_VOLUME_M3,
        seed,
    )?
    .with_abrasion_rate(1e-6)
    .with_arrival_spread(86_400.0);

    let sandstone = ParcelSeeder::new(
        GrainSizeDistribution::new(vec![0.001, 0.008, 0.016], &[0.2, 0.5, 0.3])?,
        PARCEL_VOLUME_M3,
        seed,
    )?
    .with_density(2_350.0)
    .with_abrasion_rate(1e-5)
    .with_arrival_spread(86_400.0);

    let mut parcels = Vec::new();
    for (seeder, lith, link) in [
        (&granite, Lithology::Granite, coarse),
        (&sandstone, Lithology::Sandstone, fine),
        (&granite, Lithology::Granite, mainstem),
        (&sandstone, Lithology::Sandstone, outlet),
    ] {
        let seeded = seeder.seed_link(link, bed_volume(link))?;
        parcels.extend(seeded.into_iter().map(|p| (p, lith)));
    }
    Ok(parcels)
}

/// Baseline depths, multiplied during the flood window.
fn flood_series(network: &RiverNetwork, total_steps: usize) -> Result<FlowDepthSeries> {
    let baseline: Vec<f64> = network.link_ids().map(|l| network.flow_depth_m(l)).collect();
    let flood = FLOOD_START_STEP..FLOOD_START_STEP + FLOOD_STEPS;
    let rows = (0..total_steps.max(1))
        .map(|k| {
            let factor = if flood.contains(&k) { FLOOD_DEPTH_FACTOR } else { 1.0 };
            baseline.iter().map(|d| d * factor).collect()
        })
        .collect();
    Ok(FlowDepthSeries::new(rows, network)?)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => SimConfig::from_json_file(&path)
            .with_context(|| format!("loading run config {}", path.display()))?,
        None => SimConfig::from_json_str(DEFAULT_RUN_JSON)?,
    };
    println!("=== confluence — rust_nst sediment router ===");
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();

    // 1. Network.
    let (network, links) = build_network()?;
    for l in network.link_ids() {
        println!(
            "  link {l}: {:>7.1} m long, slope {:.4}, {:>4.1} m wide",
            network.length_m(l),
            network.slope(l),
            network.width_m(l)
        );
    }

    // 2. Parcels, tagged with their source lithology.
    let seeded = seed_parcels(&network, links, config.run.seed)?;
    let (parcels, lithologies): (Vec<_>, Vec<_>) = seeded.into_iter().unzip();
    let mut ledger = ParcelLedgerBuilder::new(parcels)
        .register_component::<Lithology>()
        .build(&network)?;
    if let Some(slot) = ledger.component_mut::<Lithology>() {
        slot.copy_from_slice(&lithologies);
    }
    let seeded_volume = ledger.current_slice().in_network_volume_m3();
    println!("Seeded {} parcels, {:.1} m³", ledger.parcel_count(), seeded_volume);
    println!();

    // 3. Sim with a flood pulse.
    let forcing = flood_series(&network, config.run.total_steps as usize)?;
    let mut sim = SimBuilder::from_config(config, network, ledger).forcing(forcing).build()?;

    // 4. Output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = CountingObserver::new(SimOutputObserver::new(writer));

    // 5. Run.
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();
    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 6. Summary.
    println!();
    println!("Simulation complete in {:.3} s ({})", elapsed.as_secs_f64(), sim.clock);
    println!("  parcel_snapshots.csv : {} rows", obs.snapshot_rows);
    println!("  step_summaries.csv   : {} rows", obs.step_rows);
    if let Some(peak) = obs.peak_export {
        println!("  peak export          : {:.2} m³ at {}", peak.exported_volume_m3, peak.step);
    }
    println!();

    let end = sim.ledger.last_step();
    println!("{:<6} {:>8} {:>8} {:>12} {:>10}", "Link", "Parcels", "Active", "Volume m³", "D mean mm");
    println!("{}", "-".repeat(48));
    for s in link_summaries(&sim.ledger, end)? {
        println!(
            "{:<6} {:>8} {:>8} {:>12.1} {:>10.2}",
            s.link.to_string(),
            s.parcel_count,
            s.active_count,
            s.total_volume_m3,
            s.mean_diameter_m * 1_000.0
        );
    }
    println!();

    let exported = Query::new(Attribute::Volume)
        .include_out_of_network(true)
        .filter(|p| p.state().is_out_of_network())
        .run_by(&sim.ledger, |p| p.component::<Lithology>().copied().unwrap_or_default())?;
    for (lith, volume) in &exported {
        println!("Exported {lith:?}: {volume:.1} m³");
    }

    let travel = Query::new(Attribute::DistanceTraveled)
        .group_by(GroupBy::StartingLink)
        .reducer(Reducer::Mean)
        .include_out_of_network(true)
        .run(&sim.ledger)?;
    for (link, metres) in &travel {
        println!("Mean travel of parcels seeded on link {link}: {metres:.0} m");
    }

    let slice = sim.ledger.current_slice();
    println!();
    println!(
        "Volume: {:.1} m³ in network, {:.1} m³ exported, {:.1} m³ abraded",
        slice.in_network_volume_m3(),
        slice.exported_volume_m3(),
        seeded_volume - slice.in_network_volume_m3() - slice.exported_volume_m3()
    );
    println!("Mass-balance violations: {}", sim.mass_balance_violations);

    Ok(())
}
