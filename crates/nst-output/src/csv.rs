//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `parcel_snapshots.csv`
//! - `link_summaries.csv`
//! - `step_summaries.csv`
//!
//! Out-of-network parcels have an empty `position` field.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{LinkSummaryRow, OutputResult, ParcelSnapshotRow, StepSummaryRow};

pub const PARCEL_HEADER: [&str; 10] = [
    "parcel_id",
    "step",
    "time_secs",
    "link_id",
    "position",
    "volume_m3",
    "diameter_m",
    "active",
    "arrival_time_secs",
    "distance_traveled_m",
];

pub const LINK_HEADER: [&str; 7] = [
    "step",
    "link_id",
    "parcel_count",
    "active_count",
    "total_volume_m3",
    "active_volume_m3",
    "mean_diameter_m",
];

pub const STEP_HEADER: [&str; 9] = [
    "step",
    "time_secs",
    "moved_parcels",
    "link_transitions",
    "exported_parcels",
    "exported_volume_m3",
    "abrasion_volume_m3",
    "in_network_volume_m3",
    "mass_balance_residual_m3",
];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    parcels:  Writer<File>,
    links:    Writer<File>,
    steps:    Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut parcels = Writer::from_path(dir.join("parcel_snapshots.csv"))?;
        parcels.write_record(PARCEL_HEADER)?;

        let mut links = Writer::from_path(dir.join("link_summaries.csv"))?;
        links.write_record(LINK_HEADER)?;

        let mut steps = Writer::from_path(dir.join("step_summaries.csv"))?;
        steps.write_record(STEP_HEADER)?;

        Ok(Self { parcels, links, steps, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_parcel_snapshots(&mut self, rows: &[ParcelSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.parcels.write_record(&[
                row.parcel_id.to_string(),
                row.step.to_string(),
                row.time_secs.to_string(),
                row.link_id.to_string(),
                row.position.map(|p| p.to_string()).unwrap_or_default(),
                row.volume_m3.to_string(),
                row.diameter_m.to_string(),
                (row.active as u8).to_string(),
                row.arrival_time_secs.to_string(),
                row.distance_traveled_m.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_link_summaries(&mut self, rows: &[LinkSummaryRow]) -> OutputResult<()> {
        for row in rows {
            self.links.write_record(&[
                row.step.to_string(),
                row.link_id.to_string(),
                row.parcel_count.to_string(),
                row.active_count.to_string(),
                row.total_volume_m3.to_string(),
                row.active_volume_m3.to_string(),
                row.mean_diameter_m.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.steps.write_record(&[
            row.step.to_string(),
            row.time_secs.to_string(),
            row.moved_parcels.to_string(),
            row.link_transitions.to_string(),
            row.exported_parcels.to_string(),
            row.exported_volume_m3.to_string(),
            row.abrasion_volume_m3.to_string(),
            row.in_network_volume_m3.to_string(),
            row.mass_balance_residual_m3.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.parcels.flush()?;
        self.links.flush()?;
        self.steps.flush()?;
        Ok(())
    }
}
