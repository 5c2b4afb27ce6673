//! Parquet output backend (feature `parquet`).
//!
//! Creates three files in the configured output directory:
//! - `parcel_snapshots.parquet`
//! - `link_summaries.parquet`
//! - `step_summaries.parquet`
//!
//! `position` is the only nullable column (null for out-of-network parcels).

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Array, Float64Builder, UInt32Builder, UInt64Array, UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{LinkSummaryRow, OutputResult, ParcelSnapshotRow, StepSummaryRow};

fn parcel_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("parcel_id",           DataType::UInt32,  false),
        Field::new("step",                DataType::UInt64,  false),
        Field::new("time_secs",           DataType::Float64, false),
        Field::new("link_id",             DataType::UInt32,  false),
        Field::new("position",            DataType::Float64, true),
        Field::new("volume_m3",           DataType::Float64, false),
        Field::new("diameter_m",          DataType::Float64, false),
        Field::new("active",              DataType::Boolean, false),
        Field::new("arrival_time_secs",   DataType::Float64, false),
        Field::new("distance_traveled_m", DataType::Float64, false),
    ]))
}

fn link_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("step",             DataType::UInt64,  false),
        Field::new("link_id",          DataType::UInt32,  false),
        Field::new("parcel_count",     DataType::UInt64,  false),
        Field::new("active_count",     DataType::UInt64,  false),
        Field::new("total_volume_m3",  DataType::Float64, false),
        Field::new("active_volume_m3", DataType::Float64, false),
        Field::new("mean_diameter_m",  DataType::Float64, false),
    ]))
}

fn step_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("step",                     DataType::UInt64,  false),
        Field::new("time_secs",                DataType::Float64, false),
        Field::new("moved_parcels",            DataType::UInt64,  false),
        Field::new("link_transitions",         DataType::UInt64,  false),
        Field::new("exported_parcels",         DataType::UInt64,  false),
        Field::new("exported_volume_m3",       DataType::Float64, false),
        Field::new("abrasion_volume_m3",       DataType::Float64, false),
        Field::new("in_network_volume_m3",     DataType::Float64, false),
        Field::new("mass_balance_residual_m3", DataType::Float64, false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// One open Parquet file and its schema.
struct Table {
    writer: Option<ArrowWriter<File>>,
    schema: Arc<Schema>,
}

impl Table {
    fn create(path: &Path, schema: Arc<Schema>) -> OutputResult<Self> {
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { writer: Some(writer), schema })
    }

    fn write(&mut self, columns: Vec<ArrayRef>) -> OutputResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns)?;
        writer.write(&batch)?;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}

/// Writes simulation output to three Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footers; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    parcels: Table,
    links:   Table,
    steps:   Table,
}

impl ParquetWriter {
    /// Create the three Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            parcels: Table::create(&dir.join("parcel_snapshots.parquet"), parcel_schema())?,
            links:   Table::create(&dir.join("link_summaries.parquet"), link_schema())?,
            steps:   Table::create(&dir.join("step_summaries.parquet"), step_schema())?,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_parcel_snapshots(&mut self, rows: &[ParcelSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut parcel_ids = UInt32Builder::new();
        let mut steps      = UInt64Builder::new();
        let mut times      = Float64Builder::new();
        let mut link_ids   = UInt32Builder::new();
        let mut positions  = Float64Builder::new();
        let mut volumes    = Float64Builder::new();
        let mut diameters  = Float64Builder::new();
        let mut actives    = BooleanBuilder::new();
        let mut arrivals   = Float64Builder::new();
        let mut distances  = Float64Builder::new();

        for row in rows {
            parcel_ids.append_value(row.parcel_id);
            steps.append_value(row.step);
            times.append_value(row.time_secs);
            link_ids.append_value(row.link_id);
            positions.append_option(row.position);
            volumes.append_value(row.volume_m3);
            diameters.append_value(row.diameter_m);
            actives.append_value(row.active);
            arrivals.append_value(row.arrival_time_secs);
            distances.append_value(row.distance_traveled_m);
        }

        self.parcels.write(vec![
            Arc::new(parcel_ids.finish()),
            Arc::new(steps.finish()),
            Arc::new(times.finish()),
            Arc::new(link_ids.finish()),
            Arc::new(positions.finish()),
            Arc::new(volumes.finish()),
            Arc::new(diameters.finish()),
            Arc::new(actives.finish()),
            Arc::new(arrivals.finish()),
            Arc::new(distances.finish()),
        ])
    }

    fn write_link_summaries(&mut self, rows: &[LinkSummaryRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut steps          = UInt64Builder::new();
        let mut link_ids       = UInt32Builder::new();
        let mut parcel_counts  = UInt64Builder::new();
        let mut active_counts  = UInt64Builder::new();
        let mut total_volumes  = Float64Builder::new();
        let mut active_volumes = Float64Builder::new();
        let mut mean_diameters = Float64Builder::new();

        for row in rows {
            steps.append_value(row.step);
            link_ids.append_value(row.link_id);
            parcel_counts.append_value(row.parcel_count);
            active_counts.append_value(row.active_count);
            total_volumes.append_value(row.total_volume_m3);
            active_volumes.append_value(row.active_volume_m3);
            mean_diameters.append_value(row.mean_diameter_m);
        }

        self.links.write(vec![
            Arc::new(steps.finish()),
            Arc::new(link_ids.finish()),
            Arc::new(parcel_counts.finish()),
            Arc::new(active_counts.finish()),
            Arc::new(total_volumes.finish()),
            Arc::new(active_volumes.finish()),
            Arc::new(mean_diameters.finish()),
        ])
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt64Array::from(vec![row.step])),
            Arc::new(Float64Array::from(vec![row.time_secs])),
            Arc::new(UInt64Array::from(vec![row.moved_parcels])),
            Arc::new(UInt64Array::from(vec![row.link_transitions])),
            Arc::new(UInt64Array::from(vec![row.exported_parcels])),
            Arc::new(Float64Array::from(vec![row.exported_volume_m3])),
            Arc::new(Float64Array::from(vec![row.abrasion_volume_m3])),
            Arc::new(Float64Array::from(vec![row.in_network_volume_m3])),
            Arc::new(Float64Array::from(vec![row.mass_balance_residual_m3])),
        ];
        self.steps.write(columns)
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.parcels.close()?;
        self.links.close()?;
        self.steps.close()
    }
}
