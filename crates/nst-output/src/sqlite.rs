//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `parcel_snapshots`, `link_summaries` and `step_summaries`.
//! Out-of-network parcels store `NULL` for `position`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{LinkSummaryRow, OutputResult, ParcelSnapshotRow, StepSummaryRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS parcel_snapshots (
                 parcel_id           INTEGER NOT NULL,
                 step                INTEGER NOT NULL,
                 time_secs           REAL    NOT NULL,
                 link_id             INTEGER NOT NULL,
                 position            REAL,
                 volume_m3           REAL    NOT NULL,
                 diameter_m          REAL    NOT NULL,
                 active              INTEGER NOT NULL,
                 arrival_time_secs   REAL    NOT NULL,
                 distance_traveled_m REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS link_summaries (
                 step             INTEGER NOT NULL,
                 link_id          INTEGER NOT NULL,
                 parcel_count     INTEGER NOT NULL,
                 active_count     INTEGER NOT NULL,
                 total_volume_m3  REAL    NOT NULL,
                 active_volume_m3 REAL    NOT NULL,
                 mean_diameter_m  REAL    NOT NULL,
                 PRIMARY KEY (step, link_id)
             );
             CREATE TABLE IF NOT EXISTS step_summaries (
                 step                     INTEGER PRIMARY KEY,
                 time_secs                REAL    NOT NULL,
                 moved_parcels            INTEGER NOT NULL,
                 link_transitions         INTEGER NOT NULL,
                 exported_parcels         INTEGER NOT NULL,
                 exported_volume_m3       REAL    NOT NULL,
                 abrasion_volume_m3       REAL    NOT NULL,
                 in_network_volume_m3     REAL    NOT NULL,
                 mass_balance_residual_m3 REAL    NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_parcel_snapshots(&mut self, rows: &[ParcelSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO parcel_snapshots \
                 (parcel_id, step, time_secs, link_id, position, volume_m3, diameter_m, \
                  active, arrival_time_secs, distance_traveled_m) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.parcel_id,
                    row.step as i64,
                    row.time_secs,
                    row.link_id,
                    row.position,
                    row.volume_m3,
                    row.diameter_m,
                    row.active as i64,
                    row.arrival_time_secs,
                    row.distance_traveled_m,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_link_summaries(&mut self, rows: &[LinkSummaryRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO link_summaries \
                 (step, link_id, parcel_count, active_count, total_volume_m3, active_volume_m3, \
                  mean_diameter_m) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.step as i64,
                    row.link_id,
                    row.parcel_count as i64,
                    row.active_count as i64,
                    row.total_volume_m3,
                    row.active_volume_m3,
                    row.mean_diameter_m,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO step_summaries \
             (step, time_secs, moved_parcels, link_transitions, exported_parcels, \
              exported_volume_m3, abrasion_volume_m3, in_network_volume_m3, mass_balance_residual_m3) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                row.step as i64,
                row.time_secs,
                row.moved_parcels as i64,
                row.link_transitions as i64,
                row.exported_parcels as i64,
                row.exported_volume_m3,
                row.abrasion_volume_m3,
                row.in_network_volume_m3,
                row.mass_balance_residual_m3,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
