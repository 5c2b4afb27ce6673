//! CSV parcel loader.
//!
//! # CSV format
//!
//! ```csv
//! link_id,position,volume_m3,diameter_m,density,abrasion_rate,active,arrival_time_secs
//! 0,0.25,1.0,0.02,2650,0.0,true,0
//! 0,0.80,0.5,0.05,,,,
//! ```
//!
//! `density`, `abrasion_rate`, `active` and `arrival_time_secs` may be
//! empty; they default to quartz density, no abrasion, active, and zero.
//! Row order is parcel order: row `i` becomes `ParcelId(i)`.
//!
//! Values are not range-checked here.  [`ParcelLedger::create`] validates
//! them against the network.
//!
//! [`ParcelLedger::create`]: crate::ParcelLedger::create

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use nst_core::LinkId;

use crate::ledger::InitialParcel;
use crate::{LedgerError, LedgerResult};

#[derive(Deserialize)]
struct ParcelRecord {
    link_id:           u32,
    position:          f64,
    volume_m3:         f64,
    diameter_m:        f64,
    density:           Option<f64>,
    abrasion_rate:     Option<f64>,
    active:            Option<bool>,
    arrival_time_secs: Option<f64>,
}

impl ParcelRecord {
    fn into_initial(self) -> InitialParcel {
        let mut p = InitialParcel::new(LinkId(self.link_id), self.position, self.volume_m3, self.diameter_m);
        if let Some(d) = self.density {
            p = p.with_density(d);
        }
        if let Some(r) = self.abrasion_rate {
            p = p.with_abrasion_rate(r);
        }
        if self.active == Some(false) {
            p = p.inactive();
        }
        if let Some(t) = self.arrival_time_secs {
            p = p.arrived_at(t);
        }
        p
    }
}

pub fn load_parcels_csv(path: &Path) -> LedgerResult<Vec<InitialParcel>> {
    let file = std::fs::File::open(path)?;
    load_parcels_reader(file)
}

/// Like [`load_parcels_csv`] but accepts any `Read` source.
pub fn load_parcels_reader<R: Read>(reader: R) -> LedgerResult<Vec<InitialParcel>> {
    csv::Reader::from_reader(reader)
        .deserialize::<ParcelRecord>()
        .map(|row| {
            row.map(ParcelRecord::into_initial)
                .map_err(|e| LedgerError::Parse(e.to_string()))
        })
        .collect()
}
