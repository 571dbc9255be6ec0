// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibration of KID frequency shifts into line-of-sight brightness
//! temperatures.
//!
//! A KID's responsivity curve relates its fractional frequency shift `dx` to
//! the power it absorbs. With `p0`, `etaf` (forward efficiency) and `T0` from
//! the DDB, and the room (cabin) and ambient temperatures `Troom` and `Tamb`,
//! the line-of-sight temperature is
//!
//! ```text
//! Tlos = (dx + p0 sqrt(Troom + T0))^2 / (p0^2 etaf) - T0 / etaf - (1 - etaf) / etaf Tamb
//! ```


use log::{debug, trace};
use ndarray::prelude::*;
use thiserror::Error;

use crate::{
    ddb::{DdbError, DetectorDatabase},
    readout::ReducedReadout,
};

/// The line-of-sight temperature [K] of a KID with frequency shift `dx`.
#[inline]
pub fn tlos_model(dx: f64, p0: f64, etaf: f64, t0: f64, troom: f64, tamb: f64) -> f64 {
    (dx + p0 * (troom + t0).sqrt()).powi(2) / (p0 * p0 * etaf)
        - t0 / etaf
        - (1.0 - etaf) / etaf * tamb
}

/// Calibrate the readout of a pixel into temperatures [K]. The returned array
/// has shape (num timestamps, num KIDs); KIDs without a master ID are all NaN.
pub fn calibrate_to_power(
    pixelid: usize,
    troom: f64,
    tamb: f64,
    readout: &ReducedReadout,
    ddb: &DetectorDatabase,
) -> Result<Array2<f64>, CalibrateError> {
    if readout.pixelid != pixelid {
        return Err(CalibrateError::PixelMismatch {
            expected: pixelid,
            actual: readout.pixelid,
        });
    }
    debug!("Calibrating pixel {pixelid} with Troom = {troom} K, Tamb = {tamb} K");

    let fshift = readout.frequency_shift();
    let mut tsignal = Array2::from_elem(fshift.dim(), f64::NAN);
    for (i_kid, (fshift, mut tsignal)) in fshift
        .axis_iter(Axis(1))
        .zip(tsignal.axis_iter_mut(Axis(1)))
        .enumerate()
    {
        let masterid = ddb.get_filter(i_kid)?.masterid;
        if masterid < 0 {
            trace!("KID {i_kid} has no master; leaving it as NaN");
            continue;
        }

        let r = ddb.get_responsivity(i_kid)?;
        tsignal.zip_mut_with(&fshift, |t, &dx| {
            *t = tlos_model(dx, r.p0, r.etaf, r.t0, troom, tamb);
        });
    }

    Ok(tsignal)
}

#[derive(Error, Debug)]
pub enum CalibrateError {
    #[error("Asked to calibrate pixel {expected}, but the readout is of pixel {actual}")]
    PixelMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Ddb(#[from] DdbError),
}
