// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read "reduced" FITS files, i.e. the output of the reduction
//! toolchain: per-timestamp KID phases ("READOUT") and per-KID resonance fits
//! ("KIDSINFO").


use std::path::{Path, PathBuf};

use log::{debug, trace};
use ndarray::prelude::*;
use thiserror::Error;

use crate::io::read::fits::{
    fits_get_col, fits_get_required_key, fits_get_vector_col_min, fits_open, fits_open_hdu,
    FitsError,
};

/// The readout of a single pixel.
#[derive(Debug, Clone)]
pub struct ReducedReadout {
    /// Where this readout came from, if it was read from a file.
    pub file: Option<PathBuf>,

    pub pixelid: usize,

    /// UNIX timestamps [seconds].
    pub timestamps: Vec<f64>,

    /// Linearised phase; shape (num timestamps, num KIDs).
    pub linphase: Array2<f64>,

    /// Linearised phase at the resonance of each KID.
    pub linyfc: Array1<f64>,

    /// Loaded quality factor of each KID (at 300 K).
    pub qr: Array1<f64>,
}

impl ReducedReadout {
    pub fn read(file: &Path, pixelid: usize) -> Result<ReducedReadout, ReadoutError> {
        debug!("Reading reduced readout {} (pixel {pixelid})", file.display());
        let mut fptr = fits_open(file)?;

        let hdu = fits_open_hdu(&mut fptr, "READOUT")?;
        let nkid: usize = fits_get_required_key(&mut fptr, &hdu, &format!("NKID{pixelid}"))?;
        let timestamps: Vec<f64> = fits_get_col(&mut fptr, &hdu, "timestamp")?;
        let mut linphase = Array2::zeros((timestamps.len(), nkid));
        for (i_kid, mut kid_linphase) in linphase.axis_iter_mut(Axis(1)).enumerate() {
            let amp_ph_linph =
                fits_get_vector_col_min(&mut fptr, &hdu, &format!("Amp, Ph, linPh {i_kid}"), 3)?;
            kid_linphase.assign(&amp_ph_linph.column(2));
        }

        let hdu = fits_open_hdu(&mut fptr, "KIDSINFO")?;
        let yfc = fits_get_vector_col_min(&mut fptr, &hdu, "yfc, linyfc", 2)?;
        let qr = fits_get_vector_col_min(&mut fptr, &hdu, "Qr, dQr (300K)", 2)?;
        if yfc.nrows() < nkid || qr.nrows() < nkid {
            return Err(ReadoutError::TooFewKids {
                file: file.to_path_buf(),
                nkid,
                num_rows: yfc.nrows().min(qr.nrows()),
            });
        }
        trace!("{nkid} KIDs, {} timestamps", timestamps.len());

        Ok(ReducedReadout {
            file: Some(file.to_path_buf()),
            pixelid,
            timestamps,
            linphase,
            linyfc: yfc.slice(s![..nkid, 1]).to_owned(),
            qr: qr.slice(s![..nkid, 0]).to_owned(),
        })
    }

    pub fn nkid(&self) -> usize {
        self.linyfc.len()
    }

    /// The fractional frequency shift of each KID at each timestamp:
    /// (linphase - linyfc) / (4 Qr). Shape (num timestamps, num KIDs).
    pub fn frequency_shift(&self) -> Array2<f64> {
        (&self.linphase - &self.linyfc) / &(&self.qr * 4.0)
    }
}

#[derive(Error, Debug)]
pub enum ReadoutError {
    #[error("{file}: KIDSINFO has {num_rows} rows, but READOUT says there are {nkid} KIDs")]
    TooFewKids {
        file: PathBuf,
        nkid: usize,
        num_rows: usize,
    },

    #[error(transparent)]
    Fits(#[from] FitsError),
}
