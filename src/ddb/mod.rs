// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read the detector database (DDB), which maps KIDs to their "master"
//! IDs, filter frequencies, Q factors, types and responsivity parameters.


use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use ndarray::Array2;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::io::read::fits::{
    fits_get_col, fits_get_key_names, fits_get_required_key, fits_get_vector_col_min, fits_open,
    fits_open_hdu, FitsError,
};

/// The kind of a KID, as described by the "attribute" column of the DDB.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum KidType {
    #[strum(serialize = "wideband")]
    Wideband,
    #[strum(serialize = "filter")]
    Filter,
    #[strum(serialize = "blind")]
    Blind,
    #[strum(serialize = "Al")]
    Al,
    #[strum(serialize = "NbTiN")]
    NbTiN,
    #[strum(serialize = "unknown")]
    Unknown,
}

impl KidType {
    /// Anything unrecognised is [`KidType::Unknown`].
    pub fn from_attribute(attribute: &str) -> KidType {
        attribute.trim().parse().unwrap_or(KidType::Unknown)
    }

    /// The integer written to data products.
    pub fn code(self) -> i32 {
        match self {
            KidType::Wideband => 0,
            KidType::Filter => 1,
            KidType::Blind => 2,
            KidType::Al => 3,
            KidType::NbTiN => 4,
            KidType::Unknown => -1,
        }
    }
}

/// A row of the "KIDFILT" HDU.
#[derive(Debug, Clone, PartialEq)]
pub struct KidFilter {
    pub kidid: i32,
    /// Negative if the KID has no master.
    pub masterid: i32,
    pub f_filter: f64,
    pub df_filter: f64,
    pub q_filter: f64,
    pub dq_filter: f64,
}

/// Responsivity-curve parameters of a KID ("cal params" of the "KIDRESP" HDU).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Responsivity {
    pub p0: f64,
    pub etaf: f64,
    pub t0: f64,
}

#[derive(Debug, Clone)]
pub struct DetectorDatabase {
    /// Where this DDB came from, if it was read from a file.
    pub file: Option<PathBuf>,

    /// The number of KIDs of each pixel ("NKID<pixelid>" in "KIDFILT").
    pub nkid: BTreeMap<usize, usize>,

    pub filters: Vec<KidFilter>,

    /// Master ID to attribute ("KIDDES").
    pub attributes: HashMap<i32, String>,

    /// One row of (p0, etaf, T0) per KID index ("KIDRESP").
    pub cal_params: Array2<f64>,
}

impl DetectorDatabase {
    pub fn read(file: &Path) -> Result<DetectorDatabase, DdbError> {
        debug!("Reading DDB {}", file.display());
        let mut fptr = fits_open(file)?;

        let hdu = fits_open_hdu(&mut fptr, "KIDFILT")?;
        let mut nkid = BTreeMap::new();
        for key in fits_get_key_names(&mut fptr, &hdu)? {
            let pixelid = key
                .strip_prefix("NKID")
                .and_then(|p| p.parse::<usize>().ok());
            if let Some(pixelid) = pixelid {
                nkid.insert(pixelid, fits_get_required_key(&mut fptr, &hdu, &key)?);
            }
        }
        let kidids: Vec<i32> = fits_get_col(&mut fptr, &hdu, "kidid")?;
        let masterids: Vec<i32> = fits_get_col(&mut fptr, &hdu, "masterid")?;
        let f_filter = fits_get_vector_col_min(&mut fptr, &hdu, "F_filter, dF_filter", 2)?;
        let q_filter = fits_get_vector_col_min(&mut fptr, &hdu, "Q_filter, dQ_filter", 2)?;
        let filters = kidids
            .into_iter()
            .zip(masterids)
            .zip(f_filter.rows())
            .zip(q_filter.rows())
            .map(|(((kidid, masterid), f), q)| KidFilter {
                kidid,
                masterid,
                f_filter: f[0],
                df_filter: f[1],
                q_filter: q[0],
                dq_filter: q[1],
            })
            .collect();

        let hdu = fits_open_hdu(&mut fptr, "KIDDES")?;
        let masterids: Vec<i32> = fits_get_col(&mut fptr, &hdu, "masterid")?;
        let attributes: Vec<String> = fits_get_col(&mut fptr, &hdu, "attribute")?;
        let attributes = masterids
            .into_iter()
            .zip(attributes)
            .map(|(m, a)| (m, a.trim().to_string()))
            .collect();

        let hdu = fits_open_hdu(&mut fptr, "KIDRESP")?;
        let cal_params = fits_get_vector_col_min(&mut fptr, &hdu, "cal params", 3)?;

        trace!("DDB pixels and KID counts: {nkid:?}");
        Ok(DetectorDatabase {
            file: Some(file.to_path_buf()),
            nkid,
            filters,
            attributes,
            cal_params,
        })
    }

    /// The number of KIDs of a pixel.
    pub fn get_nkid(&self, pixelid: usize) -> Result<usize, DdbError> {
        self.nkid
            .get(&pixelid)
            .copied()
            .ok_or_else(|| DdbError::MissingNkid {
                pixelid,
                file: self.file_description(),
            })
    }

    /// The "KIDFILT" row of a KID. If a KID ID appears more than once, the last
    /// row wins.
    pub fn get_filter(&self, kidid: usize) -> Result<&KidFilter, DdbError> {
        self.filters
            .iter()
            .rev()
            .find(|f| usize::try_from(f.kidid) == Ok(kidid))
            .ok_or_else(|| DdbError::MissingKid {
                kidid,
                file: self.file_description(),
            })
    }

    pub fn get_responsivity(&self, kid_index: usize) -> Result<Responsivity, DdbError> {
        match self.cal_params.rows().into_iter().nth(kid_index) {
            Some(row) if row.len() >= 3 => Ok(Responsivity {
                p0: row[0],
                etaf: row[1],
                t0: row[2],
            }),
            _ => Err(DdbError::MissingResponsivity {
                kid_index,
                num_rows: self.cal_params.nrows(),
                file: self.file_description(),
            }),
        }
    }

    fn file_description(&self) -> String {
        match &self.file {
            Some(f) => f.display().to_string(),
            None => "<in-memory DDB>".to_string(),
        }
    }
}

/// The correspondence between KIDs of a pixel and their master IDs, types,
/// filter frequencies and filter Q factors. Each vector has one element per
/// KID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KidCorrespondence {
    pub masterids: Vec<i32>,
    pub kidids: Vec<i32>,
    /// Codes of [`KidType`].
    pub kidtypes: Vec<i32>,
    pub kidfreqs: Vec<f64>,
    pub kidqs: Vec<f64>,
}

/// Get the correspondence of master IDs and KIDs for a pixel.
pub fn get_maskid_corresp(
    pixelid: usize,
    ddb: &DetectorDatabase,
) -> Result<KidCorrespondence, DdbError> {
    let nkid = ddb.get_nkid(pixelid)?;
    let mut corresp = KidCorrespondence::default();
    for kidid in 0..nkid {
        let filter = ddb.get_filter(kidid)?;
        let kind = if filter.masterid < 0 {
            KidType::Unknown
        } else {
            let attribute =
                ddb.attributes
                    .get(&filter.masterid)
                    .ok_or_else(|| DdbError::MissingMaster {
                        masterid: filter.masterid,
                        file: ddb.file_description(),
                    })?;
            KidType::from_attribute(attribute)
        };

        corresp.masterids.push(filter.masterid);
        corresp.kidids.push(kidid as i32);
        corresp.kidtypes.push(kind.code());
        corresp.kidfreqs.push(filter.f_filter);
        corresp.kidqs.push(filter.q_filter);
    }

    Ok(corresp)
}

#[derive(Error, Debug)]
pub enum DdbError {
    #[error("{file}: No NKID{pixelid} key in KIDFILT; is pixel {pixelid} in this DDB?")]
    MissingNkid { pixelid: usize, file: String },

    #[error("{file}: KID {kidid} isn't in KIDFILT")]
    MissingKid { kidid: usize, file: String },

    #[error("{file}: Master ID {masterid} isn't in KIDDES")]
    MissingMaster { masterid: i32, file: String },

    #[error("{file}: KIDRESP has {num_rows} rows, so there are no responsivity parameters for KID {kid_index}")]
    MissingResponsivity {
        kid_index: usize,
        num_rows: usize,
        file: String,
    },

    #[error(transparent)]
    Fits(#[from] FitsError),
}
