// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all demerge-related errors. This should be the *only* error
//! enum that is publicly visible from the command-line interface.

use thiserror::Error;

use super::{merge::MergeArgsError, reduce::ReduceArgsError};
use crate::{
    calibrate::CalibrateError,
    ddb::DdbError,
    io::{
        read::{fits::FitsError, LogReadError, ObsinstError},
        write::BinTableError,
    },
    merge::MergeError,
    readout::ReadoutError,
    reduce::ReduceError,
    time::TimeError,
};

const URL: &str = "https://github.com/deshima-dev/demerge";

/// The *only* publicly visible error from the demerge CLI. Each error message
/// should include the URL, unless it's "generic".
#[derive(Error, Debug)]
pub enum DemergeError {
    /// An error related to running the reduction scripts.
    #[error("{0}\n\nCheck the raw data directory and the reduction scripts (--scripts-dir). See for more info: {URL}")]
    Reduce(String),

    /// An error related to merging.
    #[error("{0}\n\nSee for more info: {URL}")]
    Merge(String),

    /// An error related to the detector database.
    #[error("{0}\n\nIs the DDB for the right receiver? See for more info: {URL}")]
    Ddb(String),

    /// An error related to reduced FITS files.
    #[error("{0}\n\nWas the reduced FITS made by the reduction scripts? See for more info: {URL}")]
    Readout(String),

    /// An error related to observation instructions or logs.
    #[error("{0}\n\nSee for more info: {URL}")]
    Logs(String),

    /// An error related to argument files.
    #[error("{0}\n\nSee for more info: {URL}")]
    ArgFile(String),

    /// A cfitsio error. Because these are usually quite spartan, some
    /// suggestions are provided here.
    #[error("cfitsio error: {0}\n\nIf you don't know what this means, try turning up verbosity (-v or -vv).")]
    Cfitsio(String),

    /// A generic error that can't be clarified further with documentation, e.g.
    /// IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<ReduceArgsError> for DemergeError {
    fn from(e: ReduceArgsError) -> Self {
        Self::Reduce(e.to_string())
    }
}

impl From<MergeArgsError> for DemergeError {
    fn from(e: MergeArgsError) -> Self {
        Self::Merge(e.to_string())
    }
}

// Library errors.

impl From<ReduceError> for DemergeError {
    fn from(e: ReduceError) -> Self {
        match e {
            ReduceError::IO(e) => Self::from(e),
            _ => Self::Reduce(e.to_string()),
        }
    }
}

impl From<MergeError> for DemergeError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::OutputExists(_)
            | MergeError::EmptyReadout
            | MergeError::NkidMismatch { .. } => Self::Merge(e.to_string()),
            MergeError::Ddb(e) => Self::from(e),
            MergeError::Calibrate(e) => Self::from(e),
            MergeError::Time(e) => Self::from(e),
            MergeError::BinTable(e) => Self::from(e),
        }
    }
}

impl From<CalibrateError> for DemergeError {
    fn from(e: CalibrateError) -> Self {
        match e {
            CalibrateError::PixelMismatch { .. } => Self::Merge(e.to_string()),
            CalibrateError::Ddb(e) => Self::from(e),
        }
    }
}

impl From<DdbError> for DemergeError {
    fn from(e: DdbError) -> Self {
        match e {
            DdbError::Fits(e) => Self::from(e),
            _ => Self::Ddb(e.to_string()),
        }
    }
}

impl From<ReadoutError> for DemergeError {
    fn from(e: ReadoutError) -> Self {
        match e {
            ReadoutError::Fits(e) => Self::from(e),
            _ => Self::Readout(e.to_string()),
        }
    }
}

impl From<ObsinstError> for DemergeError {
    fn from(e: ObsinstError) -> Self {
        Self::Logs(e.to_string())
    }
}

impl From<LogReadError> for DemergeError {
    fn from(e: LogReadError) -> Self {
        Self::Logs(e.to_string())
    }
}

impl From<TimeError> for DemergeError {
    fn from(e: TimeError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<FitsError> for DemergeError {
    fn from(e: FitsError) -> Self {
        Self::Cfitsio(e.to_string())
    }
}

impl From<BinTableError> for DemergeError {
    fn from(e: BinTableError) -> Self {
        match e {
            BinTableError::Fits(e) => Self::from(e),
            BinTableError::Key { .. } | BinTableError::Fitsio(_) => Self::Cfitsio(e.to_string()),
            BinTableError::IO(e) => Self::from(e),
            _ => Self::Generic(e.to_string()),
        }
    }
}

impl From<std::io::Error> for DemergeError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
