// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Reduce, merge and calibrate the logging data of a KID-based astronomical
receiver into a single FITS file ("DFITS").
 */

pub mod calibrate;
mod cli;
pub mod constants;
pub mod ddb;
pub mod io;
pub mod merge;
pub mod readout;
pub mod reduce;
pub mod time;

#[cfg(test)]
mod tests;

// Re-exports.
pub use cli::{Demerge, DemergeError};
