// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code for reading observation instructions, logging streams and FITS files.

pub mod fits;
mod logs;
mod obsinst;

pub use logs::{
    read_antenna_log, read_cabin_log, read_weather_log, AntennaLog, CabinLog, LogReadError,
    WeatherLog,
};
pub use obsinst::{load_obsinst, ObsInfo, ObsinstError};
