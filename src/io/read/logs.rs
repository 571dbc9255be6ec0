// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read the antenna, weather and cabin logging streams.
//!
//! All logs are whitespace-separated text with an ASCII time stamp
//! (YYYYmmddHHMMSS.ffffff) as the first column. Blank lines and lines starting
//! with '#' are ignored.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use log::{debug, trace};
use thiserror::Error;

use crate::time::{datetime_to_timestamp, parse_asciitime};

const ANTENNA_COLUMNS: [&str; 10] = [
    "time", "ra-prg", "dec-prg", "az-prg", "el-prg", "az-real", "el-real", "x", "y", "type",
];
const WEATHER_COLUMNS: [&str; 6] = [
    "time",
    "temperature",
    "pressure",
    "vapor-pressure",
    "windspd",
    "winddir",
];
const CABIN_COLUMNS: [&str; 2] = ["time", "temperature"];

/// Antenna pointing. Angles are in degrees, offsets in arcseconds.
#[derive(Debug, Clone, Default)]
pub struct AntennaLog {
    pub times: Vec<NaiveDateTime>,
    pub ra_prog: Vec<f64>,
    pub dec_prog: Vec<f64>,
    pub az_prog: Vec<f64>,
    pub el_prog: Vec<f64>,
    pub az_real: Vec<f64>,
    pub el_real: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// e.g. "ON", "OFF", "R", "SKY".
    pub scan_types: Vec<String>,
}

/// Weather station data.
#[derive(Debug, Clone, Default)]
pub struct WeatherLog {
    pub times: Vec<NaiveDateTime>,
    /// [°C]
    pub temperature: Vec<f64>,
    /// [hPa]
    pub pressure: Vec<f64>,
    /// [hPa]
    pub vapor_pressure: Vec<f64>,
    /// [m/s]
    pub wind_speed: Vec<f64>,
    /// [degrees]
    pub wind_direction: Vec<f64>,
}

/// Receiver cabin temperatures.
#[derive(Debug, Clone, Default)]
pub struct CabinLog {
    pub times: Vec<NaiveDateTime>,
    /// [°C]
    pub temperature: Vec<f64>,
}

/// Mean of the non-NaN values, if there are any.
fn nan_mean<'a, I: Iterator<Item = &'a f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

impl WeatherLog {
    /// Mean of the temperatures [°C].
    pub fn mean_temperature(&self) -> Option<f64> {
        nan_mean(self.temperature.iter())
    }
}

impl CabinLog {
    /// Mean of the temperatures [°C] logged between the UNIX timestamps
    /// `start` and `end` (inclusive).
    pub fn mean_temperature_between(&self, start: f64, end: f64) -> Option<f64> {
        nan_mean(
            self.times
                .iter()
                .zip(self.temperature.iter())
                .filter(|(t, _)| {
                    let t = datetime_to_timestamp(t);
                    t >= start && t <= end
                })
                .map(|(_, temp)| temp),
        )
    }
}

/// One data line of a log.
struct Row {
    line_num: usize,
    time: NaiveDateTime,
    fields: Vec<String>,
}

impl Row {
    fn f64(&self, file: &Path, columns: &[&'static str], i_col: usize) -> Result<f64, LogReadError> {
        let field = &self.fields[i_col - 1];
        field.parse().map_err(|_| LogReadError::Parse {
            file: file.to_path_buf(),
            line_num: self.line_num,
            column: columns[i_col],
            value: field.clone(),
        })
    }
}

fn read_rows(file: &Path, columns: &[&'static str]) -> Result<Vec<Row>, LogReadError> {
    debug!("Reading log {}", file.display());
    let reader = BufReader::new(File::open(file).map_err(|e| LogReadError::Open {
        file: file.to_path_buf(),
        err: e,
    })?);

    let mut rows = vec![];
    for (i_line, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let num_tokens = tokens.clone().count();
        if num_tokens != columns.len() {
            return Err(LogReadError::ColumnCount {
                file: file.to_path_buf(),
                line_num: i_line + 1,
                expected: columns.len(),
                actual: num_tokens,
            });
        }
        // The count check guarantees a first token.
        let time_str = tokens.next().unwrap_or_default();
        let time = parse_asciitime(time_str).map_err(|_| LogReadError::Parse {
            file: file.to_path_buf(),
            line_num: i_line + 1,
            column: columns[0],
            value: time_str.to_string(),
        })?;
        rows.push(Row {
            line_num: i_line + 1,
            time,
            fields: tokens.map(|t| t.to_string()).collect(),
        });
    }
    trace!("Read {} rows from {}", rows.len(), file.display());

    Ok(rows)
}

/// Read an antenna log; columns are
/// `time ra-prg dec-prg az-prg el-prg az-real el-real x y type`.
pub fn read_antenna_log(file: &Path) -> Result<AntennaLog, LogReadError> {
    let rows = read_rows(file, &ANTENNA_COLUMNS)?;
    let mut log = AntennaLog::default();
    for row in rows {
        let f = |i_col| row.f64(file, &ANTENNA_COLUMNS, i_col);
        log.ra_prog.push(f(1)?);
        log.dec_prog.push(f(2)?);
        log.az_prog.push(f(3)?);
        log.el_prog.push(f(4)?);
        log.az_real.push(f(5)?);
        log.el_real.push(f(6)?);
        log.x.push(f(7)?);
        log.y.push(f(8)?);
        log.scan_types.push(row.fields[8].clone());
        log.times.push(row.time);
    }
    Ok(log)
}

/// Read a weather log; columns are
/// `time temperature pressure vapor-pressure windspd winddir`.
pub fn read_weather_log(file: &Path) -> Result<WeatherLog, LogReadError> {
    let rows = read_rows(file, &WEATHER_COLUMNS)?;
    let mut log = WeatherLog::default();
    for row in rows {
        let f = |i_col| row.f64(file, &WEATHER_COLUMNS, i_col);
        log.temperature.push(f(1)?);
        log.pressure.push(f(2)?);
        log.vapor_pressure.push(f(3)?);
        log.wind_speed.push(f(4)?);
        log.wind_direction.push(f(5)?);
        log.times.push(row.time);
    }
    Ok(log)
}

/// Read a cabin log; columns are `time temperature`.
pub fn read_cabin_log(file: &Path) -> Result<CabinLog, LogReadError> {
    let rows = read_rows(file, &CABIN_COLUMNS)?;
    let mut log = CabinLog::default();
    for row in rows {
        log.temperature.push(row.f64(file, &CABIN_COLUMNS, 1)?);
        log.times.push(row.time);
    }
    Ok(log)
}

#[derive(Error, Debug)]
pub enum LogReadError {
    #[error("Couldn't open log {file}: {err}")]
    Open { file: PathBuf, err: std::io::Error },

    #[error("{file} line {line_num}: Expected {expected} columns, found {actual}")]
    ColumnCount {
        file: PathBuf,
        line_num: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{file} line {line_num}: Couldn't parse '{value}' for column '{column}'")]
    Parse {
        file: PathBuf,
        line_num: usize,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
