// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read observation instructions (".obs" files), the scripts the
//! telescope runs for an observation.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use thiserror::Error;

use crate::constants::DEFAULT_EQUINOX;

/// Observation information for the "OBSINFO" HDU.
#[derive(Debug, Clone, PartialEq)]
pub struct ObsInfo {
    pub observer: String,
    pub obs_object: String,
    /// [degrees]; zero unless the antenna tracked in RA/Dec.
    pub ra: f64,
    /// [degrees]; zero unless the antenna tracked in RA/Dec.
    pub dec: f64,
    pub equinox: String,
}

/// The last whitespace-separated token of a line.
fn last_token(line: &str) -> &str {
    line.split_whitespace().last().unwrap_or("")
}

fn parse_src_pos(token: &str) -> Option<(f64, f64)> {
    let mut coords = token
        .trim_matches(|c| c == '(' || c == ')')
        .split(',')
        .map(|c| c.trim().parse::<f64>());
    match (coords.next(), coords.next()) {
        (Some(Ok(ra)), Some(Ok(dec))) => Some((ra, dec)),
        _ => None,
    }
}

/// Get the observer, object, source position and equinox out of an
/// observation instruction.
pub fn load_obsinst(obsinst: &Path) -> Result<ObsInfo, ObsinstError> {
    if !obsinst.to_string_lossy().contains(".obs") {
        return Err(ObsinstError::NotObsinst(obsinst.to_path_buf()));
    }
    debug!("Reading observation instruction {}", obsinst.display());

    let mut trk_type: Option<String> = None;
    let mut obs_object: Option<String> = None;
    let mut src_pos: Option<(f64, f64)> = None;
    let mut equinox = DEFAULT_EQUINOX.to_string();
    let mut observer: Option<String> = None;

    let reader = BufReader::new(File::open(obsinst)?);
    for (i_line, line) in reader.lines().enumerate() {
        let line = line?;
        if line.contains("SET ANTENNA_G TRK_TYPE") {
            trk_type = Some(last_token(&line).trim_matches('\'').to_string());
        } else if line.contains("SET ANTENNA_G SRC_NAME") {
            obs_object = Some(last_token(&line).trim_matches('\'').to_string());
        } else if line.contains("SET ANTENNA_G SRC_POS") {
            let token = last_token(&line);
            src_pos = Some(parse_src_pos(token).ok_or_else(|| ObsinstError::BadSrcPos {
                file: obsinst.to_path_buf(),
                line_num: i_line + 1,
                value: token.to_string(),
            })?);
        } else if line.contains("SET ANTENNA_G EPOCH") {
            equinox = last_token(&line)
                .trim_matches(|c| c == '\'' || c == 'J' || c == 'B')
                .to_string();
        } else if line.contains("SET DES OBS_USER") {
            observer = Some(last_token(&line).trim_matches('\'').to_string());
        }
    }

    let missing = |what: &'static str| ObsinstError::Missing {
        file: obsinst.to_path_buf(),
        what,
    };
    let trk_type = trk_type.ok_or_else(|| missing("SET ANTENNA_G TRK_TYPE"))?;
    let obs_object = obs_object.ok_or_else(|| missing("SET ANTENNA_G SRC_NAME"))?;
    let observer = observer.ok_or_else(|| missing("SET DES OBS_USER"))?;
    let (ra, dec) = if trk_type == "RADEC" {
        src_pos.ok_or_else(|| missing("SET ANTENNA_G SRC_POS"))?
    } else {
        (0.0, 0.0)
    };
    trace!("Tracking type {trk_type}, object {obs_object}, observer {observer}");

    Ok(ObsInfo {
        observer,
        obs_object,
        ra,
        dec,
        equinox,
    })
}

#[derive(Error, Debug)]
pub enum ObsinstError {
    #[error("{0} must be an observational instruction (a .obs file)")]
    NotObsinst(PathBuf),

    #[error("{file} has no '{what}' line")]
    Missing { file: PathBuf, what: &'static str },

    #[error("{file} line {line_num}: Couldn't parse the source position '{value}'; expected '(ra,dec)'")]
    BadSrcPos {
        file: PathBuf,
        line_num: usize,
        value: String,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
