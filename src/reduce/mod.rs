// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reduction of raw KID sweep data into a single "reduced" FITS file, using
//! the external reduction scripts.


use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, info, trace};
use thiserror::Error;

use crate::io::{get_first_match_from_glob, GlobError};

/// The reduction scripts, in the order they are run.
pub const REDUCE_SCRIPTS: [&str; 3] = ["Configure.py", "FitSweep.py", "SaveFits.py"];

pub const DEFAULT_INTERPRETER: &str = "python";

/// Where the reduction scripts live and what runs them.
#[derive(Debug, Clone)]
pub struct ReduceScripts {
    pub dir: PathBuf,
    pub interpreter: OsString,
}

impl ReduceScripts {
    pub fn new<P: Into<PathBuf>>(dir: P) -> ReduceScripts {
        ReduceScripts {
            dir: dir.into(),
            interpreter: DEFAULT_INTERPRETER.into(),
        }
    }
}

/// Everything needed to run the reduction.
#[derive(Debug, Clone)]
pub struct ReduceParams {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub scripts: ReduceScripts,
}

impl ReduceParams {
    pub fn run(&self) -> Result<PathBuf, ReduceError> {
        reduce(&self.data_dir, &self.output_dir, &self.scripts)
    }
}

/// Reduce the raw data in `data_dir` into a reduced FITS file in
/// `output_dir`, which is created by the scripts. The path of the reduced FITS
/// file is returned.
///
/// The scripts run in a temporary working directory, which is removed
/// afterwards.
pub fn reduce(
    data_dir: &Path,
    output_dir: &Path,
    scripts: &ReduceScripts,
) -> Result<PathBuf, ReduceError> {
    // Resolve before the working directory changes.
    if !data_dir.exists() {
        return Err(ReduceError::DataDirNotFound(data_dir.to_path_buf()));
    }
    let data_dir = data_dir.canonicalize()?;
    if output_dir.exists() {
        return Err(ReduceError::OutputDirExists(output_dir.to_path_buf()));
    }
    let output_dir = std::path::absolute(output_dir)?;
    let scripts_dir = std::path::absolute(&scripts.dir)?;
    for script in REDUCE_SCRIPTS {
        let script = scripts_dir.join(script);
        if !script.exists() {
            return Err(ReduceError::ScriptNotFound(script));
        }
    }
    info!(
        "Reducing {} into {}",
        data_dir.display(),
        output_dir.display()
    );

    let work_dir = tempfile::tempdir()?;
    debug!("Working directory: {}", work_dir.path().display());
    for script in REDUCE_SCRIPTS {
        let mut command = Command::new(&scripts.interpreter);
        command.arg(scripts_dir.join(script));
        if script == REDUCE_SCRIPTS[0] {
            command.arg(&data_dir).arg(&output_dir);
        }
        command.current_dir(work_dir.path());
        run_script(script, &mut command)?;
    }
    work_dir.close()?;

    let pattern = format!(
        "{}/reduced_*.fits",
        glob::Pattern::escape(&output_dir.display().to_string())
    );
    let reduced = get_first_match_from_glob(&pattern).map_err(|e| match e {
        GlobError::NoMatches { .. } => ReduceError::NoReducedFits(output_dir.clone()),
        e => ReduceError::Glob(e),
    })?;
    info!("Reduced FITS: {}", reduced.display());

    Ok(reduced)
}

fn run_script(script: &'static str, command: &mut Command) -> Result<(), ReduceError> {
    debug!("Running {command:?}");
    let output = command.output().map_err(|e| ReduceError::ScriptStart {
        script,
        err: e,
    })?;
    trace!(
        "{script} stdout:\n{}",
        String::from_utf8_lossy(&output.stdout)
    );
    if !output.status.success() {
        return Err(ReduceError::ScriptFailed {
            script,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum ReduceError {
    #[error("Raw data directory {0} doesn't exist")]
    DataDirNotFound(PathBuf),

    #[error("Output directory {0} already exists")]
    OutputDirExists(PathBuf),

    #[error("Reduction script {0} doesn't exist; is the scripts directory correct?")]
    ScriptNotFound(PathBuf),

    #[error("Couldn't run {script}: {err}")]
    ScriptStart {
        script: &'static str,
        err: std::io::Error,
    },

    #[error("{script} failed ({status}): {stderr}")]
    ScriptFailed {
        script: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("The reduction scripts didn't create any reduced_*.fits in {0}")]
    NoReducedFits(PathBuf),

    #[error(transparent)]
    Glob(GlobError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
