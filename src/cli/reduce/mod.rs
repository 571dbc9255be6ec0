// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter};
use crate::{
    reduce::{ReduceError, ReduceParams, ReduceScripts, DEFAULT_INTERPRETER, REDUCE_SCRIPTS},
    DemergeError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ReduceArgs {
    /// Path of the raw data directory (e.g. cosmos_YYYYmmddHHMMSS).
    #[clap(long, parse(from_os_str), help_heading = "REDUCE")]
    pub(super) data_dir: Option<PathBuf>,

    /// Path of the directory the reduced FITS is written to (e.g.
    /// output_YYYYmmddHHMMSS). It must not already exist.
    #[clap(long, parse(from_os_str), help_heading = "REDUCE")]
    pub(super) output_dir: Option<PathBuf>,

    /// The directory containing the reduction scripts (Configure.py,
    /// FitSweep.py and SaveFits.py).
    #[clap(long, env = "DEMERGE_SCRIPTS_DIR", parse(from_os_str), help_heading = "REDUCE")]
    pub(super) scripts_dir: Option<PathBuf>,

    /// The program that runs the reduction scripts. Default: python
    #[clap(long, help_heading = "REDUCE")]
    pub(super) interpreter: Option<String>,
}

impl ReduceArgs {
    /// Consolidate these arguments with those from a file, preferring these.
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            data_dir: self.data_dir.or(other.data_dir),
            output_dir: self.output_dir.or(other.output_dir),
            scripts_dir: self.scripts_dir.or(other.scripts_dir),
            interpreter: self.interpreter.or(other.interpreter),
        }
    }

    pub(super) fn parse(self) -> Result<ReduceParams, DemergeError> {
        debug!("{:#?}", self);

        let Self {
            data_dir,
            output_dir,
            scripts_dir,
            interpreter,
        } = self;

        let data_dir = data_dir.ok_or(ReduceArgsError::NoDataDir)?;
        let output_dir = output_dir.ok_or(ReduceArgsError::NoOutputDir)?;
        let scripts_dir = scripts_dir.ok_or(ReduceArgsError::NoScriptsDir)?;
        if !data_dir.exists() {
            return Err(ReduceError::DataDirNotFound(data_dir).into());
        }
        if output_dir.exists() {
            return Err(ReduceError::OutputDirExists(output_dir).into());
        }
        let interpreter = interpreter.unwrap_or_else(|| DEFAULT_INTERPRETER.to_string());

        let mut printer = InfoPrinter::new("Reducing".into());
        printer.push_block(vec![
            format!("Raw data:   {}", data_dir.display()).into(),
            format!("Output dir: {}", output_dir.display()).into(),
        ]);
        printer.push_block(vec![
            format!("Scripts:    {}", scripts_dir.display()).into(),
            format!("Run with:   {interpreter} ({})", REDUCE_SCRIPTS.join(", ")).into(),
        ]);
        printer.display();
        display_warnings();

        Ok(ReduceParams {
            data_dir,
            output_dir,
            scripts: ReduceScripts {
                dir: scripts_dir,
                interpreter: interpreter.into(),
            },
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), DemergeError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum ReduceArgsError {
    #[error("No raw data directory was specified (--data-dir)")]
    NoDataDir,

    #[error("No output directory was specified (--output-dir)")]
    NoOutputDir,

    #[error("No reduction scripts directory was specified (--scripts-dir or DEMERGE_SCRIPTS_DIR)")]
    NoScriptsDir,
}
