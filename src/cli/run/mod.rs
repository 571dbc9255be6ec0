// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reduce and merge in one go.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::{common::ARG_FILE_HELP, merge::MergeInputArgs, reduce::ReduceArgs};
use crate::DemergeError;

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct RunArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(flatten)]
    pub(super) reduce_args: ReduceArgs,

    #[clap(flatten)]
    #[serde(flatten)]
    pub(super) merge_args: MergeInputArgs,
}

impl RunArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<RunArgs, DemergeError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let RunArgs {
                args_file: _,
                reduce_args,
                merge_args,
            } = unpack_arg_file!(arg_file);

            Ok(RunArgs {
                args_file: None,
                reduce_args: cli_args.reduce_args.merge(reduce_args),
                merge_args: cli_args.merge_args.merge(merge_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), DemergeError> {
        trace!("{:#?}", self);
        let Self {
            args_file: _,
            reduce_args,
            merge_args,
        } = self;

        // Everything that can be checked before the (slow) reduction is
        // checked here, so a bad merge argument doesn't waste a reduction.
        let reduce_params = reduce_args.parse()?;
        merge_args.check()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let reduced = reduce_params.run()?;
        let merge_params = merge_args.parse(&reduced)?;
        let dfits = merge_params.run()?;
        info!("Wrote {}", dfits.display());
        Ok(())
    }
}
