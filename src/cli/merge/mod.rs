// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    constants::{DEFAULT_AMB_T, DEFAULT_ROOM_T},
    ddb::DetectorDatabase,
    io::read::{load_obsinst, read_antenna_log, read_cabin_log, read_weather_log},
    merge::{
        ambient_temperature, check_output, room_temperature, MergeParams, TemperatureSource,
    },
    readout::ReducedReadout,
    DemergeError,
};

/// Arguments for merging that don't concern the reduced FITS. These are shared
/// by `merge` and `run`.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct MergeInputArgs {
    /// Path of the detector database (DDB) FITS.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) ddb: Option<PathBuf>,

    /// Path of the observation instruction (.obs).
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) obsinst: Option<PathBuf>,

    /// Path of the antenna log.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) antenna: Option<PathBuf>,

    /// Path of the weather log.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) weather: Option<PathBuf>,

    /// Path of the cabin log. Without it, the room temperature must be given
    /// with --troom, or a default is used.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) cabin: Option<PathBuf>,

    /// Path of the output DFITS.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,

    /// Replace the output DFITS if it already exists.
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub(super) overwrite: bool,

    /// The pixel to merge. Default: 0
    #[clap(short, long, help_heading = "CALIBRATION")]
    pub(super) pixelid: Option<usize>,

    /// The room (cabin) temperature to calibrate with [K]. Default: the mean
    /// of the cabin log around the readout.
    #[clap(long, help_heading = "CALIBRATION")]
    pub(super) troom: Option<f64>,

    /// The ambient temperature to calibrate with [K]. Default: the mean of the
    /// weather log.
    #[clap(long, help_heading = "CALIBRATION")]
    pub(super) tamb: Option<f64>,
}

/// The required input paths, once they are known to be present.
struct RequiredInputs {
    ddb: PathBuf,
    obsinst: PathBuf,
    antenna: PathBuf,
    weather: PathBuf,
    output: PathBuf,
}

impl MergeInputArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            ddb: self.ddb.or(other.ddb),
            obsinst: self.obsinst.or(other.obsinst),
            antenna: self.antenna.or(other.antenna),
            weather: self.weather.or(other.weather),
            cabin: self.cabin.or(other.cabin),
            output: self.output.or(other.output),
            overwrite: self.overwrite || other.overwrite,
            pixelid: self.pixelid.or(other.pixelid),
            troom: self.troom.or(other.troom),
            tamb: self.tamb.or(other.tamb),
        }
    }

    fn required(&self) -> Result<RequiredInputs, MergeArgsError> {
        let get = |p: &Option<PathBuf>, arg| p.clone().ok_or(MergeArgsError::Missing { arg });
        Ok(RequiredInputs {
            ddb: get(&self.ddb, "--ddb")?,
            obsinst: get(&self.obsinst, "--obsinst")?,
            antenna: get(&self.antenna, "--antenna")?,
            weather: get(&self.weather, "--weather")?,
            output: get(&self.output, "--output")?,
        })
    }

    /// Check that everything needed for merging is present, without reading
    /// anything.
    pub(super) fn check(&self) -> Result<(), DemergeError> {
        let RequiredInputs { output, .. } = self.required()?;
        check_output(&output, self.overwrite)?;
        Ok(())
    }

    /// Read all of the inputs and work out the calibration temperatures.
    pub(super) fn parse(self, reduced: &Path) -> Result<MergeParams, DemergeError> {
        debug!("{:#?}", self);

        let RequiredInputs {
            ddb,
            obsinst,
            antenna,
            weather,
            output,
        } = self.required()?;
        let Self {
            cabin,
            overwrite,
            pixelid,
            troom,
            tamb,
            ..
        } = self;
        check_output(&output, overwrite)?;
        let pixelid = pixelid.unwrap_or(0);

        let ddb = DetectorDatabase::read(&ddb)?;
        let readout = ReducedReadout::read(reduced, pixelid)?;
        let obsinfo = load_obsinst(&obsinst)?;
        let antenna_log = read_antenna_log(&antenna)?;
        let weather_log = read_weather_log(&weather)?;
        let cabin_log = cabin.as_deref().map(read_cabin_log).transpose()?;

        let (troom, troom_source) =
            room_temperature(troom, cabin_log.as_ref(), &readout.timestamps);
        if troom_source == TemperatureSource::Default {
            match &cabin {
                Some(c) => format!(
                    "No cabin temperatures in {} are near the readout; using Troom = {DEFAULT_ROOM_T} K",
                    c.display()
                )
                .warn(),
                None => format!("No cabin log was given; using Troom = {DEFAULT_ROOM_T} K").warn(),
            }
        }
        let (tamb, tamb_source) = ambient_temperature(tamb, &weather_log);
        if tamb_source == TemperatureSource::Default {
            format!(
                "No weather temperatures in {}; using Tamb = {DEFAULT_AMB_T} K",
                weather.display()
            )
            .warn();
        }

        let mut printer = InfoPrinter::new(format!("Merging pixel {pixelid}").into());
        printer.push_block(vec![
            format!("DDB:     {}", ddb_name(&ddb)).into(),
            format!("Reduced: {}", reduced.display()).into(),
            format!("Obsinst: {}", obsinst.display()).into(),
        ]);
        printer.push_block(vec![
            format!(
                "Observer {}, object {} (RA {}°, Dec {}°, equinox {})",
                obsinfo.observer, obsinfo.obs_object, obsinfo.ra, obsinfo.dec, obsinfo.equinox
            )
            .into(),
            format!(
                "{} KIDs, {} readout timestamps",
                readout.nkid(),
                readout.timestamps.len()
            )
            .into(),
            format!(
                "{} antenna, {} weather rows",
                antenna_log.times.len(),
                weather_log.times.len()
            )
            .into(),
        ]);
        printer.push_block(vec![
            format!("Troom: {troom} K ({})", describe_source(troom_source)).into(),
            format!("Tamb:  {tamb} K ({})", describe_source(tamb_source)).into(),
        ]);
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.display();
        display_warnings();

        Ok(MergeParams {
            pixelid,
            ddb,
            readout,
            obsinfo,
            antenna: antenna_log,
            weather: weather_log,
            troom,
            tamb,
            output,
            overwrite,
        })
    }
}

fn ddb_name(ddb: &DetectorDatabase) -> String {
    ddb.file
        .as_ref()
        .map(|f| f.display().to_string())
        .unwrap_or_default()
}

fn describe_source(source: TemperatureSource) -> &'static str {
    match source {
        TemperatureSource::User => "user specified",
        TemperatureSource::Log => "from log",
        TemperatureSource::Default => "default",
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct MergeArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Path of the reduced FITS (made by "demerge reduce").
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) reduced: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(flatten)]
    pub(super) inputs: MergeInputArgs,
}

impl MergeArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<MergeArgs, DemergeError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let MergeArgs {
                args_file: _,
                reduced,
                inputs,
            } = unpack_arg_file!(arg_file);

            Ok(MergeArgs {
                args_file: None,
                reduced: cli_args.reduced.or(reduced),
                inputs: cli_args.inputs.merge(inputs),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<MergeParams, DemergeError> {
        let Self {
            args_file: _,
            reduced,
            inputs,
        } = self;

        let reduced = reduced.ok_or(MergeArgsError::Missing { arg: "--reduced" })?;
        inputs.parse(&reduced)
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), DemergeError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let dfits = params.run()?;
        info!("Wrote {}", dfits.display());
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum MergeArgsError {
    #[error("No {arg} was specified")]
    Missing { arg: &'static str },
}
