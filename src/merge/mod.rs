// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Merging of the readout, logging streams, observation information and DDB
//! of one pixel into a "DFITS" file.
//!
//! A DFITS file has an (empty) primary HDU followed by the binary tables
//! "OBSINFO", "ANTENNA", "WEATHER" and "READOUT".


use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, trace};
use thiserror::Error;

use crate::{
    calibrate::{calibrate_to_power, CalibrateError},
    constants::*,
    ddb::{get_maskid_corresp, DdbError, DetectorDatabase},
    io::{
        read::{AntennaLog, CabinLog, ObsInfo, WeatherLog},
        write::{
            create_bintablehdu, fits_create, write_primary_header, BinTableError, HduDict,
            HeaderValue,
        },
    },
    readout::ReducedReadout,
    time::{convert_timestamp, timestamp_to_datetime, TimeError},
};

/// Where a temperature used for calibration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureSource {
    /// Given by the user.
    User,
    /// Averaged from a log.
    Log,
    /// Nothing was available; a default was used.
    Default,
}

/// The room (cabin) temperature [K] for calibration. Without a user-specified
/// value, this is the mean cabin temperature within [`CABIN_Q_MARGIN`] of the
/// readout timestamps.
pub fn room_temperature(
    troom: Option<f64>,
    cabin: Option<&CabinLog>,
    timestamps: &[f64],
) -> (f64, TemperatureSource) {
    if let Some(troom) = troom {
        return (troom, TemperatureSource::User);
    }
    let start = timestamps.iter().copied().reduce(f64::min);
    let end = timestamps.iter().copied().reduce(f64::max);
    match (cabin, start, end) {
        (Some(cabin), Some(start), Some(end)) => {
            match cabin.mean_temperature_between(start - CABIN_Q_MARGIN, end + CABIN_Q_MARGIN) {
                Some(t) => (t + KELVIN_OFFSET, TemperatureSource::Log),
                None => (DEFAULT_ROOM_T, TemperatureSource::Default),
            }
        }
        _ => (DEFAULT_ROOM_T, TemperatureSource::Default),
    }
}

/// The ambient temperature [K] for calibration. Without a user-specified value,
/// this is the mean weather temperature.
pub fn ambient_temperature(tamb: Option<f64>, weather: &WeatherLog) -> (f64, TemperatureSource) {
    match (tamb, weather.mean_temperature()) {
        (Some(tamb), _) => (tamb, TemperatureSource::User),
        (None, Some(t)) => (t + KELVIN_OFFSET, TemperatureSource::Log),
        (None, None) => (DEFAULT_AMB_T, TemperatureSource::Default),
    }
}

/// It is an error for `output` to exist, unless it may be overwritten.
pub fn check_output(output: &Path, overwrite: bool) -> Result<(), MergeError> {
    if output.exists() && !overwrite {
        return Err(MergeError::OutputExists(output.to_path_buf()));
    }
    Ok(())
}

/// Everything needed to make a DFITS file.
#[derive(Debug)]
pub struct MergeParams {
    pub pixelid: usize,
    pub ddb: DetectorDatabase,
    pub readout: ReducedReadout,
    pub obsinfo: ObsInfo,
    pub antenna: AntennaLog,
    pub weather: WeatherLog,
    /// Room (cabin) temperature [K].
    pub troom: f64,
    /// Ambient temperature [K].
    pub tamb: f64,
    pub output: PathBuf,
    pub overwrite: bool,
}

impl MergeParams {
    /// Calibrate the readout and write the DFITS file. The path of the DFITS
    /// file is returned.
    pub fn run(&self) -> Result<PathBuf, MergeError> {
        let Self {
            pixelid,
            ddb,
            readout,
            obsinfo,
            antenna,
            weather,
            troom,
            tamb,
            output,
            overwrite,
        } = self;
        let pixelid = *pixelid;
        check_output(output, *overwrite)?;

        let first_timestamp = match readout.timestamps.first() {
            Some(&t) => t,
            None => return Err(MergeError::EmptyReadout),
        };
        let corresp = get_maskid_corresp(pixelid, ddb)?;
        if corresp.kidids.len() != readout.nkid() {
            return Err(MergeError::NkidMismatch {
                pixelid,
                ddb: corresp.kidids.len(),
                readout: readout.nkid(),
            });
        }
        let nkid = readout.nkid();
        let num_times = readout.timestamps.len();

        info!("Calibrating {nkid} KIDs over {num_times} timestamps");
        let tsignal = calibrate_to_power(pixelid, *troom, *tamb, readout, ddb)?;

        // OBSINFO
        let date_obs = timestamp_to_datetime(first_timestamp)?
            .format(FORM_FITSTIME)
            .to_string();
        let interval = if num_times > 1 {
            (readout.timestamps[num_times - 1] - first_timestamp) / (num_times - 1) as f64
        } else {
            0.0
        };
        let mut obsinfo_hd = HduDict::new("OBSINFO");
        obsinfo_hd
            .header("FITSTYPE", "DESHIMAv0", "Type of FITS data")
            .header("TELESCOP", TELESCOPE, "Telescope name")
            .header("SITELON", ASTE_LONG_DEG, "Site longitude [deg]")
            .header("SITELAT", ASTE_LAT_DEG, "Site latitude [deg]")
            .header("SITEELEV", ASTE_HEIGHT_M, "Site elevation [m]")
            .header("DATE-OBS", date_obs, "Time of observation start")
            .header("OBSERVER", obsinfo.observer.as_str(), "Name of observer")
            .header("OBJECT", obsinfo.obs_object.as_str(), "Name of observed object")
            .header("RA", obsinfo.ra, "Right ascension of the object [deg]")
            .header("DEC", obsinfo.dec, "Declination of the object [deg]")
            .header("EQUINOX", equinox_value(&obsinfo.equinox), "Equinox of RA/Dec")
            .header("TROOM", *troom, "Room temperature used for calibration [K]")
            .header("TAMB", *tamb, "Ambient temperature used for calibration [K]")
            .column("pixelid", "I", "", vec![pixelid as i32])
            .column("offsetaz", "D", "deg", vec![0.0])
            .column("offsetel", "D", "deg", vec![0.0])
            .column("interval", "D", "s", vec![interval])
            .column("integtime", "D", "s", vec![interval])
            .column("masterids", &format!("{nkid}J"), "", corresp.masterids)
            .column("kidids", &format!("{nkid}J"), "", corresp.kidids)
            .column("kidtypes", &format!("{nkid}J"), "", corresp.kidtypes)
            .column("kidfreqs", &format!("{nkid}D"), "GHz", corresp.kidfreqs)
            .column("kidQs", &format!("{nkid}D"), "", corresp.kidqs);

        // ANTENNA
        let mut antenna_hd = HduDict::new("ANTENNA");
        antenna_hd
            .header("NROWS", antenna.times.len(), "Number of antenna log rows")
            .column("time", &format!("{FITSTIME_P_LEN}A"), "", format_times(&antenna.times))
            .column(
                "scantype",
                &format!("{}A", string_width(&antenna.scan_types)),
                "",
                antenna.scan_types.clone(),
            )
            .column("az", "D", "deg", antenna.az_real.clone())
            .column("el", "D", "deg", antenna.el_real.clone())
            .column("ra", "D", "deg", antenna.ra_prog.clone())
            .column("dec", "D", "deg", antenna.dec_prog.clone())
            .column("az_center", "D", "deg", antenna.az_prog.clone())
            .column("el_center", "D", "deg", antenna.el_prog.clone())
            .column("x", "D", "arcsec", antenna.x.clone())
            .column("y", "D", "arcsec", antenna.y.clone());

        // WEATHER
        let mut weather_hd = HduDict::new("WEATHER");
        weather_hd
            .header("NROWS", weather.times.len(), "Number of weather log rows")
            .column("time", &format!("{FITSTIME_P_LEN}A"), "", format_times(&weather.times))
            .column(
                "temperature",
                "D",
                "K",
                weather
                    .temperature
                    .iter()
                    .map(|t| t + KELVIN_OFFSET)
                    .collect::<Vec<f64>>(),
            )
            .column("pressure", "D", "hPa", weather.pressure.clone())
            .column("vapor-pressure", "D", "hPa", weather.vapor_pressure.clone())
            .column("windspd", "D", "m/s", weather.wind_speed.clone())
            .column("winddir", "D", "deg", weather.wind_direction.clone());

        // READOUT
        let mut readout_hd = HduDict::new("READOUT");
        readout_hd
            .header("NKID", nkid, "Number of KIDs")
            .header(
                "FILENAME",
                file_name(readout.file.as_deref()),
                "Name of the reduced FITS",
            )
            .header("DDBFILE", file_name(ddb.file.as_deref()), "Name of the DDB")
            .column(
                "starttime",
                &format!("{FITSTIME_P_LEN}A"),
                "",
                convert_timestamp(&readout.timestamps)?,
            )
            .column("pixelid", "I", "", vec![pixelid as i32; num_times])
            .column(
                "Tsignal",
                &format!("{nkid}D"),
                "K",
                tsignal.iter().copied().collect::<Vec<f64>>(),
            );

        info!("Writing {}", output.display());
        let mut fptr = fits_create(output)?;
        let software = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        write_primary_header(
            &mut fptr,
            &[
                (
                    "SOFTWARE",
                    HeaderValue::from(software),
                    "Software that made this file",
                ),
                (
                    "DATE",
                    HeaderValue::from(Utc::now().format(FORM_FITSTIME).to_string()),
                    "Time this file was made (UTC)",
                ),
            ],
        )?;
        for hd in [&obsinfo_hd, &antenna_hd, &weather_hd, &readout_hd] {
            debug!("Writing HDU {}", hd.extname().unwrap_or_default());
            create_bintablehdu(&mut fptr, hd)?;
        }
        trace!("Finished writing {}", output.display());

        Ok(output.clone())
    }
}

/// Numeric equinoxes are written as numbers.
fn equinox_value(equinox: &str) -> HeaderValue {
    match equinox.parse::<f64>() {
        Ok(e) => HeaderValue::Float(e),
        Err(_) => HeaderValue::Str(equinox.to_string()),
    }
}

fn format_times(times: &[chrono::NaiveDateTime]) -> Vec<String> {
    times
        .iter()
        .map(|t| t.format(FORM_FITSTIME_P).to_string())
        .collect()
}

/// The width of a string column holding `strings`; at least 1.
fn string_width(strings: &[String]) -> usize {
    strings.iter().map(|s| s.len()).max().unwrap_or(0).max(1)
}

fn file_name(file: Option<&Path>) -> String {
    file.and_then(|f| f.file_name())
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Output {0} already exists; use --overwrite to replace it")]
    OutputExists(PathBuf),

    #[error("The readout has no timestamps")]
    EmptyReadout,

    #[error("The DDB says pixel {pixelid} has {ddb} KIDs, but the readout has {readout}")]
    NkidMismatch {
        pixelid: usize,
        ddb: usize,
        readout: usize,
    },

    #[error(transparent)]
    Ddb(#[from] DdbError),

    #[error(transparent)]
    Calibrate(#[from] CalibrateError),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    BinTable(#[from] BinTableError),
}
