// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Temperatures are in Kelvin, times in seconds and angles in degrees.
 */

/// FITS time format without fractional seconds (YYYY-mm-ddTHH:MM:SS).
pub const FORM_FITSTIME: &str = "%Y-%m-%dT%H:%M:%S";

/// FITS time format with microseconds (YYYY-mm-ddTHH:MM:SS.ffffff).
pub const FORM_FITSTIME_P: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// The format of time stamps in the logging data (YYYYmmddHHMMSS.ffffff).
pub const FORM_ASCIITIME: &str = "%Y%m%d%H%M%S%.f";

/// Number of characters in a string formatted with [`FORM_FITSTIME_P`].
pub const FITSTIME_P_LEN: usize = 26;

/// Margin for the cabin data query around the readout time range [seconds].
pub const CABIN_Q_MARGIN: f64 = 5.0 * 60.0;

/// Used for the room (cabin) temperature when no cabin data are available
/// [K].
pub const DEFAULT_ROOM_T: f64 = 17.0 + 273.0;

/// Used for the ambient temperature when no weather data are available [K].
pub const DEFAULT_AMB_T: f64 = 0.0 + 273.0;

/// Degrees Celsius to Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// The telescope the receiver is mounted on.
pub const TELESCOPE: &str = "ASTE";

/// ASTE longitude [degrees].
pub const ASTE_LONG_DEG: f64 = -67.703_081_39;

/// ASTE latitude [degrees].
pub const ASTE_LAT_DEG: f64 = -22.971_971_11;

/// ASTE height above sea level [metres].
pub const ASTE_HEIGHT_M: f64 = 4861.9;

/// Default equinox of source positions when an observation instruction doesn't
/// give one.
pub const DEFAULT_EQUINOX: &str = "2000";
