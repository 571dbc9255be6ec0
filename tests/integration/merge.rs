// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use fitsio::FitsFile;

use crate::{demerge, get_cmd_output, Inputs, NKID};

#[test]
fn test_merge() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits_20171102123456.fits");

    let cmd = demerge()
        .arg("merge")
        .args(inputs.merge_args(&output))
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Troom"));

    let mut fptr = FitsFile::open(&output).unwrap();
    let hdu = fptr.hdu("OBSINFO").unwrap();
    let object: String = hdu.read_key(&mut fptr, "OBJECT").unwrap();
    assert_eq!(object, "Jupiter");
    let observer: String = hdu.read_key(&mut fptr, "OBSERVER").unwrap();
    assert_eq!(observer, "deshima");
    let troom: f64 = hdu.read_key(&mut fptr, "TROOM").unwrap();
    assert_abs_diff_eq!(troom, 18.0 + 273.15, epsilon = 1e-10);
    let tamb: f64 = hdu.read_key(&mut fptr, "TAMB").unwrap();
    assert_abs_diff_eq!(tamb, 1.0 + 273.15, epsilon = 1e-10);

    let hdu = fptr.hdu("ANTENNA").unwrap();
    let scan_types: Vec<String> = hdu.read_col(&mut fptr, "scantype").unwrap();
    assert_eq!(scan_types, ["ON", "ON"]);

    let hdu = fptr.hdu("READOUT").unwrap();
    let nkid: i64 = hdu.read_key(&mut fptr, "NKID").unwrap();
    assert_eq!(nkid, NKID as i64);
    let filename: String = hdu.read_key(&mut fptr, "FILENAME").unwrap();
    assert_eq!(filename, "reduced_20171102123456.fits");
    let starttimes: Vec<String> = hdu.read_col(&mut fptr, "starttime").unwrap();
    assert_eq!(
        starttimes,
        ["2017-11-02T12:34:56.000000", "2017-11-02T12:34:57.000000"]
    );
}

#[test]
fn test_merge_user_temperatures() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");

    let cmd = demerge()
        .arg("merge")
        .args(inputs.merge_args(&output))
        .args(["--troom", "295.5", "--tamb", "268.0"])
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());

    let mut fptr = FitsFile::open(&output).unwrap();
    let hdu = fptr.hdu("OBSINFO").unwrap();
    let troom: f64 = hdu.read_key(&mut fptr, "TROOM").unwrap();
    assert_abs_diff_eq!(troom, 295.5);
    let tamb: f64 = hdu.read_key(&mut fptr, "TAMB").unwrap();
    assert_abs_diff_eq!(tamb, 268.0);
}

#[test]
fn test_merge_dry_run() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");

    let cmd = demerge()
        .args(["merge", "--dry-run"])
        .args(inputs.merge_args(&output))
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    assert!(!output.exists());
}

#[test]
fn test_merge_refuses_to_overwrite() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");
    std::fs::write(&output, "precious").unwrap();

    let cmd = demerge()
        .arg("merge")
        .args(inputs.merge_args(&output))
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("already exists"), "{stderr}");
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "precious");

    let cmd = demerge()
        .args(["merge", "--overwrite"])
        .args(inputs.merge_args(&output))
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    assert!(FitsFile::open(&output).is_ok());
}

#[test]
fn test_merge_missing_input() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");

    let cmd = demerge()
        .args(["merge", "--reduced"])
        .arg(&inputs.reduced)
        .arg("--output")
        .arg(&output)
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No --ddb was specified"), "{stderr}");
}

#[test]
fn test_merge_wrong_pixel() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");

    let cmd = demerge()
        .arg("merge")
        .args(inputs.merge_args(&output))
        .args(["--pixelid", "1"])
        .ok();
    assert!(cmd.is_err());
    assert!(!output.exists());
}

#[test]
fn test_save_toml_then_reuse() {
    let inputs = Inputs::new();
    let toml = inputs.path("merge.toml");
    let output = inputs.path("dfits.fits");

    // Save the arguments without doing anything.
    let cmd = demerge()
        .args(["merge", "--dry-run", "--save-toml"])
        .arg(&toml)
        .args(inputs.merge_args(&output))
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    assert!(toml.exists());
    assert!(!output.exists());

    let cmd = demerge().arg("merge").arg(&toml).ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    assert!(output.exists());
}
