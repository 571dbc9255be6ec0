// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod merge;
mod no_stderr;
mod reduce;
mod run;

use std::{
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use fitsio::FitsFile;
use indoc::indoc;
use tempfile::TempDir;

use demerge::io::write::{create_bintablehdu, HduDict};

fn demerge() -> Command {
    Command::cargo_bin("demerge").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

const NKID: usize = 3;

/// A DDB with one pixel of 3 KIDs: a filter KID, a wideband KID and a blind
/// KID.
fn write_ddb(file: &Path) {
    let mut fptr = FitsFile::create(file).open().unwrap();

    let mut kidfilt = HduDict::new("KIDFILT");
    kidfilt
        .header("NKID0", NKID, "")
        .column("kidid", "J", "", vec![0, 1, 2])
        .column("masterid", "J", "", vec![20, 21, 22])
        .column(
            "F_filter, dF_filter",
            "2D",
            "GHz",
            vec![350.0, 0.1, 0.0, 0.0, 0.0, 0.0],
        )
        .column(
            "Q_filter, dQ_filter",
            "2D",
            "",
            vec![300.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        );
    create_bintablehdu(&mut fptr, &kidfilt).unwrap();

    let mut kiddes = HduDict::new("KIDDES");
    kiddes
        .column("masterid", "J", "", vec![20, 21, 22])
        .column(
            "attribute",
            "16A",
            "",
            vec![
                "filter".to_string(),
                "wideband".to_string(),
                "blind".to_string(),
            ],
        );
    create_bintablehdu(&mut fptr, &kiddes).unwrap();

    let mut kidresp = HduDict::new("KIDRESP");
    kidresp.column(
        "cal params",
        "3D",
        "",
        vec![2e-4, 0.5, 10.0, 3e-4, 1.0, 20.0, 5e-4, 0.8, 5.0],
    );
    create_bintablehdu(&mut fptr, &kidresp).unwrap();
}

/// A reduced FITS for pixel 0 with 2 timestamps.
fn write_reduced(file: &Path) {
    let mut fptr = FitsFile::create(file).open().unwrap();

    let mut readout = HduDict::new("READOUT");
    readout
        .header("NKID0", NKID, "")
        .column("timestamp", "D", "s", vec![1509626096.0, 1509626097.0])
        .column("pixelid", "I", "", vec![0, 0]);
    for i_kid in 0..NKID {
        let linph = 0.01 * (i_kid + 1) as f64;
        readout.column(
            &format!("Amp, Ph, linPh {i_kid}"),
            "3D",
            "",
            vec![1.0, -0.5, linph, 1.0, -0.5, 2.0 * linph],
        );
    }
    create_bintablehdu(&mut fptr, &readout).unwrap();

    let mut kidsinfo = HduDict::new("KIDSINFO");
    kidsinfo
        .column("pixelid", "I", "", vec![0, 0, 0])
        .column("kidid", "J", "", vec![0, 1, 2])
        .column("yfc, linyfc", "2D", "", vec![0.0, 0.1, 0.0, 0.2, 0.0, 0.3])
        .column(
            "Qr, dQr (300K)",
            "2D",
            "",
            vec![1000.0, 1.0, 2000.0, 1.0, 3000.0, 1.0],
        );
    create_bintablehdu(&mut fptr, &kidsinfo).unwrap();
}

/// Everything "demerge merge" needs, in a temporary directory.
struct Inputs {
    dir: TempDir,
    ddb: PathBuf,
    reduced: PathBuf,
    obsinst: PathBuf,
    antenna: PathBuf,
    weather: PathBuf,
    cabin: PathBuf,
}

impl Inputs {
    fn new() -> Inputs {
        let dir = TempDir::new().expect("couldn't make tmp dir");
        let ddb = dir.path().join("DDB_test.fits");
        let reduced = dir.path().join("reduced_20171102123456.fits");
        let obsinst = dir.path().join("20171102123456.obs");
        let antenna = dir.path().join("20171102123456.ant");
        let weather = dir.path().join("20171102123456.wea");
        let cabin = dir.path().join("20171102123456.cabin");

        write_ddb(&ddb);
        write_reduced(&reduced);
        std::fs::write(
            &obsinst,
            indoc! {"
                SET DES OBS_USER 'deshima'
                SET ANTENNA_G TRK_TYPE 'RADEC'
                SET ANTENNA_G SRC_NAME 'Jupiter'
                SET ANTENNA_G SRC_POS (10.5,-5.25)
                SET ANTENNA_G EPOCH 'J2000'
            "},
        )
        .unwrap();
        std::fs::write(
            &antenna,
            indoc! {"
                # time ra-prg dec-prg az-prg el-prg az-real el-real x y type
                20171102123456.000000 10.5 -5.25 100.0 45.0 100.1 45.1 0.0 0.0 ON
                20171102123457.000000 10.5 -5.25 100.0 45.0 100.2 45.2 0.0 0.0 ON
            "},
        )
        .unwrap();
        std::fs::write(&weather, "20171102123400.0 1.0 570.0 1.0 5.0 90.0\n").unwrap();
        std::fs::write(&cabin, "20171102123500.0 18.0\n").unwrap();

        Inputs {
            dir,
            ddb,
            reduced,
            obsinst,
            antenna,
            weather,
            cabin,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Arguments for "demerge merge" writing to `output`.
    fn merge_args(&self, output: &Path) -> Vec<String> {
        [
            ("--reduced", &self.reduced),
            ("--ddb", &self.ddb),
            ("--obsinst", &self.obsinst),
            ("--antenna", &self.antenna),
            ("--weather", &self.weather),
            ("--cabin", &self.cabin),
        ]
        .into_iter()
        .flat_map(|(flag, path)| [flag.to_string(), path.display().to_string()])
        .chain(["--output".to_string(), output.display().to_string()])
        .collect()
    }
}

#[test]
fn test_help() {
    let cmd = demerge().arg("--help").ok();
    assert!(cmd.is_ok());
    let (stdout, _) = get_cmd_output(cmd);
    for sub_command in ["reduce", "merge", "run"] {
        assert!(stdout.contains(sub_command), "{sub_command} isn't in --help");
    }
}

#[test]
fn test_no_subcommand_fails() {
    let cmd = demerge().ok();
    assert!(cmd.is_err());
}
