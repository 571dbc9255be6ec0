// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Test fixtures shared between modules: a small DDB, a reduced readout of the
//! same pixel, and logging data that overlaps the readout in time.

use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};

use indoc::indoc;
use ndarray::prelude::*;
use tempfile::TempDir;

use crate::{
    ddb::DetectorDatabase,
    io::write::{create_bintablehdu, fits_create, HduDict},
    readout::ReducedReadout,
};

pub(crate) const PIXELID: usize = 0;
pub(crate) const NKID: usize = 4;
pub(crate) const KIDIDS: [i32; NKID] = [0, 1, 2, 3];
pub(crate) const MASTERIDS: [i32; NKID] = [10, 11, -1, 12];
pub(crate) const F_FILTER: [f64; NKID] = [350.0, 0.0, 0.0, 400.0];
pub(crate) const Q_FILTER: [f64; NKID] = [300.0, 0.0, 0.0, 350.0];
pub(crate) const KIDDES_MASTERIDS: [i32; 3] = [10, 11, 12];
pub(crate) const KIDDES_ATTRIBUTES: [&str; 3] = ["filter", "wideband", "blind"];
/// (p0, etaf, T0) of each KID.
pub(crate) const CAL_PARAMS: [[f64; 3]; NKID] = [
    [2.0e-4, 0.5, 10.0],
    [3.0e-4, 1.0, 20.0],
    [1.0, 1.0, 1.0],
    [5.0e-4, 0.8, 5.0],
];

/// 2017-11-02T12:34:56, 12:34:56.5 and 12:34:57 UTC.
pub(crate) const TIMESTAMPS: [f64; 3] = [1509626096.0, 1509626096.5, 1509626097.0];
pub(crate) const LINYFC: [f64; NKID] = [0.1, 0.2, 0.3, 0.4];
pub(crate) const QR: [f64; NKID] = [1000.0, 2000.0, 3000.0, 4000.0];

/// The linearised phase of a KID at a timestamp. The first timestamp sits on
/// resonance.
pub(crate) fn linphase(i_time: usize, i_kid: usize) -> f64 {
    LINYFC[i_kid] + 0.004 * (i_time * (i_kid + 1)) as f64
}

pub(crate) fn get_test_ddb() -> DetectorDatabase {
    DetectorDatabase {
        file: None,
        nkid: BTreeMap::from([(PIXELID, NKID), (1, 2)]),
        filters: (0..NKID)
            .map(|i| crate::ddb::KidFilter {
                kidid: KIDIDS[i],
                masterid: MASTERIDS[i],
                f_filter: F_FILTER[i],
                df_filter: 0.1,
                q_filter: Q_FILTER[i],
                dq_filter: 1.0,
            })
            .collect(),
        attributes: KIDDES_MASTERIDS
            .iter()
            .zip(KIDDES_ATTRIBUTES)
            .map(|(&m, a)| (m, a.to_string()))
            .collect(),
        cal_params: Array2::from_shape_fn((NKID, 3), |(i, j)| CAL_PARAMS[i][j]),
    }
}

pub(crate) fn get_test_readout() -> ReducedReadout {
    ReducedReadout {
        file: None,
        pixelid: PIXELID,
        timestamps: TIMESTAMPS.to_vec(),
        linphase: Array2::from_shape_fn((TIMESTAMPS.len(), NKID), |(t, i)| linphase(t, i)),
        linyfc: Array1::from(LINYFC.to_vec()),
        qr: Array1::from(QR.to_vec()),
    }
}

pub(crate) fn write_test_ddb(file: &Path) {
    let mut fptr = fits_create(file).unwrap();

    let mut kidfilt = HduDict::new("KIDFILT");
    kidfilt
        .header("NKID0", NKID, "Number of KIDs of pixel 0")
        .header("NKID1", 2_usize, "Number of KIDs of pixel 1")
        .column("kidid", "J", "", KIDIDS.to_vec())
        .column("masterid", "J", "", MASTERIDS.to_vec())
        .column(
            "F_filter, dF_filter",
            "2D",
            "GHz",
            F_FILTER.iter().flat_map(|&f| [f, 0.1]).collect::<Vec<f64>>(),
        )
        .column(
            "Q_filter, dQ_filter",
            "2D",
            "",
            Q_FILTER.iter().flat_map(|&q| [q, 1.0]).collect::<Vec<f64>>(),
        );
    create_bintablehdu(&mut fptr, &kidfilt).unwrap();

    let mut kiddes = HduDict::new("KIDDES");
    kiddes
        .column("masterid", "J", "", KIDDES_MASTERIDS.to_vec())
        .column(
            "attribute",
            "16A",
            "",
            KIDDES_ATTRIBUTES
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>(),
        );
    create_bintablehdu(&mut fptr, &kiddes).unwrap();

    let mut kidresp = HduDict::new("KIDRESP");
    kidresp.column(
        "cal params",
        "3D",
        "",
        CAL_PARAMS.iter().flatten().copied().collect::<Vec<f64>>(),
    );
    create_bintablehdu(&mut fptr, &kidresp).unwrap();
}

pub(crate) fn write_test_reduced(file: &Path) {
    let mut fptr = fits_create(file).unwrap();

    let mut readout = HduDict::new("READOUT");
    readout
        .header("NKID0", NKID, "Number of KIDs of pixel 0")
        .column("timestamp", "D", "s", TIMESTAMPS.to_vec())
        .column("pixelid", "I", "", vec![PIXELID as i32; TIMESTAMPS.len()]);
    for i_kid in 0..NKID {
        let cells = (0..TIMESTAMPS.len())
            .flat_map(|t| [1.0, -0.5, linphase(t, i_kid)])
            .collect::<Vec<f64>>();
        readout.column(&format!("Amp, Ph, linPh {i_kid}"), "3D", "", cells);
    }
    create_bintablehdu(&mut fptr, &readout).unwrap();

    let mut kidsinfo = HduDict::new("KIDSINFO");
    kidsinfo
        .column("pixelid", "I", "", vec![PIXELID as i32; NKID])
        .column("kidid", "J", "", KIDIDS.to_vec())
        .column(
            "yfc, linyfc",
            "2D",
            "",
            LINYFC.iter().flat_map(|&y| [0.0, y]).collect::<Vec<f64>>(),
        )
        .column(
            "Qr, dQr (300K)",
            "2D",
            "",
            QR.iter().flat_map(|&q| [q, 10.0]).collect::<Vec<f64>>(),
        );
    create_bintablehdu(&mut fptr, &kidsinfo).unwrap();
}

/// Files for a whole merge, in a temporary directory.
pub(crate) struct TestInputs {
    /// Keeps the files alive.
    pub(crate) dir: TempDir,
    pub(crate) ddb: PathBuf,
    pub(crate) reduced: PathBuf,
    pub(crate) obsinst: PathBuf,
    pub(crate) antenna: PathBuf,
    pub(crate) weather: PathBuf,
    pub(crate) cabin: PathBuf,
}

fn write_text(file: &Path, contents: &str) {
    let mut f = std::fs::File::create(file).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
}

pub(crate) fn write_test_inputs() -> TestInputs {
    let dir = TempDir::new().expect("couldn't make tmp dir");
    let ddb = dir.path().join("ddb_test.fits");
    let reduced = dir.path().join("reduced_20171102123456.fits");
    let obsinst = dir.path().join("20171102123456.obs");
    let antenna = dir.path().join("20171102123456.ant");
    let weather = dir.path().join("20171102123456.wea");
    let cabin = dir.path().join("20171102123456.cabin");

    write_test_ddb(&ddb);
    write_test_reduced(&reduced);
    write_text(
        &obsinst,
        indoc! {"
            SET DES OBS_USER 'deshima'
            SET ANTENNA_G TRK_TYPE 'RADEC'
            SET ANTENNA_G SRC_NAME 'IRC+10216'
            SET ANTENNA_G SRC_POS (146.989193,13.278768)
            SET ANTENNA_G EPOCH 'J2000'
        "},
    );
    write_text(
        &antenna,
        indoc! {"
            # time ra-prg dec-prg az-prg el-prg az-real el-real x y type
            20171102123456.000000 146.98 13.27 120.50 60.10 120.51 60.09 0.0 0.0 ON
            20171102123456.500000 146.98 13.27 120.50 60.10 120.52 60.10 0.0 0.0 ON
            20171102123457.000000 146.98 13.27 120.50 60.10 120.50 60.11 30.0 0.0 OFF
        "},
    );
    write_text(
        &weather,
        indoc! {"
            20171102123400.0 -4.0 571.0 1.2 5.5 270.0
            20171102123500.0 -2.0 571.1 1.3 6.5 280.0
        "},
    );
    // Only the middle two are within the cabin query margin of the readout.
    write_text(
        &cabin,
        indoc! {"
            20171102120000.0 0.0
            20171102123000.0 19.0
            20171102123900.0 21.0
            20171102130000.0 40.0
        "},
    );

    TestInputs {
        dir,
        ddb,
        reduced,
        obsinst,
        antenna,
        weather,
        cabin,
    }
}
