// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use fitsio::FitsFile;

use crate::{demerge, get_cmd_output, Inputs};

/// Shell stand-ins for the reduction scripts that "reduce" into a copy of
/// `reduced`.
fn write_scripts(dir: &Path, reduced: &Path) -> PathBuf {
    let scripts_dir = dir.join("scripts");
    std::fs::create_dir(&scripts_dir).unwrap();
    std::fs::write(
        scripts_dir.join("Configure.py"),
        "mkdir -p \"$2\" && echo \"$2\" > output_dir\n",
    )
    .unwrap();
    std::fs::write(scripts_dir.join("FitSweep.py"), "test -f output_dir\n").unwrap();
    std::fs::write(
        scripts_dir.join("SaveFits.py"),
        format!(
            "cp '{}' \"$(cat output_dir)/reduced_20171102123456.fits\"\n",
            reduced.display()
        ),
    )
    .unwrap();
    scripts_dir
}

fn run_args(inputs: &Inputs) -> Vec<String> {
    let data_dir = inputs.path("cosmos_20171102123456");
    std::fs::create_dir_all(&data_dir).unwrap();
    let scripts_dir = write_scripts(inputs.dir.path(), &inputs.reduced);
    let mut args = vec![
        "run".to_string(),
        "--data-dir".to_string(),
        data_dir.display().to_string(),
        "--output-dir".to_string(),
        inputs.path("output_20171102123456").display().to_string(),
        "--scripts-dir".to_string(),
        scripts_dir.display().to_string(),
        "--interpreter".to_string(),
        "sh".to_string(),
    ];
    // "run" gets its reduced FITS from the reduction.
    args.extend(
        inputs
            .merge_args(&inputs.path("dfits_20171102123456.fits"))
            .into_iter()
            .skip(2),
    );
    args
}

#[test]
fn test_run() {
    let inputs = Inputs::new();
    let cmd = demerge().args(run_args(&inputs)).ok();
    assert!(cmd.is_ok(), "run failed: {}", cmd.err().unwrap());

    assert!(inputs
        .path("output_20171102123456")
        .join("reduced_20171102123456.fits")
        .exists());
    let mut fptr = FitsFile::open(inputs.path("dfits_20171102123456.fits")).unwrap();
    let hdu = fptr.hdu("READOUT").unwrap();
    let pixelids: Vec<i32> = hdu.read_col(&mut fptr, "pixelid").unwrap();
    assert_eq!(pixelids, [0, 0]);
}

#[test]
fn test_run_reduction_failure() {
    let inputs = Inputs::new();
    let args = run_args(&inputs);
    std::fs::write(
        inputs.path("scripts").join("FitSweep.py"),
        "echo 'sweep fit failed' >&2\nexit 1\n",
    )
    .unwrap();

    let cmd = demerge().args(args).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("FitSweep.py"), "{stderr}");
    assert!(stderr.contains("sweep fit failed"), "{stderr}");
    assert!(!inputs.path("dfits_20171102123456.fits").exists());
}
