// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{demerge, get_cmd_output};

#[test]
fn test_reduce_needs_data_dir() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = demerge()
        .args(["reduce", "--output-dir"])
        .arg(tmp_dir.path().join("output"))
        .arg("--scripts-dir")
        .arg(tmp_dir.path())
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No raw data directory"), "{stderr}");
}

#[test]
fn test_reduce_scripts_dir_from_env() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = demerge()
        .env("DEMERGE_SCRIPTS_DIR", tmp_dir.path())
        .args(["reduce", "--dry-run", "--data-dir"])
        .arg(tmp_dir.path())
        .arg("--output-dir")
        .arg(tmp_dir.path().join("output"))
        .ok();
    assert!(cmd.is_ok(), "reduce failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains(&tmp_dir.path().display().to_string()));
}

#[test]
fn test_reduce_missing_scripts() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = demerge()
        .args(["reduce", "--data-dir"])
        .arg(tmp_dir.path())
        .arg("--output-dir")
        .arg(tmp_dir.path().join("output"))
        .arg("--scripts-dir")
        .arg(tmp_dir.path().join("nowhere"))
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Configure.py"), "{stderr}");
}
