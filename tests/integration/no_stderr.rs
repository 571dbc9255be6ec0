// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use crate::{demerge, get_cmd_output, Inputs};

#[test]
fn test_merge_no_stderr() {
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");

    let cmd = demerge()
        .arg("merge")
        .args(inputs.merge_args(&output))
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_merge_warnings_no_stderr() {
    // Without a cabin log, a default room temperature is used with a warning;
    // warnings are logged, not printed to stderr.
    let inputs = Inputs::new();
    let output = inputs.path("dfits.fits");
    let args: Vec<String> = inputs
        .merge_args(&output)
        .into_iter()
        .filter(|a| a != "--cabin" && *a != inputs.cabin.display().to_string())
        .collect();

    let cmd = demerge().arg("merge").args(args).ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("No cabin log was given"));
}
