// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code for reading and writing the instrument's files.

mod glob;
pub mod read;
pub mod write;

pub use glob::GlobError;
pub(crate) use glob::get_first_match_from_glob;
