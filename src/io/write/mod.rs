// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code for writing FITS data products.

mod fits;

pub(crate) use fits::fits_create;
pub use fits::{
    create_bintablehdu, write_primary_header, BinTableError, ColumnData, ColumnFormat, ColumnKind,
    HduDict, HeaderValue,
};
