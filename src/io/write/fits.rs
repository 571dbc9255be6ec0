// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to assemble binary-table HDUs from ordered dictionaries of header
//! values and columns.

use std::{
    ffi::CString,
    path::Path,
    str::FromStr,
};

use fitsio::{
    errors::check_status as fits_check_status,
    hdu::FitsHdu,
    tables::{ColumnDataType, ColumnDescription},
    FitsFile,
};
use indexmap::IndexMap;
use log::{debug, trace};
use thiserror::Error;

use crate::io::read::fits::{fits_open_hdu, FitsError};

/// A value in a FITS header.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Str(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Str(s)
    }
}

impl From<i64> for HeaderValue {
    fn from(i: i64) -> Self {
        HeaderValue::Int(i)
    }
}

impl From<i32> for HeaderValue {
    fn from(i: i32) -> Self {
        HeaderValue::Int(i.into())
    }
}

impl From<usize> for HeaderValue {
    fn from(i: usize) -> Self {
        HeaderValue::Int(i as i64)
    }
}

impl From<f64> for HeaderValue {
    fn from(f: f64) -> Self {
        HeaderValue::Float(f)
    }
}

impl From<bool> for HeaderValue {
    fn from(b: bool) -> Self {
        HeaderValue::Bool(b)
    }
}

/// The values of a table column. Vector-valued columns hold their cells
/// row-major, i.e. all elements of the first row, then the second, ...
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Str(Vec<String>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Bool(_) => "bool",
            ColumnData::Int(_) => "int",
            ColumnData::Float(_) => "float",
            ColumnData::Double(_) => "double",
            ColumnData::Str(_) => "string",
        }
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(v: Vec<bool>) -> Self {
        ColumnData::Bool(v)
    }
}

impl From<Vec<i32>> for ColumnData {
    fn from(v: Vec<i32>) -> Self {
        ColumnData::Int(v)
    }
}

impl From<Vec<f32>> for ColumnData {
    fn from(v: Vec<f32>) -> Self {
        ColumnData::Float(v)
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        ColumnData::Double(v)
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self {
        ColumnData::Str(v)
    }
}

/// The element type of a table column, from the type letter of a FITS `TFORM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `L`
    Logical,
    /// `I`
    Short,
    /// `J`
    Int,
    /// `E`
    Float,
    /// `D`
    Double,
    /// `A`
    Char,
}

/// A parsed FITS `TFORM`, e.g. `D`, `63D` or `26A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    /// Elements per cell; for `A` columns, the string width.
    pub repeat: usize,
    pub kind: ColumnKind,
}

impl FromStr for ColumnFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (repeat, letter) = s.split_at(s.find(|c: char| !c.is_ascii_digit()).ok_or(())?);
        let repeat = if repeat.is_empty() {
            1
        } else {
            repeat.parse().map_err(|_| ())?
        };
        if repeat == 0 {
            return Err(());
        }
        let kind = match letter.to_ascii_uppercase().as_str() {
            "L" => ColumnKind::Logical,
            "I" => ColumnKind::Short,
            "J" => ColumnKind::Int,
            "E" => ColumnKind::Float,
            "D" => ColumnKind::Double,
            "A" => ColumnKind::Char,
            _ => return Err(()),
        };
        Ok(ColumnFormat { repeat, kind })
    }
}

impl ColumnFormat {
    fn data_type(self) -> ColumnDataType {
        match self.kind {
            ColumnKind::Logical => ColumnDataType::Logical,
            ColumnKind::Short => ColumnDataType::Short,
            ColumnKind::Int => ColumnDataType::Int,
            ColumnKind::Float => ColumnDataType::Float,
            ColumnKind::Double => ColumnDataType::Double,
            ColumnKind::Char => ColumnDataType::String,
        }
    }

    fn accepts(self, data: &ColumnData) -> bool {
        matches!(
            (self.kind, data),
            (ColumnKind::Logical, ColumnData::Bool(_))
                | (ColumnKind::Short | ColumnKind::Int, ColumnData::Int(_))
                | (ColumnKind::Float, ColumnData::Float(_))
                | (ColumnKind::Double, ColumnData::Double(_) | ColumnData::Float(_))
                | (ColumnKind::Char, ColumnData::Str(_))
        )
    }

    /// The number of table rows `data` occupies with this format.
    fn num_rows(self, data: &ColumnData) -> Option<usize> {
        match self.kind {
            ColumnKind::Char => Some(data.len()),
            _ if data.len() % self.repeat == 0 => Some(data.len() / self.repeat),
            _ => None,
        }
    }
}

/// Everything needed to make a binary-table HDU. Header values, header comments,
/// column values, column formats and column units are kept in separate ordered
/// dictionaries; entries are matched by key, and columns are written in the
/// order of `col_vals`.
///
/// The extension name is taken from the `EXTNAME` header value.
#[derive(Debug, Clone, Default)]
pub struct HduDict {
    pub hdr_vals: IndexMap<String, HeaderValue>,
    pub hdr_coms: IndexMap<String, String>,
    pub col_vals: IndexMap<String, ColumnData>,
    pub col_form: IndexMap<String, String>,
    pub col_unit: IndexMap<String, String>,
}

impl HduDict {
    pub fn new(extname: &str) -> HduDict {
        let mut hd = HduDict::default();
        hd.header("EXTNAME", extname, "Name of HDU");
        hd
    }

    /// Add (or replace) a header value. An empty comment means "no comment".
    pub fn header<V: Into<HeaderValue>>(&mut self, key: &str, value: V, comment: &str) -> &mut Self {
        self.hdr_vals.insert(key.to_string(), value.into());
        if !comment.is_empty() {
            self.hdr_coms.insert(key.to_string(), comment.to_string());
        }
        self
    }

    /// Add (or replace) a column. An empty unit means "no unit".
    pub fn column<D: Into<ColumnData>>(
        &mut self,
        name: &str,
        form: &str,
        unit: &str,
        data: D,
    ) -> &mut Self {
        self.col_vals.insert(name.to_string(), data.into());
        self.col_form.insert(name.to_string(), form.to_string());
        self.col_unit.insert(name.to_string(), unit.to_string());
        self
    }

    pub fn extname(&self) -> Option<&str> {
        match self.hdr_vals.get("EXTNAME") {
            Some(HeaderValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Create a FITS file for writing, removing any file already at the path.
pub(crate) fn fits_create(file: &Path) -> Result<FitsFile, BinTableError> {
    if file.exists() {
        debug!("Removing existing file {}", file.display());
        std::fs::remove_file(file)?;
    }
    Ok(FitsFile::create(file).open()?)
}

/// Append a binary-table HDU described by `hd` to `fptr`, returning the new
/// HDU.
pub fn create_bintablehdu(fptr: &mut FitsFile, hd: &HduDict) -> Result<FitsHdu, BinTableError> {
    let extname = hd.extname().ok_or(BinTableError::NoExtname)?;
    trace!("Creating binary table HDU {extname}");

    // Validate all columns before anything touches the file.
    let mut num_rows: Option<(usize, &str)> = None;
    let mut descriptions = Vec::with_capacity(hd.col_vals.len());
    for (name, data) in &hd.col_vals {
        let form_str = hd
            .col_form
            .get(name)
            .ok_or_else(|| BinTableError::MissingFormat {
                column: name.clone(),
            })?;
        let form: ColumnFormat = form_str.parse().map_err(|_| BinTableError::InvalidFormat {
            column: name.clone(),
            form: form_str.clone(),
        })?;
        if !form.accepts(data) {
            return Err(BinTableError::TypeMismatch {
                column: name.clone(),
                form: form_str.clone(),
                data_type: data.type_name(),
            });
        }
        if let ColumnData::Str(strings) = data {
            if let Some(s) = strings.iter().find(|s| s.len() > form.repeat) {
                return Err(BinTableError::StringTooLong {
                    column: name.clone(),
                    width: form.repeat,
                    value: s.clone(),
                });
            }
        }
        let rows = form
            .num_rows(data)
            .ok_or_else(|| BinTableError::RepeatMismatch {
                column: name.clone(),
                len: data.len(),
                repeat: form.repeat,
            })?;
        match num_rows {
            None => num_rows = Some((rows, name.as_str())),
            Some((expected, first)) if expected != rows => {
                return Err(BinTableError::RowMismatch {
                    first: first.to_string(),
                    expected,
                    column: name.clone(),
                    actual: rows,
                })
            }
            Some(_) => (),
        }

        descriptions.push(
            ColumnDescription::new(name)
                .with_type(form.data_type())
                .that_repeats(form.repeat)
                .create()?,
        );
    }

    let hdu = fptr.create_table(extname, &descriptions)?;
    for (i_col, (name, data)) in hd.col_vals.iter().enumerate() {
        if data.len() == 0 {
            continue;
        }
        match data {
            ColumnData::Bool(v) => write_logical_col(fptr, i_col + 1, v)?,
            ColumnData::Int(v) => {
                hdu.write_col(fptr, name, v)?;
            }
            ColumnData::Float(v) => {
                hdu.write_col(fptr, name, v)?;
            }
            ColumnData::Double(v) => {
                hdu.write_col(fptr, name, v)?;
            }
            ColumnData::Str(v) => {
                hdu.write_col(fptr, name, v)?;
            }
        }
    }

    // The raw calls below act on the current HDU.
    let hdu = fits_open_hdu(fptr, hdu.number)?;
    for (key, value) in &hd.hdr_vals {
        let comment = hd.hdr_coms.get(key).map(|c| c.as_str()).unwrap_or("");
        write_key_with_comment(fptr, key, value, comment)?;
    }
    // Comments may also be given for keys that cfitsio generated, e.g. TTYPE1.
    for (key, comment) in &hd.hdr_coms {
        if !hd.hdr_vals.contains_key(key) {
            modify_comment(fptr, key, comment)?;
        }
    }
    for (i_col, name) in hd.col_vals.keys().enumerate() {
        match hd.col_unit.get(name) {
            Some(unit) if !unit.is_empty() => write_key_with_comment(
                fptr,
                &format!("TUNIT{}", i_col + 1),
                &HeaderValue::Str(unit.clone()),
                "",
            )?,
            _ => (),
        }
    }

    Ok(hdu)
}

/// Write (key, value, comment) entries to the primary HDU of `fptr`.
pub fn write_primary_header(
    fptr: &mut FitsFile,
    keys: &[(&str, HeaderValue, &str)],
) -> Result<(), BinTableError> {
    fits_open_hdu(fptr, 0)?;
    for (key, value, comment) in keys {
        write_key_with_comment(fptr, key, value, comment)?;
    }
    Ok(())
}

/// fitsio can't write logical columns. `col_num` is 1-indexed.
fn write_logical_col(
    fptr: &mut FitsFile,
    col_num: usize,
    values: &[bool],
) -> Result<(), BinTableError> {
    let mut values: Vec<std::os::raw::c_char> = values.iter().map(|&b| b.into()).collect();
    let mut status = 0;
    unsafe {
        // ffpcll = fits_write_col_log
        fitsio_sys::ffpcll(
            fptr.as_raw(),             /* I - FITS file pointer                       */
            col_num as i32,            /* I - number of column to write (1 = 1st col) */
            1,                         /* I - first row to write (1 = 1st row)        */
            1,                         /* I - first vector element to write (1 = 1st) */
            values.len() as i64,       /* I - number of values to write              */
            values.as_mut_ptr(),       /* I - array of values to write                */
            &mut status,               /* IO - error status                           */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

fn to_cstring(s: &str) -> Result<CString, BinTableError> {
    CString::new(s).map_err(|_| BinTableError::NulByte { s: s.to_string() })
}

/// Update (or append) a key on the current HDU, together with its comment.
fn write_key_with_comment(
    fptr: &mut FitsFile,
    key: &str,
    value: &HeaderValue,
    comment: &str,
) -> Result<(), BinTableError> {
    let key_name = to_cstring(key)?;
    let comment = to_cstring(comment)?;
    let mut status = 0;
    match value {
        // cfitsio can't format non-finite floats.
        HeaderValue::Float(f) if !f.is_finite() => {
            let value = to_cstring(&f.to_string())?;
            unsafe {
                // ffukys = fits_update_key_str
                fitsio_sys::ffukys(
                    fptr.as_raw(),
                    key_name.as_ptr(),
                    value.as_ptr(),
                    comment.as_ptr(),
                    &mut status,
                );
            }
        }
        HeaderValue::Float(f) => unsafe {
            // ffukyd = fits_update_key_dbl; negative decimals means use as
            // many significant digits as needed.
            fitsio_sys::ffukyd(
                fptr.as_raw(),
                key_name.as_ptr(),
                *f,
                -15,
                comment.as_ptr(),
                &mut status,
            );
        },
        HeaderValue::Str(s) => {
            let value = to_cstring(s)?;
            unsafe {
                // ffukys = fits_update_key_str
                fitsio_sys::ffukys(
                    fptr.as_raw(),
                    key_name.as_ptr(),
                    value.as_ptr(),
                    comment.as_ptr(),
                    &mut status,
                );
            }
        }
        HeaderValue::Int(i) => unsafe {
            // ffukyj = fits_update_key_lng
            fitsio_sys::ffukyj(
                fptr.as_raw(),
                key_name.as_ptr(),
                *i,
                comment.as_ptr(),
                &mut status,
            );
        },
        HeaderValue::Bool(b) => unsafe {
            // ffukyl = fits_update_key_log
            fitsio_sys::ffukyl(
                fptr.as_raw(),
                key_name.as_ptr(),
                (*b).into(),
                comment.as_ptr(),
                &mut status,
            );
        },
    }
    fits_check_status(status).map_err(|e| BinTableError::Key {
        key: key.to_string(),
        fits_error: e,
    })
}

/// Replace the comment of an existing key on the current HDU.
fn modify_comment(fptr: &mut FitsFile, key: &str, comment: &str) -> Result<(), BinTableError> {
    let key_name = to_cstring(key)?;
    let comment = to_cstring(comment)?;
    let mut status = 0;
    unsafe {
        // ffmcom = fits_modify_comment
        fitsio_sys::ffmcom(
            fptr.as_raw(),
            key_name.as_ptr(),
            comment.as_ptr(),
            &mut status,
        );
    }
    fits_check_status(status).map_err(|e| BinTableError::Key {
        key: key.to_string(),
        fits_error: e,
    })
}

#[derive(Error, Debug)]
pub enum BinTableError {
    #[error("The header values don't contain a string EXTNAME")]
    NoExtname,

    #[error("No format was given for column '{column}'")]
    MissingFormat { column: String },

    #[error("Column '{column}' has an invalid or unsupported format '{form}'")]
    InvalidFormat { column: String, form: String },

    #[error("Column '{column}' has format '{form}', which can't hold {data_type} values")]
    TypeMismatch {
        column: String,
        form: String,
        data_type: &'static str,
    },

    #[error("Column '{column}' has {len} values, which isn't a multiple of its repeat count {repeat}")]
    RepeatMismatch {
        column: String,
        len: usize,
        repeat: usize,
    },

    #[error("Column '{column}' is {width} characters wide, but '{value}' is longer")]
    StringTooLong {
        column: String,
        width: usize,
        value: String,
    },

    #[error("Column '{first}' has {expected} rows, but column '{column}' has {actual}")]
    RowMismatch {
        first: String,
        expected: usize,
        column: String,
        actual: usize,
    },

    #[error("'{s}' contains a nul byte and can't be written to a FITS header")]
    NulByte { s: String },

    #[error("Couldn't write header key {key}: {fits_error}")]
    Key {
        key: String,
        fits_error: fitsio::errors::Error,
    },

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    Fitsio(#[from] fitsio::errors::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
