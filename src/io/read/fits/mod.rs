// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions for reading FITS files.

mod error;

pub use error::FitsError;

use std::{ffi::CString, fmt::Display, panic::Location, path::Path};

use fitsio::{hdu::*, FitsFile};
use ndarray::Array2;

/// Open a fits file.
#[track_caller]
pub(crate) fn fits_open<P: AsRef<Path>>(file: P) -> Result<FitsFile, FitsError> {
    let caller = Location::caller();
    FitsFile::open(file.as_ref()).map_err(|e| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.as_ref().to_path_buf().into_boxed_path(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

/// Open a fits file's HDU.
#[track_caller]
pub(crate) fn fits_open_hdu<T: DescribesHdu + Display + Copy>(
    fits_fptr: &mut FitsFile,
    hdu_description: T,
) -> Result<FitsHdu, FitsError> {
    let caller = Location::caller();
    fits_fptr.hdu(hdu_description).map_err(|e| FitsError::Fitsio {
        fits_error: Box::new(e),
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_description: format!("{hdu_description}").into_boxed_str(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

/// Given a FITS file pointer, a HDU that belongs to it, and a keyword that may
/// or may not exist, pull out the value of the keyword, parsing it into the
/// desired type.
#[track_caller]
pub(crate) fn fits_get_optional_key<T: std::str::FromStr>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    keyword: &str,
) -> Result<Option<T>, FitsError> {
    let caller = Location::caller();
    let unparsed_value: String = match hdu.read_key(fits_fptr, keyword) {
        Ok(key_value) => key_value,
        Err(e) => match &e {
            // 202 = keyword not found, 204 = undefined keyword value.
            fitsio::errors::Error::Fits(fe) if matches!(fe.status, 202 | 204) => return Ok(None),
            _ => {
                return Err(FitsError::Fitsio {
                    fits_error: Box::new(e),
                    fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                    hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
                    source_file: caller.file(),
                    source_line: caller.line(),
                    source_column: caller.column(),
                })
            }
        },
    };

    match unparsed_value.trim().parse() {
        Ok(parsed_value) => Ok(Some(parsed_value)),
        Err(_) => Err(FitsError::Parse {
            key: keyword.to_string().into_boxed_str(),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }),
    }
}

/// Given a FITS file pointer, a HDU that belongs to it, and a keyword, pull out
/// the value of the keyword, parsing it into the desired type.
#[track_caller]
pub(crate) fn fits_get_required_key<T: std::str::FromStr>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    keyword: &str,
) -> Result<T, FitsError> {
    let caller = Location::caller();
    match fits_get_optional_key(fits_fptr, hdu, keyword) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(FitsError::MissingKey {
            key: keyword.to_string().into_boxed_str(),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }),
        Err(error) => Err(error),
    }
}

/// The names of all keys in a HDU's header, in order.
#[track_caller]
pub(crate) fn fits_get_key_names(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<Vec<String>, FitsError> {
    let caller = Location::caller();
    let to_fits_error = |fits_fptr: &FitsFile, e: fitsio::errors::Error| FitsError::Fitsio {
        fits_error: Box::new(e),
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    };

    // The raw calls below act on the current HDU.
    fits_fptr
        .hdu(hdu.number)
        .map_err(|e| to_fits_error(fits_fptr, e))?;

    let mut status = 0;
    let mut num_keys = 0;
    unsafe {
        // ffghsp = fits_get_hdrspace
        fitsio_sys::ffghsp(
            fits_fptr.as_raw(), /* I - FITS file pointer                  */
            &mut num_keys,      /* O - number of existing keywords        */
            &mut 0,             /* O - space for more keywords (ignored)  */
            &mut status,        /* IO - error status                      */
        );
    }
    fitsio::errors::check_status(status).map_err(|e| to_fits_error(fits_fptr, e))?;

    let mut names = Vec::with_capacity(num_keys.max(0) as usize);
    // Big enough for any keyword, value or comment (FLEN_CARD).
    let mut name = [0 as std::os::raw::c_char; 81];
    let mut value = [0 as std::os::raw::c_char; 81];
    let mut comment = [0 as std::os::raw::c_char; 81];
    for i_key in 1..=num_keys {
        unsafe {
            // ffgkyn = fits_read_keyn
            fitsio_sys::ffgkyn(
                fits_fptr.as_raw(),
                i_key,
                name.as_mut_ptr(),
                value.as_mut_ptr(),
                comment.as_mut_ptr(),
                &mut status,
            );
        }
        fitsio::errors::check_status(status).map_err(|e| to_fits_error(fits_fptr, e))?;
        let key_name = unsafe { std::ffi::CStr::from_ptr(name.as_ptr()) };
        names.push(key_name.to_string_lossy().trim().to_string());
    }
    Ok(names)
}

/// Get the number of rows of a table HDU.
#[track_caller]
pub(crate) fn fits_get_num_rows(fits_fptr: &FitsFile, hdu: &FitsHdu) -> Result<usize, FitsError> {
    let caller = Location::caller();
    match &hdu.info {
        HduInfo::TableInfo { num_rows, .. } => Ok(*num_rows),
        _ => Err(FitsError::NotTable {
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }),
    }
}

/// Get a column from a fits file's HDU.
#[track_caller]
pub(crate) fn fits_get_col<T: fitsio::tables::ReadsCol>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    column: &str,
) -> Result<Vec<T>, FitsError> {
    let caller = Location::caller();
    hdu.read_col(fits_fptr, column).map_err(|e| FitsError::Fitsio {
        fits_error: Box::new(e),
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

/// Get a vector-valued (array-in-a-cell) column from a fits file's HDU. The
/// returned array has one row per table row and one column per cell element.
///
/// `fitsio` only reads the first element of each cell, so cfitsio is called
/// directly.
#[track_caller]
pub(crate) fn fits_get_vector_col(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    column: &str,
) -> Result<Array2<f64>, FitsError> {
    let caller = Location::caller();
    let num_rows = fits_get_num_rows(fits_fptr, hdu)?;
    let to_fits_error = |fits_fptr: &FitsFile, e: fitsio::errors::Error| FitsError::Fitsio {
        fits_error: Box::new(e),
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    };

    // The raw calls below act on the current HDU.
    fits_fptr
        .hdu(hdu.number)
        .map_err(|e| to_fits_error(fits_fptr, e))?;

    let col_name = CString::new(column).map_err(|_| FitsError::Parse {
        key: column.to_string().into_boxed_str(),
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_num: hdu.number + 1,
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })?;

    let mut status = 0;
    let mut i_col = 0;
    let mut type_code = 0;
    let mut repeat: std::os::raw::c_long = 0;
    let mut width: std::os::raw::c_long = 0;
    unsafe {
        let col_name = col_name.into_raw();
        // ffgcno = fits_get_colnum
        fitsio_sys::ffgcno(
            fits_fptr.as_raw(), /* I - FITS file pointer                       */
            1,                  /* I - case sensitive string comparison? 0=no  */
            col_name,           /* I - input name of column (w/wildcards)      */
            &mut i_col,         /* O - number of the named column; 1=first col */
            &mut status,        /* IO - error status                           */
        );
        drop(CString::from_raw(col_name));
    }
    fitsio::errors::check_status(status).map_err(|e| to_fits_error(fits_fptr, e))?;

    unsafe {
        // ffgtcl = fits_get_coltype
        fitsio_sys::ffgtcl(
            fits_fptr.as_raw(),
            i_col,
            &mut type_code,
            &mut repeat,
            &mut width,
            &mut status,
        );
    }
    fitsio::errors::check_status(status).map_err(|e| to_fits_error(fits_fptr, e))?;

    let repeat = repeat.max(0) as usize;
    let mut data = vec![0.0_f64; num_rows * repeat];
    if !data.is_empty() {
        unsafe {
            // ffgcv = fits_read_col. Reading past the end of a row continues
            // at the start of the next row.
            fitsio_sys::ffgcv(
                fits_fptr.as_raw(),
                82, // TDOUBLE (fitsio.h)
                i_col,
                1,
                1,
                data.len() as i64,
                std::ptr::null_mut(),
                data.as_mut_ptr().cast(),
                &mut 0,
                &mut status,
            );
        }
        fitsio::errors::check_status(status).map_err(|e| to_fits_error(fits_fptr, e))?;
    }

    Ok(Array2::from_shape_fn((num_rows, repeat), |(i_row, i_elem)| {
        data[i_row * repeat + i_elem]
    }))
}

/// The same as [`fits_get_vector_col`], but it is an error for the column to
/// have fewer than `min_repeat` elements per row.
#[track_caller]
pub(crate) fn fits_get_vector_col_min(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    column: &str,
    min_repeat: usize,
) -> Result<Array2<f64>, FitsError> {
    let caller = Location::caller();
    let array = fits_get_vector_col(fits_fptr, hdu, column)?;
    if array.ncols() < min_repeat {
        return Err(FitsError::ColumnRepeat {
            column: column.to_string().into_boxed_str(),
            expected: min_repeat,
            actual: array.ncols(),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        });
    }
    Ok(array)
}
