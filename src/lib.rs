#![doc = include_str!("../README.md")]
//! ## Loading splines
//!
//! - [`load_splines`] for `.npz` archives without a native reader
//! - [`SplineLoader`] with a [`SplineReader`] for `.iges`, `.xml` and `.itd`
//! - [`save_npz`] / [`read_npz`] for the archive layout on its own
//!
//! Every loaded record is a [`Spline`]: [`Spline::BSpline`] when the source
//! has no weights, [`Spline::Nurbs`] when it does.
//!
//! ## Operate .npy and .npz files
//!
//! - Reading: [`ReadNpyExt`], [`read_npy`], [`NpzReader`]
//! - Writing: [`WriteNpyExt`], [`write_npy`], [`NpzWriter`]
//! - Dynamically typed arrays: [`NumericArray`]
//!
//! ## Utilities
//!
//! - [`make_c_contiguous`] packs arrays row-major, optionally retyping them
//! - [`abs_path`] makes paths absolute, expanding `~`
//! - [`raster_points`] samples a regular grid
//! - [`is_property`] checks a property bag, logging absent keys
//!
//! ## Limitations
//!
//! - Parsing of `.npy` files is limited to files where the `descr` field of
//!   the [header dictionary] is a plain type string; structured and object
//!   arrays are not supported.
//! - Element types are fixed-size integers up to 64 bits, floating point
//!   numbers, [`bool`], and fixed-width strings.
//!
//! [header dictionary]: https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html#format-version-1-0
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]

mod archive;
mod coerce;
mod impl_ndarray;
mod knot_vectors;
mod load;
mod npy;
mod npz;
mod numeric;
mod path;
mod property;
mod raster;
mod spline;

pub use crate::{
    archive::{
        is_nurbs_tag, read_npz, read_splines, save_npz, write_spline, ReadArchiveError,
        WriteArchiveError, NURBS_TAG_PREFIX,
    },
    coerce::{make_c_contiguous, CoerceError, CoercePolicy},
    knot_vectors::{format_knot_vectors, parse_knot_vectors, ParseKnotVectorsError},
    load::{
        load_splines, LoadSplinesError, NativeReaderUnavailable, NoNativeReader, SplineFormat,
        SplineLoader, SplineReader, UnsupportedFormat,
    },
    npy::{
        read_npy, write_npy, ParseBoolError, ParseHeaderError, ParseStringError, ReadDataError,
        ReadNpyError, ReadNpyExt, ReadableElement, WritableElement, WriteNpyError, WriteNpyExt,
    },
    npz::{NpzReader, NpzWriter, ReadNpzError, WriteNpzError},
    numeric::{Dtype, NumericArray, NumericElement},
    path::abs_path,
    property::{is_property, PropertyBag},
    raster::{raster_points, RasterError},
    spline::{BSpline, Nurbs, RawSpline, Spline},
};
