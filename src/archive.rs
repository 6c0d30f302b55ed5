//! Splines stored in `.npz` archives.
//!
//! An archive holds one spline under these entries:
//!
//! | entry            | contents                                          |
//! |------------------|---------------------------------------------------|
//! | `whatami`        | one string; a `NURBS` prefix marks a NURBS        |
//! | `degrees`        | integer array, one entry per parametric dimension |
//! | `knot_vectors`   | one string holding a nested list literal          |
//! | `control_points` | 2-D numeric array                                 |
//! | `weights`        | 1-D numeric array, NURBS only                     |

use crate::{
    coerce::{make_c_contiguous, CoercePolicy},
    knot_vectors::{format_knot_vectors, parse_knot_vectors, ParseKnotVectorsError},
    numeric::{Dtype, NumericArray},
    property::is_property,
    spline::{BSpline, Nurbs, Spline},
    NpzReader, NpzWriter, ReadNpzError, WriteNpzError,
};
use ndarray::{Array, Array1, ArrayD, Dimension, Ix1, Ix2};
use std::{
    fs,
    io::{self, Read, Seek},
    path::Path,
};
use thiserror::Error;

const CLASS_NAME: &str = "SplineArchive";

/// Tag prefix that selects the NURBS variant.
pub const NURBS_TAG_PREFIX: &str = "NURBS";

/// An error reading a spline archive.
#[derive(Debug, Error)]
pub enum ReadArchiveError {
    /// The file could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The container or one of its arrays could not be read.
    #[error(transparent)]
    Npz(#[from] ReadNpzError),
    /// A required entry is absent.
    #[error("archive has no `{0}` entry")]
    MissingKey(&'static str),
    /// A string entry holds no elements.
    #[error("archive entry `{0}` is empty")]
    EmptyEntry(&'static str),
    /// An entry has the wrong number of axes or invalid values.
    #[error("archive entry `{key}` is malformed: {reason}")]
    Shape {
        /// The entry.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// The knot vector text could not be parsed.
    #[error("archive entry `knot_vectors` is malformed: {0}")]
    KnotVectors(#[from] ParseKnotVectorsError),
}

/// Whether `tag` selects the NURBS variant. Any tag starting with `NURBS`
/// does, so future tags such as `NURBS3D` keep working.
pub fn is_nurbs_tag(tag: &str) -> bool {
    tag.starts_with(NURBS_TAG_PREFIX)
}

fn require<R: Read + Seek>(npz: &NpzReader<R>, key: &'static str) -> Result<(), ReadArchiveError> {
    if is_property(npz, key, CLASS_NAME) {
        Ok(())
    } else {
        Err(ReadArchiveError::MissingKey(key))
    }
}

fn first_string<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    key: &'static str,
) -> Result<String, ReadArchiveError> {
    require(npz, key)?;
    let strings: ArrayD<String> = npz.by_name(key)?;
    strings.into_iter().next().ok_or(ReadArchiveError::EmptyEntry(key))
}

fn floats<R, D>(npz: &mut NpzReader<R>, key: &'static str) -> Result<Array<f64, D>, ReadArchiveError>
where
    R: Read + Seek,
    D: Dimension,
{
    require(npz, key)?;
    let array: NumericArray = npz.by_name(key)?;
    let shape_err = |reason: String| ReadArchiveError::Shape { key, reason };
    make_c_contiguous(array, CoercePolicy::convert(Dtype::Float64))
        .into_array::<f64>()
        .map_err(|other| shape_err(format!("expected float64, found {}", other.dtype())))?
        .into_dimensionality::<D>()
        .map_err(|err| shape_err(err.to_string()))
}

fn read_degrees<R: Read + Seek>(npz: &mut NpzReader<R>) -> Result<Vec<usize>, ReadArchiveError> {
    const KEY: &str = "degrees";
    require(npz, KEY)?;
    let array: NumericArray = npz.by_name(KEY)?;
    let shape_err = |reason: String| ReadArchiveError::Shape { key: KEY, reason };
    if !array.dtype().is_integer() {
        return Err(shape_err(format!("expected integers, found {}", array.dtype())));
    }
    let degrees = make_c_contiguous(array, CoercePolicy::convert(Dtype::Int64))
        .into_array::<i64>()
        .map_err(|other| shape_err(format!("expected int64, found {}", other.dtype())))?
        .into_dimensionality::<Ix1>()
        .map_err(|err| shape_err(err.to_string()))?;
    degrees
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| shape_err(format!("negative degree {d}"))))
        .collect()
}

/// Reads the spline stored in an open archive.
///
/// The result always has one element; it is a `Vec` so archives holding
/// several splines can be supported without changing callers.
pub fn read_splines<R: Read + Seek>(npz: &mut NpzReader<R>) -> Result<Vec<Spline>, ReadArchiveError> {
    let whatami = first_string(npz, "whatami")?;
    let bspline = BSpline {
        control_points: floats::<_, Ix2>(npz, "control_points")?,
        degrees: read_degrees(npz)?,
        knot_vectors: parse_knot_vectors(&first_string(npz, "knot_vectors")?)?,
    };
    let spline = if is_nurbs_tag(&whatami) {
        let weights = floats::<_, Ix1>(npz, "weights")?;
        Spline::Nurbs(Nurbs { bspline, weights })
    } else {
        Spline::BSpline(bspline)
    };
    log::trace!("read {} from archive", spline.whatami());
    Ok(vec![spline])
}

/// Opens `path` and reads the spline it holds. See [`read_splines`].
pub fn read_npz<P: AsRef<Path>>(path: P) -> Result<Vec<Spline>, ReadArchiveError> {
    let mut npz = NpzReader::new(io::BufReader::new(fs::File::open(path)?))?;
    read_splines(&mut npz)
}

/// An error writing a spline archive.
#[derive(Debug, Error)]
pub enum WriteArchiveError {
    /// The file could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The container could not be written.
    #[error(transparent)]
    Npz(#[from] WriteNpzError),
    /// A knot is NaN or infinite and has no literal form to read back.
    #[error("knot {position} of knot vector {index} is not finite: {value}")]
    NonFiniteKnot {
        #[allow(missing_docs)]
        index: usize,
        #[allow(missing_docs)]
        position: usize,
        #[allow(missing_docs)]
        value: f64,
    },
}

fn check_finite_knots(spline: &Spline) -> Result<(), WriteArchiveError> {
    for (index, kv) in spline.knot_vectors().iter().enumerate() {
        if let Some((position, &value)) = kv.iter().enumerate().find(|(_, k)| !k.is_finite()) {
            return Err(WriteArchiveError::NonFiniteKnot { index, position, value });
        }
    }
    Ok(())
}

/// Writes `spline` into `npz` in the layout [`read_splines`] reads and
/// finishes the archive.
///
/// Knots must be finite; nothing is written otherwise.
pub fn write_spline<W: io::Write + Seek>(
    mut npz: NpzWriter<W>,
    spline: &Spline,
) -> Result<W, WriteArchiveError> {
    check_finite_knots(spline)?;
    let degrees: Array1<i64> = spline
        .degrees()
        .iter()
        .map(|&d| d as i64)
        .collect();
    npz.add_array("whatami", &Array1::from(vec![spline.whatami()]))?;
    npz.add_array("degrees", &degrees)?;
    npz.add_array(
        "knot_vectors",
        &Array1::from(vec![format_knot_vectors(spline.knot_vectors())]),
    )?;
    npz.add_array("control_points", spline.control_points())?;
    if let Some(weights) = spline.weights() {
        npz.add_array("weights", weights)?;
    }
    Ok(npz.finish()?)
}

/// Saves `spline` as a compressed `.npz` file at `path`.
pub fn save_npz<P: AsRef<Path>>(path: P, spline: &Spline) -> Result<(), WriteArchiveError> {
    check_finite_knots(spline)?;
    let file = fs::File::create(path)?;
    #[cfg(feature = "compressed-npz")]
    let npz = NpzWriter::new_compressed(file);
    #[cfg(not(feature = "compressed-npz"))]
    let npz = NpzWriter::new(file);
    write_spline(npz, spline)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use std::io::Cursor;

    fn archive(entries: &[(&str, NumericOrText)]) -> NpzReader<Cursor<Vec<u8>>> {
        let mut npz = NpzWriter::new(Cursor::new(Vec::new()));
        for (name, entry) in entries {
            match entry {
                NumericOrText::Numeric(a) => npz.add_array(name, a).unwrap(),
                NumericOrText::Text(s) => npz.add_array(name, &array![s.to_string()]).unwrap(),
            }
        }
        NpzReader::new(Cursor::new(npz.finish().unwrap().into_inner())).unwrap()
    }

    enum NumericOrText {
        Numeric(NumericArray),
        Text(&'static str),
    }
    use NumericOrText::{Numeric, Text};

    fn bspline_entries(tag: &'static str) -> Vec<(&'static str, NumericOrText)> {
        vec![
            ("whatami", Text(tag)),
            ("degrees", Numeric(array![2i64, 2].into())),
            ("knot_vectors", Text("[[0,0,0,1,1,1],[0,0,0,1,1,1]]")),
            ("control_points", Numeric(Array2::<f64>::zeros((9, 3)).into())),
        ]
    }

    #[test]
    fn bspline_archive() {
        let splines = read_splines(&mut archive(&bspline_entries("BSpline"))).unwrap();
        assert_eq!(splines.len(), 1);
        let spline = &splines[0];
        assert!(!spline.is_rational());
        assert_eq!(spline.degrees(), &[2, 2]);
        assert_eq!(
            spline.knot_vectors(),
            &[vec![0., 0., 0., 1., 1., 1.], vec![0., 0., 0., 1., 1., 1.]]
        );
        assert_eq!(spline.control_points().dim(), (9, 3));
    }

    #[test]
    fn nurbs_prefix_selects_nurbs() {
        for tag in ["NURBS", "NURBS3D", "NURBS, parametric dimension: 2, physical dimension: 3"] {
            let mut entries = bspline_entries(tag);
            entries.push(("weights", Numeric(Array1::<f64>::ones(9).into())));
            let splines = read_splines(&mut archive(&entries)).unwrap();
            assert_eq!(splines[0].weights(), Some(&Array1::ones(9)), "{tag}");
        }
    }

    #[test]
    fn other_tags_select_bspline() {
        for tag in ["BSpline", "nurbs", " NURBS", "RationalBezier"] {
            assert!(!is_nurbs_tag(tag), "{tag}");
        }
    }

    #[test]
    fn integer_control_points_and_int32_degrees() {
        let entries = vec![
            ("whatami", Text("BSpline")),
            ("degrees", Numeric(array![1i32].into())),
            ("knot_vectors", Text("[[0, 0, 1, 1]]")),
            ("control_points", Numeric(array![[0i64, 0], [3, 4]].into())),
        ];
        let splines = read_splines(&mut archive(&entries)).unwrap();
        assert_eq!(splines[0].degrees(), &[1]);
        assert_eq!(splines[0].control_points(), &array![[0., 0.], [3., 4.]]);
    }

    #[test]
    fn nurbs_without_weights_is_malformed() {
        let err = read_splines(&mut archive(&bspline_entries("NURBS"))).unwrap_err();
        assert!(matches!(err, ReadArchiveError::MissingKey("weights")));
    }

    #[test]
    fn missing_knot_vectors() {
        let mut entries = bspline_entries("BSpline");
        entries.retain(|(name, _)| *name != "knot_vectors");
        let err = read_splines(&mut archive(&entries)).unwrap_err();
        assert!(matches!(err, ReadArchiveError::MissingKey("knot_vectors")));
    }

    #[test]
    fn knot_vector_text_must_be_literal_numbers() {
        let mut entries = bspline_entries("BSpline");
        entries[2] = ("knot_vectors", Text("[[0, 0, 1, 1], open('x')]"));
        let err = read_splines(&mut archive(&entries)).unwrap_err();
        assert!(matches!(err, ReadArchiveError::KnotVectors(_)));
    }

    #[test]
    fn negative_degrees_are_rejected() {
        let mut entries = bspline_entries("BSpline");
        entries[1] = ("degrees", Numeric(array![2i64, -1].into()));
        let err = read_splines(&mut archive(&entries)).unwrap_err();
        assert!(matches!(err, ReadArchiveError::Shape { key: "degrees", .. }));
    }

    #[test]
    fn fractional_degrees_are_rejected() {
        let mut entries = bspline_entries("BSpline");
        entries[1] = ("degrees", Numeric(array![2.7f64, 2.0].into()));
        let err = read_splines(&mut archive(&entries)).unwrap_err();
        assert!(matches!(err, ReadArchiveError::Shape { key: "degrees", .. }));
    }

    #[test]
    fn control_points_must_be_2d() {
        let mut entries = bspline_entries("BSpline");
        entries[3] = ("control_points", Numeric(Array1::<f64>::zeros(9).into()));
        let err = read_splines(&mut archive(&entries)).unwrap_err();
        assert!(matches!(err, ReadArchiveError::Shape { key: "control_points", .. }));
    }

    #[test]
    fn non_finite_knots_are_not_written() {
        let spline = Spline::BSpline(BSpline {
            degrees: vec![1],
            knot_vectors: vec![vec![0., 0., 1., f64::INFINITY]],
            control_points: array![[0., 0.], [1., 1.]],
        });
        let err = write_spline(NpzWriter::new(Cursor::new(Vec::new())), &spline).unwrap_err();
        assert!(matches!(err, WriteArchiveError::NonFiniteKnot { index: 0, position: 3, .. }));
    }

    #[test]
    fn written_archives_read_back() {
        let spline = Spline::Nurbs(Nurbs {
            bspline: BSpline {
                degrees: vec![2],
                knot_vectors: vec![vec![0., 0., 0., 1., 1., 1.]],
                control_points: array![[1., 0.], [1., 1.], [0., 1.]],
            },
            weights: array![1., std::f64::consts::FRAC_1_SQRT_2, 1.],
        });
        let buf = write_spline(NpzWriter::new(Cursor::new(Vec::new())), &spline).unwrap();
        let mut npz = NpzReader::new(Cursor::new(buf.into_inner())).unwrap();
        let whatami = first_string(&mut npz, "whatami").unwrap();
        assert_eq!(whatami, "NURBS, parametric dimension: 1, physical dimension: 2");
        assert_eq!(read_splines(&mut npz).unwrap(), vec![spline]);
    }
}
