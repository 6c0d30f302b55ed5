use ndarray::{array, Array1, Array2};
use splineio::{
    load_splines, save_npz, BSpline, LoadSplinesError, NpzWriter, Nurbs, RawSpline,
    ReadArchiveError, ReadDataError, ReadNpyError, ReadNpzError, Spline, SplineLoader,
    SplineReader, WriteArchiveError, WriteNpyError, WriteNpyExt,
};
use std::{
    convert::Infallible,
    fs::File,
    io::{self, Write},
    path::Path,
};
use tempfile::TempDir;

fn write_archive(path: &Path, tag: &str, control_points: &Array2<f64>, weights: Option<&Array1<f64>>) {
    let mut npz = NpzWriter::new(File::create(path).unwrap());
    npz.add_array("whatami", &array![tag.to_string()]).unwrap();
    npz.add_array("degrees", &array![2i64, 2]).unwrap();
    npz.add_array(
        "knot_vectors",
        &array!["[[0,0,0,1,1,1],[0,0,0,1,1,1]]".to_string()],
    )
    .unwrap();
    npz.add_array("control_points", control_points).unwrap();
    if let Some(weights) = weights {
        npz.add_array("weights", weights).unwrap();
    }
    npz.finish().unwrap();
}

fn grid_points() -> Array2<f64> {
    splineio::raster_points((&[0., 0.], &[2., 2.]), &[3, 3]).unwrap()
}

#[test]
fn bspline_archive_loads_as_one_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.npz");
    write_archive(&path, "BSpline", &grid_points(), None);

    let splines = load_splines(&path).unwrap();
    assert_eq!(splines.len(), 1);
    let Spline::BSpline(bspline) = &splines[0] else {
        panic!("expected a BSpline, got {:?}", splines[0]);
    };
    assert_eq!(bspline.degrees, vec![2, 2]);
    assert_eq!(
        bspline.knot_vectors,
        vec![vec![0., 0., 0., 1., 1., 1.], vec![0., 0., 0., 1., 1., 1.]]
    );
    assert_eq!(bspline.control_points, grid_points());
}

#[test]
fn nurbs_tag_prefix_loads_weights() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.npz");
    let weights = Array1::from_elem(9, 0.5);
    write_archive(&path, "NURBS3D", &grid_points(), Some(&weights));

    let splines = load_splines(&path).unwrap();
    assert_eq!(splines[0].weights(), Some(&weights));
}

#[test]
fn fortran_ordered_control_points_come_back_row_major() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.npz");
    let points = grid_points();
    let fortran = points.t().as_standard_layout().reversed_axes().into_owned();
    assert!(!fortran.is_standard_layout());
    write_archive(&path, "BSpline", &fortran, None);

    let splines = load_splines(&path).unwrap();
    assert!(splines[0].control_points().is_standard_layout());
    assert_eq!(splines[0].control_points(), &points);
}

#[test]
fn saved_splines_load_back() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("arc.npz");
    let arc = Spline::Nurbs(Nurbs {
        bspline: BSpline {
            degrees: vec![2],
            knot_vectors: vec![vec![0., 0., 0., 1., 1., 1.]],
            control_points: array![[1., 0.], [1., 1.], [0., 1.]],
        },
        weights: array![1., std::f64::consts::FRAC_1_SQRT_2, 1.],
    });
    save_npz(&path, &arc).unwrap();
    assert_eq!(load_splines(&path).unwrap(), vec![arc]);
}

#[test]
fn non_finite_knots_leave_no_file_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.npz");
    let spline = Spline::BSpline(BSpline {
        degrees: vec![1],
        knot_vectors: vec![vec![0., f64::NAN, 1., 1.]],
        control_points: array![[0., 0.], [1., 1.]],
    });
    let err = save_npz(&path, &spline).unwrap_err();
    assert!(matches!(
        err,
        WriteArchiveError::NonFiniteKnot { index: 0, position: 1, .. }
    ));
    assert!(!path.exists());
}

#[test]
fn unsupported_extension_names_the_accepted_ones() {
    let err = load_splines("shape.xyz").unwrap_err();
    assert!(matches!(err, LoadSplinesError::UnsupportedFormat(_)));
    let message = err.to_string();
    for ext in [".iges", ".xml", ".itd", ".npz"] {
        assert!(message.contains(ext), "{message}");
    }
}

#[test]
fn missing_archive_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_splines(dir.path().join("absent.npz")).unwrap_err();
    assert!(matches!(err, LoadSplinesError::Archive(ReadArchiveError::Io(_))));
}

#[test]
fn archive_without_control_points_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.npz");
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("whatami", &array!["BSpline".to_string()]).unwrap();
    npz.finish().unwrap();

    let err = load_splines(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadSplinesError::Archive(ReadArchiveError::MissingKey("control_points"))
    ));
}

/// Pre-encoded `.npy` bytes, stored in an archive as they are.
struct EncodedNpy(Vec<u8>);

impl WriteNpyExt for EncodedNpy {
    fn write_npy<W: io::Write>(&self, mut writer: W) -> Result<(), WriteNpyError> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

fn npy_with_shape(shape: &str, data: &[u8]) -> EncodedNpy {
    let mut dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': {shape}}}");
    while (10 + dict.len() + 1) % 64 != 0 {
        dict.push(' ');
    }
    dict.push('\n');
    let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
    bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    bytes.extend_from_slice(dict.as_bytes());
    bytes.extend_from_slice(data);
    EncodedNpy(bytes)
}

#[test]
fn oversized_shape_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.npz");
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("whatami", &array!["BSpline".to_string()]).unwrap();
    npz.add_array("control_points", &npy_with_shape("(1099511627776, 1)", &[0; 16]))
        .unwrap();
    npz.finish().unwrap();

    let err = load_splines(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadSplinesError::Archive(ReadArchiveError::Npz(ReadNpzError::Npy(ReadNpyError::Data(
            ReadDataError::MissingData
        ))))
    ));
}

#[test]
fn hand_encoded_entries_read_like_written_ones() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.npz");
    let data: Vec<u8> = [0f64, 0., 1., 2.].iter().flat_map(|x| x.to_le_bytes()).collect();
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("whatami", &array!["BSpline".to_string()]).unwrap();
    npz.add_array("degrees", &array![1i64]).unwrap();
    npz.add_array("knot_vectors", &array!["[[0, 0, 1, 1]]".to_string()]).unwrap();
    npz.add_array("control_points", &npy_with_shape("(2, 2)", &data)).unwrap();
    npz.finish().unwrap();

    let splines = load_splines(&path).unwrap();
    assert_eq!(splines[0].control_points(), &array![[0., 0.], [1., 2.]]);
}

struct FixedReader;

impl SplineReader for FixedReader {
    type Error = Infallible;

    fn read_iges(&self, _path: &Path) -> Result<Vec<RawSpline>, Infallible> {
        Ok(vec![RawSpline {
            weights: None,
            degrees: vec![1],
            knot_vectors: vec![vec![0., 0., 1., 1.]],
            control_points: array![[0., 0., 0.], [1., 1., 1.]],
        }])
    }

    fn read_xml(&self, _path: &Path) -> Result<Vec<RawSpline>, Infallible> {
        Ok(Vec::new())
    }

    fn read_irit(&self, _path: &Path) -> Result<Vec<RawSpline>, Infallible> {
        Ok(Vec::new())
    }
}

#[test]
fn injected_reader_serves_geometry_formats_and_archives_still_work() {
    let loader = SplineLoader::new(FixedReader);
    let splines = loader.load("/models/line.iges").unwrap();
    assert_eq!(splines.len(), 1);
    assert_eq!(splines[0].whatami(), "BSpline, parametric dimension: 1, physical dimension: 3");
    assert!(loader.load("/models/empty.xml").unwrap().is_empty());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.npz");
    write_archive(&path, "BSpline", &grid_points(), None);
    assert_eq!(loader.load(&path).unwrap(), load_splines(&path).unwrap());
}
