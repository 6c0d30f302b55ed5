mod elements;
pub mod header;

pub use self::{
    elements::{ParseBoolError, ParseStringError},
    header::ParseHeaderError,
};
use self::header::{FormatHeaderError, ReadHeaderError, WriteHeaderError};
pub(crate) use self::{elements::TypeDesc, header::Header};
use py_literal::Value as PyValue;
use std::{fs, io, path::Path};
use thiserror::Error;

/// Opens `path` and reads one array from it.
///
/// ```no_run
/// use ndarray::Array2;
/// use splineio::read_npy;
///
/// let control_points: Array2<f64> = read_npy("control_points.npy")?;
/// assert_eq!(control_points.ncols(), 3);
/// # Ok::<_, splineio::ReadNpyError>(())
/// ```
pub fn read_npy<P: AsRef<Path>, T: ReadNpyExt>(path: P) -> Result<T, ReadNpyError> {
    T::read_npy(io::BufReader::new(fs::File::open(path)?))
}

/// Creates (or truncates) `path` and writes `array` into it.
///
/// ```no_run
/// use ndarray::array;
/// use splineio::write_npy;
///
/// write_npy("weights.npy", &array![1., 0.5, 1.])?;
/// # Ok::<_, splineio::WriteNpyError>(())
/// ```
pub fn write_npy<P, T>(path: P, array: &T) -> Result<(), WriteNpyError>
where
    P: AsRef<Path>,
    T: WriteNpyExt + ?Sized,
{
    array.write_npy(io::BufWriter::new(fs::File::create(path)?))
}

/// Element types that can be encoded into the data section.
pub trait WritableElement: Sized {
    /// The `descr` value for an array holding `elems`.
    ///
    /// Fixed-size types ignore `elems`; strings use it to pick a width.
    fn type_descriptor<'a, I>(elems: I) -> PyValue
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a;

    /// Encodes one element as `type_desc`.
    fn write<W: io::Write>(&self, type_desc: &PyValue, writer: W) -> io::Result<()>;

    /// Encodes a contiguous run of elements as `type_desc`.
    fn write_slice<W: io::Write>(slice: &[Self], type_desc: &PyValue, mut writer: W) -> io::Result<()> {
        slice.iter().try_for_each(|elem| elem.write(type_desc, &mut writer))
    }
}

/// Element types that can be decoded from the data section.
pub trait ReadableElement: Sized {
    /// Decodes exactly `len` elements described by `type_desc` and checks that
    /// `reader` is then exhausted.
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError>;
}

/// Arrays that serialize to a whole `.npy` stream.
pub trait WriteNpyExt {
    /// Writes header and data to `writer`, then flushes it.
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError>;
}

/// Arrays that deserialize from a whole `.npy` stream.
///
/// ```no_run
/// use ndarray::Array1;
/// use splineio::ReadNpyExt;
/// use std::fs::File;
///
/// let weights = Array1::<f64>::read_npy(File::open("weights.npy")?)?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub trait ReadNpyExt: Sized {
    /// Reads header and data from `reader`.
    fn read_npy<R: io::Read>(reader: R) -> Result<Self, ReadNpyError>;
}

/// Failure writing a `.npy` stream.
#[derive(Debug, Error)]
pub enum WriteNpyError {
    /// The writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The header could not be encoded.
    #[error("cannot encode npy header: {0}")]
    Header(#[from] FormatHeaderError),
}

impl From<WriteHeaderError> for WriteNpyError {
    fn from(err: WriteHeaderError) -> Self {
        match err {
            WriteHeaderError::Io(err) => err.into(),
            WriteHeaderError::Format(err) => err.into(),
        }
    }
}

/// Failure decoding the data section.
#[derive(Debug, Error)]
pub enum ReadDataError {
    #[allow(missing_docs)]
    #[error("I/O error: {0}")]
    Io(io::Error),
    #[allow(missing_docs)]
    #[error("bad boolean: {0}")]
    ParseBool(#[from] ParseBoolError),
    #[allow(missing_docs)]
    #[error("bad string: {0}")]
    ParseString(#[from] ParseStringError),
    /// `descr` names another element type.
    #[error("descriptor {0} does not match the requested element type")]
    WrongDescriptor(PyValue),
    /// The stream ended early.
    #[error("data section is shorter than the header's shape")]
    MissingData,
    /// Bytes remain after the last element.
    #[error("{0} trailing bytes after the data section")]
    ExtraBytes(usize),
}

impl From<io::Error> for ReadDataError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::MissingData,
            _ => Self::Io(err),
        }
    }
}

/// Failure reading a `.npy` stream.
#[derive(Debug, Error)]
pub enum ReadNpyError {
    /// The reader failed before the data section.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The header is not a valid `.npy` header.
    #[error("cannot parse npy header: {0}")]
    Header(#[from] ParseHeaderError),
    /// The data section does not match the header.
    #[error(transparent)]
    Data(#[from] ReadDataError),
    /// The shape's element or byte count does not fit in `isize`.
    #[error("shape is too large")]
    LengthOverflow,
    /// The array has another number of axes than the requested type.
    #[error("expected {expected:?} axes, file has {found}")]
    WrongNdim {
        /// Axes of the requested dimension type, `None` when dynamic.
        expected: Option<usize>,
        /// Axes in the file.
        found: usize,
    },
}

impl From<ReadHeaderError> for ReadNpyError {
    fn from(err: ReadHeaderError) -> Self {
        match err {
            ReadHeaderError::Io(err) => err.into(),
            ReadHeaderError::Parse(err) => err.into(),
        }
    }
}
