use crate::{property::PropertyBag, ReadNpyError, ReadNpyExt, WriteNpyError, WriteNpyExt};
use std::io::{self, Read, Seek, Write};
use thiserror::Error;
use zip::{
    result::ZipError,
    write::SimpleFileOptions,
    CompressionMethod, ZipArchive, ZipWriter,
};

const NPY_SUFFIX: &str = ".npy";

fn entry_name(name: &str) -> String {
    if name.ends_with(NPY_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{NPY_SUFFIX}")
    }
}

/// An error reading a `.npz` file.
#[derive(Debug, Error)]
pub enum ReadNpzError {
    /// An error caused by the zip file.
    #[error("zip file error: {0}")]
    Zip(#[from] ZipError),
    /// An error caused by reading an inner `.npy` file.
    #[error("error reading npy file in npz archive: {0}")]
    Npy(#[from] ReadNpyError),
}

/// Reader for `.npz` files.
///
/// # Example
///
/// ```no_run
/// use ndarray::Array2;
/// use splineio::NpzReader;
/// use std::fs::File;
///
/// let mut npz = NpzReader::new(File::open("spline.npz")?)?;
/// let names = npz.names();
/// let control_points: Array2<f64> = npz.by_name("control_points")?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct NpzReader<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl<R: Read + Seek> NpzReader<R> {
    /// Creates a new `.npz` file reader.
    pub fn new(reader: R) -> Result<Self, ReadNpzError> {
        Ok(Self { zip: ZipArchive::new(reader)? })
    }

    /// Returns `true` iff the `.npz` file doesn't contain any arrays.
    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Returns the number of arrays in the `.npz` file.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    /// Returns the names of all of the arrays in the file, without the
    /// `.npy` suffix.
    pub fn names(&self) -> Vec<String> {
        self.zip
            .file_names()
            .map(|name| name.strip_suffix(NPY_SUFFIX).unwrap_or(name).to_string())
            .collect()
    }

    /// Whether an array called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        let entry = entry_name(name);
        self.zip.file_names().any(|n| n == entry)
    }

    /// Reads an array by name. The `.npy` suffix may be omitted.
    pub fn by_name<T: ReadNpyExt>(&mut self, name: &str) -> Result<T, ReadNpzError> {
        Ok(T::read_npy(self.zip.by_name(&entry_name(name))?)?)
    }

    /// Reads an array by its index in the zip directory.
    pub fn by_index<T: ReadNpyExt>(&mut self, index: usize) -> Result<T, ReadNpzError> {
        Ok(T::read_npy(self.zip.by_index(index)?)?)
    }
}

impl<R: Read + Seek> PropertyBag for NpzReader<R> {
    fn contains_property(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// An error writing a `.npz` file.
#[derive(Debug, Error)]
pub enum WriteNpzError {
    /// An error caused by the zip file.
    #[error("zip file error: {0}")]
    Zip(#[from] ZipError),
    /// An error caused by writing an inner `.npy` file.
    #[error("error writing npy file to npz archive: {0}")]
    Npy(#[from] WriteNpyError),
}

impl From<io::Error> for WriteNpzError {
    fn from(err: io::Error) -> Self {
        Self::Zip(ZipError::Io(err))
    }
}

/// Writer for `.npz` files.
///
/// Note that the inner `.npy` files are written to the zip archive as-is, so
/// writing large arrays may use a lot of memory until `finish` is called.
///
/// # Example
///
/// ```no_run
/// use ndarray::array;
/// use splineio::NpzWriter;
/// use std::fs::File;
///
/// let mut npz = NpzWriter::new(File::create("arrays.npz")?);
/// npz.add_array("degrees", &array![2i64, 2])?;
/// npz.add_array("weights", &array![1., 0.5, 1.])?;
/// npz.finish()?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct NpzWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> NpzWriter<W> {
    /// Creates a new `.npz` file without compression, like `numpy.savez`.
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        }
    }

    /// Creates a new `.npz` file with compression, like
    /// `numpy.savez_compressed`.
    #[cfg(feature = "compressed-npz")]
    pub fn new_compressed(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Adds an array with the specified `name` to the `.npz` file.
    ///
    /// The `.npy` suffix is appended to the entry name unless present.
    pub fn add_array<T>(&mut self, name: &str, array: &T) -> Result<(), WriteNpzError>
    where
        T: WriteNpyExt + ?Sized,
    {
        self.zip.start_file(entry_name(name), self.options)?;
        array.write_npy(&mut self.zip)?;
        Ok(())
    }

    /// Calls `.finish()` on the zip file and returns the underlying writer.
    pub fn finish(self) -> Result<W, WriteNpzError> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};
    use std::io::Cursor;

    #[test]
    fn names_and_lookup() {
        let mut npz = NpzWriter::new(Cursor::new(Vec::new()));
        npz.add_array("a", &array![[1.0f64, 2.0]]).unwrap();
        npz.add_array("b.npy", &array![3i64]).unwrap();
        let buf = npz.finish().unwrap();

        let mut npz = NpzReader::new(Cursor::new(buf.into_inner())).unwrap();
        assert_eq!(npz.len(), 2);
        let mut names = npz.names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert!(npz.contains("a") && npz.contains("b.npy"));
        assert!(!npz.contains("c"));
        let a: Array2<f64> = npz.by_name("a").unwrap();
        assert_eq!(a, array![[1.0, 2.0]]);
        let b: Array1<i64> = npz.by_name("b").unwrap();
        assert_eq!(b, array![3]);
    }

    #[cfg(feature = "compressed-npz")]
    #[test]
    fn compressed_archives() {
        let weights = Array1::linspace(0.5, 1.0, 64);
        let mut npz = NpzWriter::new_compressed(Cursor::new(Vec::new()));
        npz.add_array("weights", &weights).unwrap();
        let buf = npz.finish().unwrap();

        let mut npz = NpzReader::new(Cursor::new(buf.into_inner())).unwrap();
        let back: Array1<f64> = npz.by_name("weights").unwrap();
        assert_eq!(back, weights);
    }

    #[test]
    fn missing_entry() {
        let npz = NpzWriter::new(Cursor::new(Vec::new()));
        let buf = npz.finish().unwrap();
        let mut npz = NpzReader::new(Cursor::new(buf.into_inner())).unwrap();
        assert!(npz.is_empty());
        let err = npz.by_name::<Array1<f64>>("weights").unwrap_err();
        assert!(matches!(err, ReadNpzError::Zip(ZipError::FileNotFound)));
    }
}
