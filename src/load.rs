use crate::{
    archive::{self, ReadArchiveError},
    path::abs_path,
    spline::{RawSpline, Spline},
};
use std::{fmt, io, path::Path};
use thiserror::Error;

/// The spline file formats [`SplineLoader`] understands, keyed by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplineFormat {
    /// `.iges`
    Iges,
    /// `.xml`
    Xml,
    /// `.itd` (IRIT)
    Irit,
    /// `.npz`
    Npz,
}

impl SplineFormat {
    /// Every supported format.
    pub const ALL: [Self; 4] = [Self::Iges, Self::Xml, Self::Irit, Self::Npz];

    /// The file extension including the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Iges => ".iges",
            Self::Xml => ".xml",
            Self::Irit => ".itd",
            Self::Npz => ".npz",
        }
    }

    /// Exact, case-sensitive lookup of an extension such as `".xml"`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == extension)
    }

    /// The format of `path` judged by its extension.
    pub fn from_path(path: &Path) -> Result<Self, UnsupportedFormat> {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        Self::from_extension(&extension).ok_or(UnsupportedFormat { extension })
    }
}

impl fmt::Display for SplineFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file extension no reader handles.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("can only load < .iges | .xml | .itd | .npz > spline files, got `{extension}`")]
pub struct UnsupportedFormat {
    /// The extension found, including the dot; empty if there was none.
    pub extension: String,
}

/// Native parser for the geometry formats.
///
/// Each method returns the splines of one file in file order. A spline whose
/// `weights` are `None` is non-rational.
pub trait SplineReader {
    /// The reader's own failure type; [`SplineLoader`] passes it through
    /// untouched.
    type Error: std::error::Error + 'static;

    /// Reads an IGES file.
    fn read_iges(&self, path: &Path) -> Result<Vec<RawSpline>, Self::Error>;

    /// Reads an XML spline file.
    fn read_xml(&self, path: &Path) -> Result<Vec<RawSpline>, Self::Error>;

    /// Reads an IRIT `.itd` file.
    fn read_irit(&self, path: &Path) -> Result<Vec<RawSpline>, Self::Error>;
}

impl<R: SplineReader + ?Sized> SplineReader for &R {
    type Error = R::Error;

    fn read_iges(&self, path: &Path) -> Result<Vec<RawSpline>, Self::Error> {
        (**self).read_iges(path)
    }

    fn read_xml(&self, path: &Path) -> Result<Vec<RawSpline>, Self::Error> {
        (**self).read_xml(path)
    }

    fn read_irit(&self, path: &Path) -> Result<Vec<RawSpline>, Self::Error> {
        (**self).read_irit(path)
    }
}

/// A [`SplineReader`] for builds without a native geometry parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNativeReader;

/// Returned by [`NoNativeReader`] for every file.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no native reader is available for {format} files")]
pub struct NativeReaderUnavailable {
    /// The format that was requested.
    pub format: SplineFormat,
}

impl SplineReader for NoNativeReader {
    type Error = NativeReaderUnavailable;

    fn read_iges(&self, _path: &Path) -> Result<Vec<RawSpline>, Self::Error> {
        Err(NativeReaderUnavailable { format: SplineFormat::Iges })
    }

    fn read_xml(&self, _path: &Path) -> Result<Vec<RawSpline>, Self::Error> {
        Err(NativeReaderUnavailable { format: SplineFormat::Xml })
    }

    fn read_irit(&self, _path: &Path) -> Result<Vec<RawSpline>, Self::Error> {
        Err(NativeReaderUnavailable { format: SplineFormat::Irit })
    }
}

/// An error loading splines.
#[derive(Debug, Error)]
pub enum LoadSplinesError<E> {
    /// The file extension is not one of the supported ones.
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
    /// The path could not be made absolute.
    #[error("could not resolve path: {0}")]
    Io(#[from] io::Error),
    /// The `.npz` archive could not be read.
    #[error(transparent)]
    Archive(#[from] ReadArchiveError),
    /// The native reader failed; the error is its own.
    #[error(transparent)]
    Reader(E),
}

/// Loads splines from any supported file.
///
/// ```no_run
/// use splineio::{SplineLoader, NoNativeReader};
///
/// let loader = SplineLoader::new(NoNativeReader);
/// for spline in loader.load("~/models/patch.npz")? {
///     println!("{}", spline.whatami());
/// }
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct SplineLoader<R> {
    reader: R,
}

impl<R: SplineReader> SplineLoader<R> {
    /// Creates a loader that hands `.iges`, `.xml` and `.itd` files to
    /// `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// The native reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Loads every spline in the file at `path`, in file order.
    ///
    /// `path` may be relative or start with `~`. The format is chosen by the
    /// exact extension.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Spline>, LoadSplinesError<R::Error>> {
        let path = abs_path(path)?;
        let format = SplineFormat::from_path(&path)?;
        log::debug!("loading {} as {format}", path.display());
        let splines = match format {
            SplineFormat::Iges => normalize(self.reader.read_iges(&path))?,
            SplineFormat::Xml => normalize(self.reader.read_xml(&path))?,
            SplineFormat::Irit => normalize(self.reader.read_irit(&path))?,
            SplineFormat::Npz => archive::read_npz(&path)?,
        };
        log::debug!("loaded {} splines from {}", splines.len(), path.display());
        Ok(splines)
    }
}

fn normalize<E>(raw: Result<Vec<RawSpline>, E>) -> Result<Vec<Spline>, LoadSplinesError<E>> {
    Ok(raw
        .map_err(LoadSplinesError::Reader)?
        .into_iter()
        .map(Spline::from)
        .collect())
}

/// Loads splines from `path` without a native geometry reader.
///
/// `.npz` archives are fully supported; `.iges`, `.xml` and `.itd` files
/// fail with [`NativeReaderUnavailable`]. Use [`SplineLoader`] to supply a
/// reader.
pub fn load_splines<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<Spline>, LoadSplinesError<NativeReaderUnavailable>> {
    SplineLoader::new(NoNativeReader).load(path)
}
