use byteorder::{LittleEndian, ReadBytesExt};
use num_traits::ToPrimitive;
use py_literal::{
    FormatError as PyValueFormatError, ParseError as PyValueParseError, Value as PyValue,
};
use std::io::{self, Read};
use thiserror::Error;

/// Every `.npy` stream starts with these bytes.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// The total header length (magic string, version, `HEADER_LEN`, metadata
/// dict, padding and the final newline) is a multiple of this value.
const HEADER_DIVISOR: usize = 64;

/// The header of a `.npy` stream is invalid.
#[derive(Debug, Error)]
pub enum ParseHeaderError {
    /// The stream does not start with `\x93NUMPY`.
    #[error("start does not match magic string")]
    MagicString,
    /// Only versions 1.0, 2.0 and 3.0 exist.
    #[error("unknown version number: {major}.{minor}")]
    Version {
        #[allow(missing_docs)]
        major: u8,
        #[allow(missing_docs)]
        minor: u8,
    },
    /// `HEADER_LEN` doesn't fit in `usize`.
    #[error("HEADER_LEN {0} does not fit in `usize`")]
    HeaderLengthOverflow(u32),
    /// The metadata contains non-ASCII characters, which format versions 1.0
    /// and 2.0 forbid.
    #[error("non-ascii in array format string; this is not supported in .npy format versions 1.0 and 2.0")]
    NonAscii,
    /// The metadata of a version 3.0 file is not valid UTF-8.
    #[error("error parsing array format string as UTF-8: {0}")]
    Utf8Parse(#[from] std::str::Utf8Error),
    /// The dict has a key besides `descr`, `fortran_order` and `shape`.
    #[error("unknown key: {0}")]
    UnknownKey(PyValue),
    #[allow(missing_docs)]
    #[error("missing key: {0}")]
    MissingKey(&'static str),
    /// A dict entry has the wrong type.
    #[error("illegal value for key {key}: {value}")]
    IllegalValue {
        #[allow(missing_docs)]
        key: &'static str,
        #[allow(missing_docs)]
        value: PyValue,
    },
    /// The header text is not a literal.
    #[error("error parsing metadata dict: {0}")]
    DictParse(#[from] PyValueParseError),
    /// The header literal is not a dict.
    #[error("metadata is not a dict: {0}")]
    MetaNotDict(PyValue),
    /// The header does not end in `\n`.
    #[error("newline missing at end of header")]
    MissingNewline,
}

#[derive(Debug, Error)]
pub enum ReadHeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("error parsing header: {0}")]
    Parse(#[from] ParseHeaderError),
}

#[derive(Debug, Error)]
pub enum FormatHeaderError {
    #[error("error formatting Python value: {0}")]
    PyValue(#[from] PyValueFormatError),
    /// `HEADER_LEN` exceeds what format version 2.0 can encode.
    #[error("the header is too long")]
    HeaderTooLong,
}

#[derive(Debug, Error)]
pub enum WriteHeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("error formatting header: {0}")]
    Format(#[from] FormatHeaderError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Version {
    V1,
    V2,
    V3,
}

impl Version {
    fn from_bytes([major, minor]: [u8; 2]) -> Result<Self, ParseHeaderError> {
        match (major, minor) {
            (1, 0) => Ok(Self::V1),
            (2, 0) => Ok(Self::V2),
            (3, 0) => Ok(Self::V3),
            _ => Err(ParseHeaderError::Version { major, minor }),
        }
    }

    const fn to_bytes(self) -> [u8; 2] {
        match self {
            Self::V1 => [1, 0],
            Self::V2 => [2, 0],
            Self::V3 => [3, 0],
        }
    }

    /// Width in bytes of the little-endian `HEADER_LEN` field.
    const fn header_len_width(self) -> usize {
        match self {
            Self::V1 => 2,
            Self::V2 | Self::V3 => 4,
        }
    }

    fn read_header_len<R: io::Read>(self, mut reader: R) -> Result<usize, ReadHeaderError> {
        match self {
            Self::V1 => Ok(usize::from(reader.read_u16::<LittleEndian>()?)),
            Self::V2 | Self::V3 => {
                let len = reader.read_u32::<LittleEndian>()?;
                Ok(usize::try_from(len).map_err(|_| ParseHeaderError::HeaderLengthOverflow(len))?)
            }
        }
    }

    /// Encodes `header_len`, or `None` if it does not fit this version.
    fn encode_header_len(self, header_len: usize) -> Option<Vec<u8>> {
        match self {
            Self::V1 => u16::try_from(header_len).ok().map(|l| l.to_le_bytes().to_vec()),
            Self::V2 | Self::V3 => u32::try_from(header_len).ok().map(|l| l.to_le_bytes().to_vec()),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Header {
    pub type_descriptor: PyValue,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl Header {
    fn from_py_value(value: PyValue) -> Result<Self, ParseHeaderError> {
        let dict = match value {
            PyValue::Dict(dict) => dict,
            value => return Err(ParseHeaderError::MetaNotDict(value)),
        };
        let mut type_descriptor = None;
        let mut fortran_order = None;
        let mut shape = None;
        for (key, value) in dict {
            match key.as_string().map(String::as_str) {
                Some("descr") => type_descriptor = Some(value),
                Some("fortran_order") => match value {
                    PyValue::Boolean(b) => fortran_order = Some(b),
                    value => {
                        return Err(ParseHeaderError::IllegalValue { key: "fortran_order", value })
                    }
                },
                Some("shape") => {
                    let parsed = value.as_tuple().and_then(|dims| {
                        dims.iter()
                            .map(|dim| dim.as_integer()?.to_usize())
                            .collect::<Option<Vec<_>>>()
                    });
                    match parsed {
                        Some(dims) => shape = Some(dims),
                        None => return Err(ParseHeaderError::IllegalValue { key: "shape", value }),
                    }
                }
                _ => return Err(ParseHeaderError::UnknownKey(key)),
            }
        }
        Ok(Self {
            type_descriptor: type_descriptor.ok_or(ParseHeaderError::MissingKey("descr"))?,
            fortran_order: fortran_order.ok_or(ParseHeaderError::MissingKey("fortran_order"))?,
            shape: shape.ok_or(ParseHeaderError::MissingKey("shape"))?,
        })
    }

    pub(crate) fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, ReadHeaderError> {
        let mut magic = [0; MAGIC_STRING.len()];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC_STRING {
            return Err(ParseHeaderError::MagicString.into());
        }

        let mut version = [0; 2];
        reader.read_exact(&mut version)?;
        let version = Version::from_bytes(version)?;
        let header_len = version.read_header_len(&mut reader)?;

        // Grow with the bytes actually present; `HEADER_LEN` may claim up to 4 GiB.
        let mut buf = Vec::new();
        (&mut reader).take(header_len as u64).read_to_end(&mut buf)?;
        if buf.len() < header_len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        let Some((&b'\n', dict)) = buf.split_last() else {
            return Err(ParseHeaderError::MissingNewline.into());
        };
        if version != Version::V3 && !dict.is_ascii() {
            return Err(ParseHeaderError::NonAscii.into());
        }
        let dict = std::str::from_utf8(dict).map_err(ParseHeaderError::from)?;
        let value = dict.parse().map_err(ParseHeaderError::from)?;
        Ok(Self::from_py_value(value)?)
    }

    fn to_py_value(&self) -> PyValue {
        let entry = |key: &str, value| (PyValue::String(key.to_string()), value);
        PyValue::Dict(vec![
            entry("descr", self.type_descriptor.clone()),
            entry("fortran_order", PyValue::Boolean(self.fortran_order)),
            entry(
                "shape",
                PyValue::Tuple(self.shape.iter().map(|&dim| PyValue::Integer(dim.into())).collect()),
            ),
        ])
    }

    fn to_bytes(&self) -> Result<Vec<u8>, FormatHeaderError> {
        let mut dict = Vec::new();
        self.to_py_value().write_ascii(&mut dict)?;

        for version in [Version::V1, Version::V2] {
            let prefix_len = MAGIC_STRING.len() + 2 + version.header_len_width();
            // The trailing newline counts towards the padded length.
            let total_len = (prefix_len + dict.len() + 1).div_ceil(HEADER_DIVISOR) * HEADER_DIVISOR;
            let Some(header_len) = version.encode_header_len(total_len - prefix_len) else {
                continue;
            };
            let mut out = Vec::with_capacity(total_len);
            out.extend_from_slice(MAGIC_STRING);
            out.extend_from_slice(&version.to_bytes());
            out.extend_from_slice(&header_len);
            out.extend_from_slice(&dict);
            out.resize(total_len - 1, b' ');
            out.push(b'\n');
            debug_assert_eq!(out.len() % HEADER_DIVISOR, 0);
            return Ok(out);
        }
        Err(FormatHeaderError::HeaderTooLong)
    }

    pub(crate) fn write<W: io::Write>(&self, mut writer: W) -> Result<(), WriteHeaderError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}
