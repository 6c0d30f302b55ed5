//! Element codecs for the `.npy` data section.

use super::{ReadDataError, ReadableElement, WritableElement};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use py_literal::Value as PyValue;
use std::io::{self, Read};
use thiserror::Error;

/// An error parsing a `bool` from a byte.
#[derive(Debug, Error)]
#[error("error parsing value {bad_value:#04x} as a bool")]
pub struct ParseBoolError {
    bad_value: u8,
}

/// An error decoding a fixed-width string element.
#[derive(Debug, Error)]
pub enum ParseStringError {
    /// A `U` element contained a value that is not a Unicode scalar value.
    #[error("invalid code point {0:#x} in unicode string")]
    InvalidCodePoint(u32),
    /// An `S` element was not valid UTF-8.
    #[error("byte string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

impl Endian {
    const NATIVE: Self = if cfg!(target_endian = "big") {
        Self::Big
    } else {
        Self::Little
    };
}

/// A parsed `descr` string such as `<f8`, `|b1` or `<U12`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TypeDesc {
    pub endian: Endian,
    pub kind: char,
    /// Bytes per element for numeric kinds, characters for `U`.
    pub size: usize,
}

impl TypeDesc {
    pub(crate) fn parse(desc: &PyValue) -> Option<Self> {
        let desc = desc.as_string()?;
        let mut chars = desc.chars();
        let endian = match chars.next()? {
            '<' => Endian::Little,
            '>' => Endian::Big,
            '|' | '=' => Endian::NATIVE,
            _ => return None,
        };
        let kind = chars.next()?;
        let size = chars.as_str().parse().ok()?;
        Some(Self { endian, kind, size })
    }

    fn matches(&self, kind: char, size: usize) -> bool {
        self.kind == kind && self.size == size
    }

    /// Bytes occupied by one element.
    fn byte_width(&self) -> Option<usize> {
        match self.kind {
            'U' => self.size.checked_mul(4),
            _ => Some(self.size),
        }
    }
}

fn check_for_extra_bytes<R: io::Read>(reader: &mut R) -> Result<(), ReadDataError> {
    let extra = reader.read_to_end(&mut Vec::new())?;
    if extra == 0 {
        Ok(())
    } else {
        Err(ReadDataError::ExtraBytes(extra))
    }
}

/// Reads exactly `byte_len` bytes followed by end of stream.
///
/// The buffer grows with the data actually read, so a shape that promises
/// more than the stream holds fails with `MissingData` instead of
/// allocating up front.
fn read_data<R: io::Read>(reader: &mut R, byte_len: usize) -> Result<Vec<u8>, ReadDataError> {
    let limit = u64::try_from(byte_len).unwrap_or(u64::MAX);
    let mut buf = Vec::new();
    (&mut *reader).take(limit).read_to_end(&mut buf)?;
    if buf.len() < byte_len {
        return Err(ReadDataError::MissingData);
    }
    check_for_extra_bytes(reader)?;
    Ok(buf)
}

fn descriptor(s: impl Into<String>) -> PyValue {
    PyValue::String(s.into())
}

macro_rules! impl_multibyte {
    ($elem:ty, $kind:literal, $size:literal, $read_into:ident, $write_into:ident) => {
        impl ReadableElement for $elem {
            fn read_to_end_exact_vec<R: io::Read>(
                mut reader: R,
                type_desc: &PyValue,
                len: usize,
            ) -> Result<Vec<Self>, ReadDataError> {
                let desc = TypeDesc::parse(type_desc)
                    .filter(|d| d.matches($kind, $size))
                    .ok_or_else(|| ReadDataError::WrongDescriptor(type_desc.clone()))?;
                let byte_len = len.checked_mul($size).ok_or(ReadDataError::MissingData)?;
                let buf = read_data(&mut reader, byte_len)?;
                let mut out = vec![<$elem>::default(); len];
                match desc.endian {
                    Endian::Little => LittleEndian::$read_into(&buf, &mut out),
                    Endian::Big => BigEndian::$read_into(&buf, &mut out),
                }
                Ok(out)
            }
        }

        impl WritableElement for $elem {
            fn type_descriptor<'a, I>(_elems: I) -> PyValue
            where
                I: IntoIterator<Item = &'a Self>,
            {
                descriptor(concat!("<", $kind, $size))
            }

            fn write<W: io::Write>(
                &self,
                _type_desc: &PyValue,
                writer: W,
            ) -> io::Result<()> {
                Self::write_slice(std::slice::from_ref(self), _type_desc, writer)
            }

            fn write_slice<W: io::Write>(
                slice: &[Self],
                _type_desc: &PyValue,
                mut writer: W,
            ) -> io::Result<()> {
                let mut buf = vec![0; slice.len() * $size];
                LittleEndian::$write_into(slice, &mut buf);
                writer.write_all(&buf)?;
                Ok(())
            }
        }
    };
}

impl_multibyte!(i16, 'i', 2, read_i16_into, write_i16_into);
impl_multibyte!(u16, 'u', 2, read_u16_into, write_u16_into);
impl_multibyte!(i32, 'i', 4, read_i32_into, write_i32_into);
impl_multibyte!(u32, 'u', 4, read_u32_into, write_u32_into);
impl_multibyte!(i64, 'i', 8, read_i64_into, write_i64_into);
impl_multibyte!(u64, 'u', 8, read_u64_into, write_u64_into);
impl_multibyte!(f32, 'f', 4, read_f32_into, write_f32_into);
impl_multibyte!(f64, 'f', 8, read_f64_into, write_f64_into);

fn read_single_bytes<R: io::Read>(
    mut reader: R,
    type_desc: &PyValue,
    kind: char,
    len: usize,
) -> Result<Vec<u8>, ReadDataError> {
    if !TypeDesc::parse(type_desc).is_some_and(|d| d.matches(kind, 1)) {
        return Err(ReadDataError::WrongDescriptor(type_desc.clone()));
    }
    read_data(&mut reader, len)
}

impl ReadableElement for u8 {
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        read_single_bytes(reader, type_desc, 'u', len)
    }
}

impl ReadableElement for i8 {
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        let bytes = read_single_bytes(reader, type_desc, 'i', len)?;
        Ok(bytes.into_iter().map(|b| b as i8).collect())
    }
}

impl ReadableElement for bool {
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        read_single_bytes(reader, type_desc, 'b', len)?
            .into_iter()
            .map(|b| match b {
                0 => Ok(false),
                1 => Ok(true),
                bad_value => Err(ParseBoolError { bad_value }.into()),
            })
            .collect()
    }
}

macro_rules! impl_single_byte_write {
    ($elem:ty, $desc:literal, $to_byte:expr) => {
        impl WritableElement for $elem {
            fn type_descriptor<'a, I>(_elems: I) -> PyValue
            where
                I: IntoIterator<Item = &'a Self>,
            {
                descriptor($desc)
            }

            fn write<W: io::Write>(
                &self,
                _type_desc: &PyValue,
                mut writer: W,
            ) -> io::Result<()> {
                let to_byte: fn($elem) -> u8 = $to_byte;
                writer.write_all(&[to_byte(*self)])?;
                Ok(())
            }
        }
    };
}

impl_single_byte_write!(u8, "|u1", |v| v);
impl_single_byte_write!(i8, "|i1", |v| v as u8);
impl_single_byte_write!(bool, "|b1", u8::from);

/// Fixed-width strings: `U` is NUL-padded UTF-32, `S` is NUL-padded bytes.
impl ReadableElement for String {
    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        let wrong = || ReadDataError::WrongDescriptor(type_desc.clone());
        let desc = TypeDesc::parse(type_desc)
            .filter(|d| matches!(d.kind, 'U' | 'S') && d.size > 0)
            .ok_or_else(wrong)?;
        let width = desc.byte_width().ok_or_else(wrong)?;
        let total = width.checked_mul(len).ok_or_else(wrong)?;
        let buf = read_data(&mut reader, total)?;
        buf.chunks_exact(width)
            .map(|raw| match desc.kind {
                'U' => decode_utf32(raw, desc.endian),
                _ => decode_bytes(raw),
            })
            .collect()
    }
}

fn decode_utf32(raw: &[u8], endian: Endian) -> Result<String, ReadDataError> {
    let mut out = String::new();
    for unit in raw.chunks_exact(4) {
        let code = match endian {
            Endian::Little => LittleEndian::read_u32(unit),
            Endian::Big => BigEndian::read_u32(unit),
        };
        if code == 0 {
            break;
        }
        let ch = char::from_u32(code).ok_or(ParseStringError::InvalidCodePoint(code))?;
        out.push(ch);
    }
    Ok(out)
}

fn decode_bytes(raw: &[u8]) -> Result<String, ReadDataError> {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Ok(String::from_utf8(raw[..end].to_vec()).map_err(ParseStringError::from)?)
}

impl WritableElement for String {
    /// `<U{n}` where `n` is the longest element in characters (at least 1).
    fn type_descriptor<'a, I>(elems: I) -> PyValue
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let width = elems.into_iter().map(|s| s.chars().count()).max().unwrap_or(0);
        descriptor(format!("<U{}", width.max(1)))
    }

    fn write<W: io::Write>(&self, type_desc: &PyValue, mut writer: W) -> io::Result<()> {
        let width = TypeDesc::parse(type_desc).map_or(0, |d| d.size);
        let mut buf = vec![0; width * 4];
        for (unit, ch) in buf.chunks_exact_mut(4).zip(self.chars()) {
            LittleEndian::write_u32(unit, u32::from(ch));
        }
        writer.write_all(&buf)?;
        Ok(())
    }
}
