//! Dynamically typed numeric arrays.
//!
//! `.npz` archives written by different tools store the same logical field
//! with different element types (`degrees` may be `<i8` or `<i4`, control
//! points may be integers). [`NumericArray`] keeps whatever the file holds so
//! callers can decide how to coerce it.

use crate::{
    impl_ndarray::read_body,
    npy::{Header, TypeDesc},
    ReadDataError, ReadNpyError, ReadNpyExt, WriteNpyError, WriteNpyExt,
};
use ndarray::{ArrayBase, ArrayD, Dimension, OwnedRepr};
use num_traits::AsPrimitive;
use std::io;

/// Element type of a [`NumericArray`], named as NumPy names it.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl Dtype {
    /// Every supported element type.
    pub const ALL: [Self; 10] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
    ];

    /// The NumPy name, e.g. `"float64"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Whether this is a signed or unsigned integer type.
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }

    /// Looks up a type by its NumPy name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dtype| dtype.name() == name)
    }

    pub(crate) fn from_type_desc(desc: &TypeDesc) -> Option<Self> {
        let dtype = match (desc.kind, desc.size) {
            ('i', 1) => Self::Int8,
            ('i', 2) => Self::Int16,
            ('i', 4) => Self::Int32,
            ('i', 8) => Self::Int64,
            ('u', 1) => Self::UInt8,
            ('u', 2) => Self::UInt16,
            ('u', 4) => Self::UInt32,
            ('u', 8) => Self::UInt64,
            ('f', 4) => Self::Float32,
            ('f', 8) => Self::Float64,
            _ => return None,
        };
        Some(dtype)
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An n-dimensional numeric array whose element type is known only at
/// runtime.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub enum NumericArray {
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    UInt64(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

macro_rules! dispatch {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            NumericArray::Int8($arr) => $body,
            NumericArray::Int16($arr) => $body,
            NumericArray::Int32($arr) => $body,
            NumericArray::Int64($arr) => $body,
            NumericArray::UInt8($arr) => $body,
            NumericArray::UInt16($arr) => $body,
            NumericArray::UInt32($arr) => $body,
            NumericArray::UInt64($arr) => $body,
            NumericArray::Float32($arr) => $body,
            NumericArray::Float64($arr) => $body,
        }
    };
}

/// A primitive that can live in a [`NumericArray`].
pub trait NumericElement: Copy + 'static {
    /// The matching runtime type.
    const DTYPE: Dtype;

    #[doc(hidden)]
    fn wrap(array: ArrayD<Self>) -> NumericArray;

    #[doc(hidden)]
    fn unwrap(array: NumericArray) -> Result<ArrayD<Self>, NumericArray>;
}

macro_rules! impl_numeric_element {
    ($elem:ty, $variant:ident) => {
        impl NumericElement for $elem {
            const DTYPE: Dtype = Dtype::$variant;

            fn wrap(array: ArrayD<Self>) -> NumericArray {
                NumericArray::$variant(array)
            }

            fn unwrap(array: NumericArray) -> Result<ArrayD<Self>, NumericArray> {
                match array {
                    NumericArray::$variant(array) => Ok(array),
                    other => Err(other),
                }
            }
        }

        impl<D: Dimension> From<ArrayBase<OwnedRepr<$elem>, D>> for NumericArray {
            fn from(array: ArrayBase<OwnedRepr<$elem>, D>) -> Self {
                NumericArray::$variant(array.into_dyn())
            }
        }
    };
}

impl_numeric_element!(i8, Int8);
impl_numeric_element!(i16, Int16);
impl_numeric_element!(i32, Int32);
impl_numeric_element!(i64, Int64);
impl_numeric_element!(u8, UInt8);
impl_numeric_element!(u16, UInt16);
impl_numeric_element!(u32, UInt32);
impl_numeric_element!(u64, UInt64);
impl_numeric_element!(f32, Float32);
impl_numeric_element!(f64, Float64);

fn cast<T, U>(array: &ArrayD<T>) -> ArrayD<U>
where
    T: AsPrimitive<U>,
    U: Copy + 'static,
{
    // Mapping a standard-layout view yields a standard-layout result.
    array.as_standard_layout().mapv(|x| x.as_())
}

impl NumericArray {
    /// The element type.
    pub fn dtype(&self) -> Dtype {
        dispatch!(self, a => element_dtype(a))
    }

    /// The array shape.
    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the elements are densely packed in row-major order.
    pub fn is_c_contiguous(&self) -> bool {
        dispatch!(self, a => a.is_standard_layout())
    }

    /// Copies the array into a new row-major array of element type `dtype`.
    ///
    /// Always copies, even when `dtype` already matches.
    pub fn astype(&self, dtype: Dtype) -> Self {
        dispatch!(self, a => match dtype {
            Dtype::Int8 => Self::Int8(cast(a)),
            Dtype::Int16 => Self::Int16(cast(a)),
            Dtype::Int32 => Self::Int32(cast(a)),
            Dtype::Int64 => Self::Int64(cast(a)),
            Dtype::UInt8 => Self::UInt8(cast(a)),
            Dtype::UInt16 => Self::UInt16(cast(a)),
            Dtype::UInt32 => Self::UInt32(cast(a)),
            Dtype::UInt64 => Self::UInt64(cast(a)),
            Dtype::Float32 => Self::Float32(cast(a)),
            Dtype::Float64 => Self::Float64(cast(a)),
        })
    }

    /// Returns `self` if it is already row-major, otherwise a row-major copy.
    pub fn into_c_contiguous(self) -> Self {
        dispatch!(self, a => {
            if a.is_standard_layout() {
                NumericElement::wrap(a)
            } else {
                NumericElement::wrap(a.as_standard_layout().into_owned())
            }
        })
    }

    /// Extracts the typed array, or gives `self` back if the element type
    /// differs.
    pub fn into_array<T: NumericElement>(self) -> Result<ArrayD<T>, Self> {
        T::unwrap(self)
    }
}

fn element_dtype<T: NumericElement>(_: &ArrayD<T>) -> Dtype {
    T::DTYPE
}

impl ReadNpyExt for NumericArray {
    fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let header = Header::from_reader(&mut reader)?;
        let dtype = TypeDesc::parse(&header.type_descriptor)
            .and_then(|desc| Dtype::from_type_desc(&desc))
            .ok_or_else(|| ReadDataError::WrongDescriptor(header.type_descriptor.clone()))?;
        Ok(match dtype {
            Dtype::Int8 => Self::Int8(read_body(&header, reader)?),
            Dtype::Int16 => Self::Int16(read_body(&header, reader)?),
            Dtype::Int32 => Self::Int32(read_body(&header, reader)?),
            Dtype::Int64 => Self::Int64(read_body(&header, reader)?),
            Dtype::UInt8 => Self::UInt8(read_body(&header, reader)?),
            Dtype::UInt16 => Self::UInt16(read_body(&header, reader)?),
            Dtype::UInt32 => Self::UInt32(read_body(&header, reader)?),
            Dtype::UInt64 => Self::UInt64(read_body(&header, reader)?),
            Dtype::Float32 => Self::Float32(read_body(&header, reader)?),
            Dtype::Float64 => Self::Float64(read_body(&header, reader)?),
        })
    }
}

impl WriteNpyExt for NumericArray {
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError> {
        dispatch!(self, a => a.write_npy(writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ShapeBuilder};

    #[test]
    fn dtype_names_round_trip() {
        for dtype in Dtype::ALL {
            assert_eq!(Dtype::from_name(dtype.name()), Some(dtype));
        }
        assert_eq!(Dtype::from_name("float128"), None);
    }

    #[test]
    fn integer_types() {
        let ints: Vec<_> = Dtype::ALL.into_iter().filter(|d| d.is_integer()).collect();
        assert_eq!(ints.len(), 8);
        assert!(!Dtype::Float32.is_integer());
    }

    #[test]
    fn astype_converts_and_packs() {
        let ints = NumericArray::from(array![[1i64, 2], [3, 4]]);
        let floats = ints.astype(Dtype::Float64);
        assert_eq!(floats.dtype(), Dtype::Float64);
        assert_eq!(
            floats.into_array::<f64>().unwrap(),
            array![[1.0, 2.0], [3.0, 4.0]].into_dyn()
        );
    }

    #[test]
    fn fortran_arrays_are_repacked() {
        let f = ndarray::Array::from_shape_vec((2, 2).f(), vec![1.0f32, 3.0, 2.0, 4.0]).unwrap();
        let array = NumericArray::from(f);
        assert!(!array.is_c_contiguous());
        let packed = array.into_c_contiguous();
        assert!(packed.is_c_contiguous());
        assert_eq!(
            packed.into_array::<f32>().unwrap(),
            array![[1.0f32, 2.0], [3.0, 4.0]].into_dyn()
        );
    }

    #[test]
    fn reads_whatever_the_file_holds() {
        let mut buf = Vec::new();
        array![2u16, 3].write_npy(&mut buf).unwrap();
        let array = NumericArray::read_npy(&buf[..]).unwrap();
        assert_eq!(array.dtype(), Dtype::UInt16);
        assert_eq!(array.shape(), &[2]);
    }

    #[test]
    fn into_array_gives_back_on_mismatch() {
        let array = NumericArray::from(array![1i32]);
        let back = array.into_array::<f64>().unwrap_err();
        assert_eq!(back.dtype(), Dtype::Int32);
    }
}
