use crate::{
    npy::Header, ReadNpyError, ReadNpyExt, ReadableElement, WritableElement, WriteNpyError,
    WriteNpyExt,
};
use ndarray::{prelude::*, Data, DataOwned, IntoDimension as _};
use std::{io, mem};

impl<A, S, D> WriteNpyExt for ArrayBase<S, D>
where
    A: WritableElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn write_npy<W: io::Write>(&self, mut writer: W) -> Result<(), WriteNpyError> {
        let type_descriptor = A::type_descriptor(self.iter());
        let fortran_order =
            !self.is_standard_layout() && self.view().reversed_axes().is_standard_layout();
        Header {
            type_descriptor: type_descriptor.clone(),
            fortran_order,
            shape: self.shape().to_owned(),
        }
        .write(&mut writer)?;
        match self.as_slice_memory_order() {
            Some(slice) if self.is_standard_layout() || fortran_order => {
                A::write_slice(slice, &type_descriptor, &mut writer)?;
            }
            _ => {
                for elem in self.iter() {
                    elem.write(&type_descriptor, &mut writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}

impl<A, S, D> ReadNpyExt for ArrayBase<S, D>
where
    A: ReadableElement,
    S: DataOwned<Elem = A>,
    D: Dimension,
{
    fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let header = Header::from_reader(&mut reader)?;
        read_body(&header, reader)?
            .into_dimensionality()
            .map_err(|_| ReadNpyError::WrongNdim {
                expected: D::NDIM,
                found: header.shape.len(),
            })
    }
}

/// Reads the data section described by `header` into an array of whatever
/// layout the header declares.
pub(crate) fn read_body<A, S, R>(header: &Header, reader: R) -> Result<ArrayBase<S, IxDyn>, ReadNpyError>
where
    A: ReadableElement,
    S: DataOwned<Elem = A>,
    R: io::Read,
{
    let shape = header.shape.clone().into_dimension();
    let len = shape_length_checked::<A>(&shape).ok_or(ReadNpyError::LengthOverflow)?;
    let data = A::read_to_end_exact_vec(reader, &header.type_descriptor, len)?;
    ArrayBase::from_shape_vec(shape.set_f(header.fortran_order), data)
        .map_err(|_| ReadNpyError::LengthOverflow)
}

/// Computes the length associated with the shape (i.e. the product of the axis
/// lengths), where the element type is `A`.
///
/// Returns `None` if the number of elements or the length in bytes would
/// overflow `isize`.
fn shape_length_checked<A>(shape: &IxDyn) -> Option<usize> {
    const MAX: usize = isize::MAX as usize;
    let len = shape.size_checked()?;
    (len.checked_mul(mem::size_of::<A>())? < MAX).then_some(len)
}
