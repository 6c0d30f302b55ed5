use crate::numeric::{Dtype, NumericArray};
use thiserror::Error;

/// An error building a [`CoercePolicy`].
#[derive(Debug, Error)]
pub enum CoerceError {
    /// The requested type name is not a supported element type.
    #[error("unknown dtype name `{0}`")]
    UnknownDtype(String),
}

/// How [`make_c_contiguous`] treats the element type of its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoercePolicy {
    /// Element type of the result. `None` keeps the input's type.
    pub target: Option<Dtype>,
    /// Copy even when the input already satisfies the policy.
    pub always_copy: bool,
}

impl CoercePolicy {
    /// Keep the element type; copy only if the layout requires it.
    pub const fn keep() -> Self {
        Self { target: None, always_copy: false }
    }

    /// Convert to `dtype`, always producing a new array.
    pub const fn exact(dtype: Dtype) -> Self {
        Self { target: Some(dtype), always_copy: true }
    }

    /// Convert to `dtype`, copying only when the input has another type.
    pub const fn convert(dtype: Dtype) -> Self {
        Self { target: Some(dtype), always_copy: false }
    }

    /// Convert to the type called `name`, copying only when the input's type
    /// has a different name.
    pub fn named(name: &str) -> Result<Self, CoerceError> {
        Dtype::from_name(name)
            .map(Self::convert)
            .ok_or_else(|| CoerceError::UnknownDtype(name.into()))
    }
}

/// Returns `array` as a densely packed row-major array, retyped per `policy`.
///
/// An input that is already row-major and needs no conversion is returned as
/// is. The result is always row-major.
///
/// ```
/// use ndarray::array;
/// use splineio::{make_c_contiguous, CoercePolicy, Dtype};
///
/// let points = array![[0i64, 0], [1, 2]].reversed_axes();
/// let packed = make_c_contiguous(points, CoercePolicy::named("float64")?);
/// assert!(packed.is_c_contiguous());
/// assert_eq!(packed.dtype(), Dtype::Float64);
/// # Ok::<_, splineio::CoerceError>(())
/// ```
pub fn make_c_contiguous<T: Into<NumericArray>>(array: T, policy: CoercePolicy) -> NumericArray {
    let array = array.into();
    match policy.target {
        Some(dtype) if policy.always_copy || array.dtype() != dtype => array.astype(dtype),
        None if policy.always_copy => array.astype(array.dtype()),
        _ => array.into_c_contiguous(),
    }
}
