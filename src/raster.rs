use ndarray::{Array1, Array2};
use num_traits::ToPrimitive;
use thiserror::Error;

/// An error generating raster points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    /// Bounds and resolutions disagree on the number of axes.
    #[error("length of resolutions ({resolutions}) and bounds ({lower}, {upper}) should match")]
    DimensionMismatch {
        /// Number of resolutions given.
        resolutions: usize,
        /// Length of the lower bound.
        lower: usize,
        /// Length of the upper bound.
        upper: usize,
    },
    /// A resolution is negative or not a number.
    #[error("resolution of axis {0} is not a non-negative count")]
    InvalidResolution(usize),
    /// The product of the resolutions does not fit in `usize`.
    #[error("resolutions {0:?} describe more points than can be addressed")]
    TooManyPoints(Vec<usize>),
}

/// Evenly spaced grid points spanning `bounds`.
///
/// `bounds` is `(lower, upper)` with one entry per axis and `resolutions`
/// gives the number of samples per axis, truncated to an integer. Both
/// bounds are included. The result has shape `(∏ resolutions, d)`; the
/// first axis varies fastest, so the first row is `lower` and the last row
/// is `upper`.
///
/// ```
/// use splineio::raster_points;
///
/// let points = raster_points((&[0., 0.], &[1., 1.]), &[2, 2])?;
/// assert_eq!(points.nrows(), 4);
/// assert_eq!(points.row(1).to_vec(), vec![1., 0.]);
/// # Ok::<_, splineio::RasterError>(())
/// ```
pub fn raster_points<R: ToPrimitive>(
    (lower, upper): (&[f64], &[f64]),
    resolutions: &[R],
) -> Result<Array2<f64>, RasterError> {
    if resolutions.len() != lower.len() || lower.len() != upper.len() {
        return Err(RasterError::DimensionMismatch {
            resolutions: resolutions.len(),
            lower: lower.len(),
            upper: upper.len(),
        });
    }
    let axes = resolutions
        .iter()
        .zip(lower.iter().zip(upper))
        .enumerate()
        .map(|(i, (res, (&lo, &hi)))| {
            let n = res.to_usize().ok_or(RasterError::InvalidResolution(i))?;
            let mut samples = Array1::linspace(lo, hi, n);
            if n > 1 {
                samples[n - 1] = hi;
            }
            Ok(samples)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dim = axes.len();
    let count = axes
        .iter()
        .try_fold(1usize, |acc, samples| acc.checked_mul(samples.len()))
        .ok_or_else(|| RasterError::TooManyPoints(axes.iter().map(Array1::len).collect()))?;
    let mut points = Array2::zeros((count, dim));
    for (row, mut point) in points.rows_mut().into_iter().enumerate() {
        let mut rest = row;
        for (axis, samples) in axes.iter().enumerate() {
            point[axis] = samples[rest % samples.len()];
            rest /= samples.len();
        }
    }
    Ok(points)
}
