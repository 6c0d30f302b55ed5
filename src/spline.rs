//! Uniform in-memory spline records.

use ndarray::{Array1, Array2};

/// A non-rational B-spline of any parametric dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct BSpline {
    /// One degree per parametric dimension.
    pub degrees: Vec<usize>,
    /// One non-decreasing knot vector per parametric dimension.
    pub knot_vectors: Vec<Vec<f64>>,
    /// Shape `(number of control points, physical dimension)`.
    pub control_points: Array2<f64>,
}

/// A B-spline with one weight per control point.
#[derive(Clone, Debug, PartialEq)]
pub struct Nurbs {
    /// Degrees, knot vectors and control points.
    pub bspline: BSpline,
    /// Shape `(number of control points,)`.
    pub weights: Array1<f64>,
}

/// A loaded spline; the variant is fixed when the record is created.
#[derive(Clone, Debug, PartialEq)]
pub enum Spline {
    /// Non-rational.
    BSpline(BSpline),
    /// Rational.
    Nurbs(Nurbs),
}

/// A spline as a geometry reader reports it: `weights` is `None` for
/// non-rational splines.
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct RawSpline {
    pub weights: Option<Array1<f64>>,
    pub degrees: Vec<usize>,
    pub knot_vectors: Vec<Vec<f64>>,
    pub control_points: Array2<f64>,
}

impl From<RawSpline> for Spline {
    fn from(raw: RawSpline) -> Self {
        let bspline = BSpline {
            degrees: raw.degrees,
            knot_vectors: raw.knot_vectors,
            control_points: raw.control_points,
        };
        match raw.weights {
            None => Self::BSpline(bspline),
            Some(weights) => Self::Nurbs(Nurbs { bspline, weights }),
        }
    }
}

impl From<BSpline> for Spline {
    fn from(bspline: BSpline) -> Self {
        Self::BSpline(bspline)
    }
}

impl From<Nurbs> for Spline {
    fn from(nurbs: Nurbs) -> Self {
        Self::Nurbs(nurbs)
    }
}

impl Spline {
    /// The attributes shared by both variants.
    pub fn as_bspline(&self) -> &BSpline {
        match self {
            Self::BSpline(bspline) => bspline,
            Self::Nurbs(nurbs) => &nurbs.bspline,
        }
    }

    /// One degree per parametric dimension.
    pub fn degrees(&self) -> &[usize] {
        &self.as_bspline().degrees
    }

    /// One knot vector per parametric dimension.
    pub fn knot_vectors(&self) -> &[Vec<f64>] {
        &self.as_bspline().knot_vectors
    }

    /// Control points, one per row.
    pub fn control_points(&self) -> &Array2<f64> {
        &self.as_bspline().control_points
    }

    /// `Some` exactly for the NURBS variant.
    pub fn weights(&self) -> Option<&Array1<f64>> {
        match self {
            Self::BSpline(_) => None,
            Self::Nurbs(nurbs) => Some(&nurbs.weights),
        }
    }

    /// Whether this is the NURBS variant.
    pub fn is_rational(&self) -> bool {
        matches!(self, Self::Nurbs(_))
    }

    /// Number of parametric dimensions.
    pub fn para_dim(&self) -> usize {
        self.degrees().len()
    }

    /// Number of physical dimensions.
    pub fn dim(&self) -> usize {
        self.control_points().ncols()
    }

    /// Variant name as stored in archive tags.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BSpline(_) => "BSpline",
            Self::Nurbs(_) => "NURBS",
        }
    }

    /// Self-description, e.g. `NURBS, parametric dimension: 2, physical dimension: 3`.
    pub fn whatami(&self) -> String {
        format!(
            "{}, parametric dimension: {}, physical dimension: {}",
            self.kind(),
            self.para_dim(),
            self.dim()
        )
    }

    /// Splits the record back into the reader tuple.
    pub fn into_raw(self) -> RawSpline {
        let (bspline, weights) = match self {
            Self::BSpline(bspline) => (bspline, None),
            Self::Nurbs(Nurbs { bspline, weights }) => (bspline, Some(weights)),
        };
        RawSpline {
            weights,
            degrees: bspline.degrees,
            knot_vectors: bspline.knot_vectors,
            control_points: bspline.control_points,
        }
    }
}
