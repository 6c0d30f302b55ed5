//! Text form of ragged knot vectors.
//!
//! Archives keep knot vectors as the text of a nested Python list, e.g.
//! `[[0.0, 0.0, 1.0, 1.0], [0, 0, 0, 1, 1, 1]]`, since they differ in length
//! per parametric dimension. The text is parsed as a Python literal and only
//! lists or tuples of numeric literals are accepted; nothing is evaluated.

use num_traits::ToPrimitive;
use py_literal::{ParseError as PyValueParseError, Value as PyValue};
use std::fmt::Write as _;
use thiserror::Error;

/// An error parsing knot vectors from text.
#[derive(Debug, Error)]
pub enum ParseKnotVectorsError {
    /// The text is not a Python literal.
    #[error("knot vectors are not a valid literal: {0}")]
    Syntax(#[from] PyValueParseError),
    /// The outer value is not a list or tuple.
    #[error("knot vectors must be a list of lists, found {0}")]
    NotASequence(PyValue),
    /// A knot vector is not a list or tuple.
    #[error("knot vector {index} must be a list, found {value}")]
    NotAKnotVector {
        /// Position of the offending knot vector.
        index: usize,
        /// The value found there.
        value: PyValue,
    },
    /// A knot is not an integer or float literal.
    #[error("knot {position} of knot vector {index} is not a number: {value}")]
    NotANumber {
        /// Position of the knot vector.
        index: usize,
        /// Position of the knot within it.
        position: usize,
        /// The value found there.
        value: PyValue,
    },
}

fn as_sequence(value: &PyValue) -> Option<&[PyValue]> {
    match value {
        PyValue::List(items) | PyValue::Tuple(items) => Some(items),
        _ => None,
    }
}

fn as_knot(value: &PyValue) -> Option<f64> {
    match value {
        PyValue::Float(f) => Some(*f),
        PyValue::Integer(i) => i.to_f64(),
        _ => None,
    }
}

/// Parses `[[k00, k01, ...], [k10, ...], ...]` into one `Vec` per dimension.
pub fn parse_knot_vectors(text: &str) -> Result<Vec<Vec<f64>>, ParseKnotVectorsError> {
    let value: PyValue = text.trim().parse()?;
    let outer = as_sequence(&value).ok_or_else(|| ParseKnotVectorsError::NotASequence(value.clone()))?;
    outer
        .iter()
        .enumerate()
        .map(|(index, kv)| {
            let knots = as_sequence(kv).ok_or_else(|| ParseKnotVectorsError::NotAKnotVector {
                index,
                value: kv.clone(),
            })?;
            knots
                .iter()
                .enumerate()
                .map(|(position, knot)| {
                    as_knot(knot).ok_or_else(|| ParseKnotVectorsError::NotANumber {
                        index,
                        position,
                        value: knot.clone(),
                    })
                })
                .collect()
        })
        .collect()
}

/// Formats knot vectors the way [`parse_knot_vectors`] reads them.
///
/// Only finite knots read back; NaN and infinities are written as `NaN` and
/// `inf`, which are not literals.
pub fn format_knot_vectors<K: AsRef<[f64]>>(knot_vectors: &[K]) -> String {
    let mut out = String::from("[");
    for (i, kv) in knot_vectors.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('[');
        for (j, knot) in kv.as_ref().iter().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            // `{:?}` keeps a decimal point or exponent, so the value reads
            // back as a float literal.
            let _ = write!(out, "{knot:?}");
        }
        out.push(']');
    }
    out.push(']');
    out
}
