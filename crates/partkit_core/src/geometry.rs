//! Geometry primitives shared by renderers and policies.
//!
//! # Responsibility
//! - Provide the affine transform type used for coordinate conversion.
//! - Keep non-invertible transforms recoverable instead of fatal.
//!
//! # Invariants
//! - `AffineTransform` is a plain value; every operation returns a new value.
//! - Inversion fails only when the determinant is (numerically) zero.

use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DETERMINANT_EPSILON: f64 = 1e-12;

/// Two-dimensional point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `self - other` as a delta point.
    pub fn delta_from(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns whether `point` lies inside this rectangle (edges included).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

/// Geometry errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// Transform has a zero determinant and cannot be inverted.
    NonInvertible { determinant: f64 },
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonInvertible { determinant } => {
                write!(f, "transform is not invertible (determinant {determinant})")
            }
        }
    }
}

impl Error for GeometryError {}

/// Affine transform in row-major form:
///
/// ```text
/// | m00 m01 tx |
/// | m10 m11 ty |
/// |  0   0   1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m00: f64,
    pub m01: f64,
    pub m10: f64,
    pub m11: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self {
            m00: 1.0,
            m01: 0.0,
            m10: 0.0,
            m11: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self {
            m00: 1.0,
            m01: 0.0,
            m10: 0.0,
            m11: 1.0,
            tx,
            ty,
        }
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self {
            m00: sx,
            m01: 0.0,
            m10: 0.0,
            m11: sy,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Translation component as a point.
    pub fn translation_part(&self) -> Point {
        Point::new(self.tx, self.ty)
    }

    pub fn determinant(&self) -> f64 {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    /// Returns `self * other`: `other` is applied first, then `self`.
    pub fn concatenate(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform {
            m00: self.m00 * other.m00 + self.m01 * other.m10,
            m01: self.m00 * other.m01 + self.m01 * other.m11,
            m10: self.m10 * other.m00 + self.m11 * other.m10,
            m11: self.m10 * other.m01 + self.m11 * other.m11,
            tx: self.m00 * other.tx + self.m01 * other.ty + self.tx,
            ty: self.m10 * other.tx + self.m11 * other.ty + self.ty,
        }
    }

    /// Returns `other * self`: `self` is applied first, then `other`.
    pub fn pre_concatenate(&self, other: &AffineTransform) -> AffineTransform {
        other.concatenate(self)
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.m00 * point.x + self.m01 * point.y + self.tx,
            self.m10 * point.x + self.m11 * point.y + self.ty,
        )
    }

    /// Applies only the linear part (no translation), for deltas.
    pub fn apply_delta(&self, delta: Point) -> Point {
        Point::new(
            self.m00 * delta.x + self.m01 * delta.y,
            self.m10 * delta.x + self.m11 * delta.y,
        )
    }

    pub fn invert(&self) -> Result<AffineTransform, GeometryError> {
        let determinant = self.determinant();
        if determinant.abs() < DETERMINANT_EPSILON || !determinant.is_finite() {
            return Err(GeometryError::NonInvertible { determinant });
        }
        let inv = 1.0 / determinant;
        let m00 = self.m11 * inv;
        let m01 = -self.m01 * inv;
        let m10 = -self.m10 * inv;
        let m11 = self.m00 * inv;
        Ok(AffineTransform {
            m00,
            m01,
            m10,
            m11,
            tx: -(m00 * self.tx + m01 * self.ty),
            ty: -(m10 * self.tx + m11 * self.ty),
        })
    }
}

/// Maps `point` through the inverse of `transform`.
///
/// A non-invertible transform is treated as identity: the point is returned
/// unchanged and a `transform_not_invertible` event is logged.
pub fn inverse_apply_or_identity(transform: &AffineTransform, point: Point) -> Point {
    match transform.invert() {
        Ok(inverse) => inverse.apply(point),
        Err(GeometryError::NonInvertible { determinant }) => {
            warn!(
                "event=transform_not_invertible module=geometry status=recovered determinant={}",
                determinant
            );
            point
        }
    }
}

/// Delta variant of [`inverse_apply_or_identity`].
pub fn inverse_apply_delta_or_identity(transform: &AffineTransform, delta: Point) -> Point {
    match transform.invert() {
        Ok(inverse) => inverse.apply_delta(delta),
        Err(GeometryError::NonInvertible { determinant }) => {
            warn!(
                "event=transform_not_invertible module=geometry status=recovered determinant={}",
                determinant
            );
            delta
        }
    }
}
