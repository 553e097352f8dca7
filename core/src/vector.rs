//! Continuous and discrete vector primitives plus affine transforms.

use std::ops::{Add, Mul, Neg, Sub};

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scalars with a smaller magnitude collapse vectors and are rejected by
/// [`Transform::scaling`].
pub const MIN_SCALAR_MAGNITUDE: f64 = 1e-7;

/// Continuous two-dimensional vector measured in grid units.
///
/// The x axis follows grid columns and the y axis follows grid rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2D {
    x: f64,
    y: f64,
}

impl Vec2D {
    /// Vector with both components set to zero.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new vector from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Dot product with another vector.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; zero when the vectors are parallel.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Returns the vector rotated by `theta` radians; positive is counter-clockwise.
    #[must_use]
    pub fn rotated(self, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Returns the vector rotated a quarter turn counter-clockwise.
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Unit vector pointing in the same direction, or `None` for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let length = self.length();
        if length <= f64::EPSILON || !length.is_finite() {
            return None;
        }

        Some(self * length.recip())
    }

    /// Reports whether the vector has zero length.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Reports whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2D {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2D {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Discrete grid coordinate used for exact comparisons and hashing.
///
/// `x` indexes the column and `y` indexes the row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridVec {
    x: i32,
    y: i32,
}

impl GridVec {
    /// Creates a new grid coordinate from a column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Euclidean distance to another coordinate.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy)
    }

    /// Number of orthogonal steps separating two coordinates on an open grid.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Coordinate offset by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Orthogonal neighbours ordered north, east, south, west.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
        ]
    }

    /// Reports whether `other` is exactly one orthogonal step away.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Continuous point at the centre of the cell.
    #[must_use]
    pub fn center(self) -> Vec2D {
        Vec2D::new(f64::from(self.x) + 0.5, f64::from(self.y) + 0.5)
    }
}

impl From<Vec2D> for GridVec {
    /// Truncates a continuous position to the cell containing it.
    fn from(position: Vec2D) -> Self {
        Self::new(position.x() as i32, position.y() as i32)
    }
}

impl Add for GridVec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Errors raised while constructing transforms.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum TransformError {
    /// The scalar would collapse every vector onto the origin.
    #[error("scalar {scalar} is too close to zero to scale by")]
    DegenerateScale {
        /// Scalar that failed validation.
        scalar: f64,
    },
}

/// Affine transform over homogeneous 2D coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    affine: DAffine2,
}

impl Transform {
    /// Rotation by `theta` radians around the origin; positive is counter-clockwise.
    #[must_use]
    pub fn rotation(theta: f64) -> Self {
        Self {
            affine: DAffine2::from_angle(theta),
        }
    }

    /// Uniform scaling by `scalar`.
    pub fn scaling(scalar: f64) -> Result<Self, TransformError> {
        if scalar.abs() < MIN_SCALAR_MAGNITUDE {
            return Err(TransformError::DegenerateScale { scalar });
        }

        Ok(Self {
            affine: DAffine2::from_scale(DVec2::splat(scalar)),
        })
    }

    /// Translation by `offset`.
    #[must_use]
    pub fn translation(offset: Vec2D) -> Self {
        Self {
            affine: DAffine2::from_translation(offset.into()),
        }
    }

    /// Composes two transforms so that `self` applies first and `next` second.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        next * self
    }

    /// Applies the transform to a vector treated as a point.
    #[must_use]
    pub fn apply(&self, vector: Vec2D) -> Vec2D {
        self.affine.transform_point2(vector.into()).into()
    }
}

impl Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            affine: self.affine * rhs.affine,
        }
    }
}

impl From<Vec2D> for DVec2 {
    fn from(vector: Vec2D) -> Self {
        DVec2::new(vector.x, vector.y)
    }
}

impl From<DVec2> for Vec2D {
    fn from(vector: DVec2) -> Self {
        Self::new(vector.x, vector.y)
    }
}
