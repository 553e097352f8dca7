#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid ray marching that feeds the first-person view.
//!
//! [`RayCaster`] captures a camera over a grid and lazily yields one
//! [`ColumnHit`] per screen column using a DDA traversal. Rays are built as
//! `direction + viewport * s` for `s` in `[-1, 1)` and are deliberately left
//! unnormalized, so distances are measured along the unscaled ray.

use std::iter::FusedIterator;

use escape_block_core::{CellCode, CellLookup, GridVec, Vec2D};
use thiserror::Error;

/// Grid axis whose line a ray crossed when it hit a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The ray crossed a vertical grid line (stepped along x).
    X,
    /// The ray crossed a horizontal grid line (stepped along y).
    Y,
}

/// Nearest non-empty cell hit by a single column ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnHit {
    distance: f64,
    axis: Axis,
    cell: CellCode,
    map_cell: GridVec,
    steps: u32,
}

impl ColumnHit {
    /// Ray parameter at which the hit cell's boundary was crossed.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Axis of the grid line that was crossed last.
    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Code of the hit cell; cells beyond the grid report [`CellCode::Wall`].
    #[must_use]
    pub const fn cell(&self) -> CellCode {
        self.cell
    }

    /// Coordinate of the hit cell.
    #[must_use]
    pub const fn map_cell(&self) -> GridVec {
        self.map_cell
    }

    /// Number of grid lines crossed before the hit.
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }
}

/// Reasons a camera cannot be ray cast.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RayError {
    /// The direction is zero or the viewport is parallel to it, so some
    /// column ray would have zero length.
    #[error("camera direction and viewport do not span a view")]
    DegenerateView,
    /// The camera sits outside the grid.
    #[error("camera position ({x}, {y}) lies outside the grid")]
    OutOfBounds {
        /// Horizontal camera coordinate.
        x: f64,
        /// Vertical camera coordinate.
        y: f64,
    },
}

/// Camera over a grid that can be ray cast any number of times.
#[derive(Debug)]
pub struct RayCaster<'a, G: ?Sized> {
    grid: &'a G,
    position: Vec2D,
    direction: Vec2D,
    viewport: Vec2D,
}

impl<G: ?Sized> Clone for RayCaster<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: ?Sized> Copy for RayCaster<'_, G> {}

impl<'a, G> RayCaster<'a, G>
where
    G: CellLookup + ?Sized,
{
    /// Validates the camera and captures it for casting.
    pub fn new(
        grid: &'a G,
        position: Vec2D,
        direction: Vec2D,
        viewport: Vec2D,
    ) -> Result<Self, RayError> {
        if !direction.is_finite()
            || !viewport.is_finite()
            || direction.is_zero()
            || direction.cross(viewport) == 0.0
        {
            return Err(RayError::DegenerateView);
        }

        let limit = f64::from(grid.size());
        let inside = position.is_finite()
            && (0.0..limit).contains(&position.x())
            && (0.0..limit).contains(&position.y());
        if !inside {
            return Err(RayError::OutOfBounds {
                x: position.x(),
                y: position.y(),
            });
        }

        Ok(Self {
            grid,
            position,
            direction,
            viewport,
        })
    }

    /// Lazily casts `column_count` rays from the left edge to the right edge.
    #[must_use]
    pub fn columns(&self, column_count: usize) -> Columns<'a, G> {
        Columns {
            caster: *self,
            column_count,
            next: 0,
        }
    }

    /// Casts the ray for screen parameter `s`, where `-1` is the left edge,
    /// `0` the centre and `1` the right edge.
    #[must_use]
    pub fn cast_at(&self, s: f64) -> ColumnHit {
        self.cast(self.direction + self.viewport * s)
    }

    fn cast(&self, ray: Vec2D) -> ColumnHit {
        let delta = Vec2D::new((1.0 / ray.x()).abs(), (1.0 / ray.y()).abs());
        let mut map = GridVec::from(self.position);
        let (step_x, mut side_x) = initial_side(ray.x(), self.position.x(), map.x(), delta.x());
        let (step_y, mut side_y) = initial_side(ray.y(), self.position.y(), map.y(), delta.y());
        let mut steps = 0u32;

        loop {
            let axis = if side_x < side_y {
                side_x += delta.x();
                map = map.offset(step_x, 0);
                Axis::X
            } else {
                side_y += delta.y();
                map = map.offset(0, step_y);
                Axis::Y
            };
            steps = steps.saturating_add(1);

            let cell = self.grid.cell(map).unwrap_or(CellCode::Wall);
            if cell != CellCode::Empty {
                let distance = match axis {
                    Axis::X => side_x - delta.x(),
                    Axis::Y => side_y - delta.y(),
                };
                return ColumnHit {
                    distance,
                    axis,
                    cell,
                    map_cell: map,
                    steps,
                };
            }
        }
    }
}

/// Step direction and distance to the first grid line along one axis.
fn initial_side(ray: f64, position: f64, map: i32, delta: f64) -> (i32, f64) {
    if ray < 0.0 {
        (-1, (position - f64::from(map)) * delta)
    } else {
        (1, (f64::from(map) + 1.0 - position) * delta)
    }
}

/// Finite iterator over the hits of every screen column.
#[derive(Debug)]
pub struct Columns<'a, G: ?Sized> {
    caster: RayCaster<'a, G>,
    column_count: usize,
    next: usize,
}

impl<G: ?Sized> Clone for Columns<'_, G> {
    fn clone(&self) -> Self {
        Self {
            caster: self.caster,
            column_count: self.column_count,
            next: self.next,
        }
    }
}

impl<G> Iterator for Columns<'_, G>
where
    G: CellLookup + ?Sized,
{
    type Item = ColumnHit;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.column_count {
            return None;
        }

        let s = 2.0 * self.next as f64 / self.column_count as f64 - 1.0;
        self.next += 1;
        Some(self.caster.cast_at(s))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.column_count.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<G> ExactSizeIterator for Columns<'_, G> where G: CellLookup + ?Sized {}

impl<G> FusedIterator for Columns<'_, G> where G: CellLookup + ?Sized {}
