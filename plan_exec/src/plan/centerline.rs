//! # Centerline
//!
//! The global route the local planner works relative to. Candidates are expressed in the
//! curvilinear frame of the centerline: arc length `s` along it and signed lateral offset `rho`,
//! positive to the left.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A polyline centerline with precomputed cumulative arc lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vector2<f64>>", into = "Vec<Vector2<f64>>")]
pub struct Centerline {
    points_m: Vec<Vector2<f64>>,

    /// Arc length at each point, the first is always zero.
    s_m: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CenterlineError {
    #[error("A centerline needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("The centerline has zero length")]
    ZeroLength,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Centerline {
    /// Build a centerline from its points.
    ///
    /// Consecutive duplicate points are dropped.
    pub fn new(points_m: Vec<Vector2<f64>>) -> Result<Self, CenterlineError> {
        let num_points = points_m.len();

        let mut points: Vec<Vector2<f64>> = Vec::with_capacity(num_points);
        let mut s_m = Vec::with_capacity(num_points);

        for p in points_m {
            match points.last() {
                None => s_m.push(0.0),
                Some(last) => {
                    let seg_len = (p - last).norm();
                    if seg_len <= std::f64::EPSILON {
                        continue;
                    }
                    s_m.push(s_m[s_m.len() - 1] + seg_len);
                }
            }
            points.push(p);
        }

        if num_points < 2 {
            return Err(CenterlineError::TooFewPoints(num_points));
        }
        if points.len() < 2 {
            return Err(CenterlineError::ZeroLength);
        }

        Ok(Self {
            points_m: points,
            s_m,
        })
    }

    /// Total arc length of the centerline.
    pub fn length_m(&self) -> f64 {
        self.s_m[self.s_m.len() - 1]
    }

    /// The points making up the centerline.
    pub fn points_m(&self) -> &[Vector2<f64>] {
        &self.points_m
    }

    /// Get the Cartesian position at arc length `s_m` offset by `rho_m` to the left of the
    /// centerline.
    ///
    /// Arc lengths before the start or past the end extrapolate along the first or last segment.
    pub fn point_at(&self, s_m: f64, rho_m: f64) -> Vector2<f64> {
        let seg = self.segment_index(s_m);

        let start = self.points_m[seg];
        let end = self.points_m[seg + 1];
        let seg_len = self.s_m[seg + 1] - self.s_m[seg];

        let dir = (end - start) / seg_len;
        let left = Vector2::new(-dir.y, dir.x);

        start + dir * (s_m - self.s_m[seg]) + left * rho_m
    }

    /// Heading of the centerline at arc length `s_m`, in radians from the +x axis.
    pub fn heading_at(&self, s_m: f64) -> f64 {
        let seg = self.segment_index(s_m);
        let d = self.points_m[seg + 1] - self.points_m[seg];
        d.y.atan2(d.x)
    }

    /// Index of the segment (start point index) containing the arc length, clamped to the first
    /// and last segments.
    fn segment_index(&self, s_m: f64) -> usize {
        let last_seg = self.points_m.len() - 2;

        // First point whose arc length is beyond s
        let upper = self.s_m.iter().position(|&s| s > s_m).unwrap_or(self.s_m.len());

        upper.saturating_sub(1).min(last_seg)
    }
}

impl std::convert::TryFrom<Vec<Vector2<f64>>> for Centerline {
    type Error = CenterlineError;

    fn try_from(points: Vec<Vector2<f64>>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Centerline> for Vec<Vector2<f64>> {
    fn from(c: Centerline) -> Self {
        c.points_m
    }
}
