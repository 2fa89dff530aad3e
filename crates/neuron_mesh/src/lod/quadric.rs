//! Quadric error metric.
//!
//! A quadric stores `Q(p) = pᵀ A p + 2 bᵀ p + c`, the sum of squared
//! distances from `p` to a set of planes. Summing quadrics unions their plane
//! sets.

use std::ops::{Add, AddAssign};

use glam::{DMat3, DVec3};

/// Determinant below which the optimal-point system is treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadric {
  a: DMat3,
  b: DVec3,
  c: f64,
}

impl Default for Quadric {
  fn default() -> Self {
    Self::ZERO
  }
}

impl Quadric {
  pub const ZERO: Self = Self {
    a: DMat3::ZERO,
    b: DVec3::ZERO,
    c: 0.0,
  };

  /// Squared distance to the plane `normal · p + d = 0`, scaled by `weight`.
  ///
  /// `normal` must be unit length.
  pub fn from_plane(normal: DVec3, d: f64, weight: f64) -> Self {
    let n = normal;
    let a = DMat3::from_cols(n * n.x, n * n.y, n * n.z);
    Self {
      a: a * weight,
      b: n * (d * weight),
      c: d * d * weight,
    }
  }

  /// Plane through `point` with the given unit `normal`.
  pub fn from_point_normal(point: DVec3, normal: DVec3, weight: f64) -> Self {
    Self::from_plane(normal, -normal.dot(point), weight)
  }

  /// Error at `p`.
  #[inline]
  pub fn evaluate(&self, p: DVec3) -> f64 {
    p.dot(self.a * p) + 2.0 * self.b.dot(p) + self.c
  }

  /// Point minimizing the error, if the system is well conditioned.
  pub fn minimizer(&self) -> Option<DVec3> {
    if self.a.determinant().abs() < SINGULAR_EPSILON {
      return None;
    }
    let p = self.a.inverse() * -self.b;
    p.is_finite().then_some(p)
  }
}

impl Add for Quadric {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      a: self.a + rhs.a,
      b: self.b + rhs.b,
      c: self.c + rhs.c,
    }
  }
}

impl AddAssign for Quadric {
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

#[cfg(test)]
#[path = "quadric_test.rs"]
mod quadric_test;
