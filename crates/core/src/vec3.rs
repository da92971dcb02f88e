//! Small 3D vector toolkit used by the trace and motion path code.
//!
//! Positions coming out of a trace are plain `(x, y, z)` triples, so the
//! helpers here are free functions over [`Vec3`]. Comparison helpers take
//! `Option<&Vec3>` because the squeeze pass compares against "the previous
//! retained point", which does not exist for the first waypoint.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        add(&self, &rhs)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        scale(&self, rhs)
    }
}

pub fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

pub fn scale(v: &Vec3, s: f64) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

/// Component-wise product.
pub fn component_mult(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(a.x * b.x, a.y * b.y, a.z * b.z)
}

pub fn length_squared(v: &Vec3) -> f64 {
    v.x * v.x + v.y * v.y + v.z * v.z
}

pub fn length(v: &Vec3) -> f64 {
    length_squared(v).sqrt()
}

pub fn distance_squared(a: &Vec3, b: &Vec3) -> f64 {
    length_squared(&(*a - *b))
}

pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    distance_squared(a, b).sqrt()
}

pub fn component_min(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
}

pub fn component_max(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
}

/// Exact equality. Two absent values are equal, one absent value is not.
pub fn equals(a: Option<&Vec3>, b: Option<&Vec3>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.x == b.x && a.y == b.y && a.z == b.z,
        _ => false,
    }
}

/// Build a comparator that treats vectors closer than `tolerance` as equal.
///
/// Absent values are handled the same way as [`equals`].
pub fn delta_equals(tolerance: f64) -> impl Fn(Option<&Vec3>, Option<&Vec3>) -> bool {
    let tolerance_squared = tolerance * tolerance;
    move |a, b| match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => distance_squared(a, b) < tolerance_squared,
        _ => false,
    }
}
