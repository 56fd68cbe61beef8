//! Minimal 3D vector math: [`Vec3`] and the axis-aligned box [`Aabb`].

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point or displacement in simulation space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Construct from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Components as an array, in `x, y, z` order.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product.
    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared Euclidean length.
    pub fn norm_sq(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// Squared distance to `other`.
    pub fn distance_sq(self, other: Vec3) -> f64 {
        (self - other).norm_sq()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Vec3> {
        let n = self.norm();
        if n > 0.0 && n.is_finite() {
            Some(self * (1.0 / n))
        } else {
            None
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
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
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

/// Axis-aligned bounding box, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Lower corner.
    pub min: Vec3,
    /// Upper corner.
    pub max: Vec3,
}

impl Aabb {
    /// Construct from corners. Does not validate ordering; see
    /// [`is_valid`](Self::is_valid).
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A cube spanning `[lo, hi]` on every axis.
    pub const fn cube(lo: f64, hi: f64) -> Self {
        Self::new(Vec3::new(lo, lo, lo), Vec3::new(hi, hi, hi))
    }

    /// Finite corners with `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    /// Whether `p` lies inside the box (boundary included).
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// The closest point to `p` inside the box.
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert_eq!(b - a, Vec3::new(3.0, 4.0, 0.0));
        assert_eq!((b - a).norm(), 5.0);
        assert_eq!(a.distance_sq(b), 25.0);
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a + a, Vec3::ZERO);
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(Vec3::ZERO.normalized().is_none());
        let n = Vec3::new(0.0, 0.0, 2.0).normalized().unwrap();
        assert_eq!(n, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn aabb_clamp_and_contains() {
        let b = Aabb::cube(0.0, 10.0);
        assert!(b.is_valid());
        assert!(b.contains(Vec3::new(10.0, 0.0, 5.0)));
        assert!(!b.contains(Vec3::new(-0.1, 0.0, 5.0)));
        assert_eq!(b.clamp(Vec3::new(-3.0, 12.0, 4.0)), Vec3::new(0.0, 10.0, 4.0));
    }

    #[test]
    fn inverted_box_is_invalid() {
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        assert!(!b.is_valid());
    }

    use proptest::prelude::*;

    fn arb_vec3() -> impl Strategy<Value = Vec3> {
        (-1e3f64..1e3, -1e3f64..1e3, -1e3f64..1e3).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn clamp_lands_inside_and_is_idempotent(p in arb_vec3(), lo in -50.0f64..0.0, hi in 0.0f64..50.0) {
            let b = Aabb::cube(lo, hi);
            let c = b.clamp(p);
            prop_assert!(b.contains(c));
            prop_assert_eq!(b.clamp(c), c);
            if b.contains(p) {
                prop_assert_eq!(c, p);
            }
        }

        #[test]
        fn normalized_has_unit_length(p in arb_vec3()) {
            if let Some(n) = p.normalized() {
                prop_assert!((n.norm() - 1.0).abs() < 1e-9);
            }
        }
    }
}
