use std::{fmt::Display, iter::Sum};

use auto_ops::impl_op_ex;
use serde::{Deserialize, Serialize};

/// A Cartesian three-vector, typically the momentum part of a [`Vec4`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// The x-component
    pub x: f64,
    /// The y-component
    pub y: f64,
    /// The z-component
    pub z: f64,
}

impl Vec3 {
    /// Create a new [`Vec3`] from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
    /// Promote this momentum to a four-momentum of a particle with the given `mass`.
    pub fn with_mass(&self, mass: f64) -> Vec4 {
        let e = (mass.powi(2) + self.mag2()).sqrt();
        Vec4::new(self.x, self.y, self.z, e)
    }
    /// The dot product with another [`Vec3`].
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
    /// The squared magnitude.
    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }
    /// The magnitude.
    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }
    /// The magnitude of the component transverse to the $`z`$-axis (the beam axis).
    pub fn rho(&self) -> f64 {
        self.x.hypot(self.y)
    }
    /// The azimuthal angle in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
    /// The pseudorapidity $`\eta = \sinh^{-1}(p_z / p_T)`$.
    ///
    /// Vectors along the beam axis have infinite pseudorapidity (with the sign of $`z`$) and the
    /// zero vector is assigned $`\eta = 0`$.
    pub fn eta(&self) -> f64 {
        let rho = self.rho();
        if rho == 0.0 {
            if self.z == 0.0 {
                0.0
            } else {
                f64::INFINITY.copysign(self.z)
            }
        } else {
            (self.z / rho).asinh()
        }
    }
    fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
    fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { a.add(b) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { a.sub(b) });

/// A four-momentum $`(p_x, p_y, p_z; E)`$.
///
/// Four-momenta are plain values: adding two of them returns a new [`Vec4`] and leaves both
/// operands untouched, and a sequence of them can be reduced with [`Sum`] starting from
/// [`Vec4::zero`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// The x-component of the momentum
    pub x: f64,
    /// The y-component of the momentum
    pub y: f64,
    /// The z-component of the momentum
    pub z: f64,
    /// The energy
    pub t: f64,
}

impl Vec4 {
    /// Create a new [`Vec4`] from momentum components and energy.
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self {
            x: px,
            y: py,
            z: pz,
            t: e,
        }
    }
    /// The neutral element of four-momentum addition.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
    /// Build a four-momentum from collider coordinates: transverse momentum, pseudorapidity,
    /// azimuthal angle, and mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        Vec3::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh()).with_mass(m)
    }
    /// The x-component of the momentum
    pub fn px(&self) -> f64 {
        self.x
    }
    /// The y-component of the momentum
    pub fn py(&self) -> f64 {
        self.y
    }
    /// The z-component of the momentum
    pub fn pz(&self) -> f64 {
        self.z
    }
    /// The energy
    pub fn e(&self) -> f64 {
        self.t
    }
    /// The momentum three-vector
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
    /// The squared invariant mass $`E^2 - |\vec{p}|^2`$.
    pub fn m2(&self) -> f64 {
        self.e().powi(2) - self.vec3().mag2()
    }
    /// The invariant mass.
    ///
    /// A negative $`m^2`$ (which arises from rounding on light-like vectors) is reported as
    /// $`-\sqrt{-m^2}`$ instead of `NaN`.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }
    /// The transverse momentum $`p_T = \sqrt{p_x^2 + p_y^2}`$.
    pub fn pt(&self) -> f64 {
        self.vec3().rho()
    }
    /// The pseudorapidity of the momentum, see [`Vec3::eta`].
    pub fn eta(&self) -> f64 {
        self.vec3().eta()
    }
    /// The azimuthal angle of the momentum.
    pub fn phi(&self) -> f64 {
        self.vec3().phi()
    }
    /// A compact string of the energy and momentum components.
    pub fn to_p4_string(&self) -> String {
        format!(
            "[e = {:.5}; p = ({:.5}, {:.5}, {:.5})]",
            self.e(),
            self.px(),
            self.py(),
            self.pz()
        )
    }
    fn add(&self, other: &Self) -> Self {
        Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.t + other.t,
        )
    }
    fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.t - other.t,
        )
    }
    fn neg(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.t)
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { a.add(b) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { a.sub(b) });
impl_op_ex!(-|a: &Vec4| -> Vec4 { a.neg() });

impl Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vec4::zero(), |acc, p4| acc + p4)
    }
}

impl<'a> Sum<&'a Vec4> for Vec4 {
    fn sum<I: Iterator<Item = &'a Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::zero(), |acc, p4| acc + p4)
    }
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_p4_string())
    }
}
