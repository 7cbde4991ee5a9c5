use nalgebra::Vector3;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Rank-4 tensor over 3D space, stored as a flat 81-element array indexed
/// `((i*3 + j)*3 + k)*3 + l`. A plain stack value: the arithmetic here sits
/// in the hot path of the cubatic kernels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tensor4([f32; 81]);

impl Tensor4 {
    pub fn zeros() -> Self {
        Self([0.0; 81])
    }

    pub fn from_array(values: [f32; 81]) -> Self {
        Self(values)
    }

    /// Fourth outer power of a vector: `T[i,j,k,l] = v_i v_j v_k v_l`.
    pub fn outer(v: &Vector3<f32>) -> Self {
        let c = [v.x, v.y, v.z];
        let mut t = [0.0f32; 81];
        let mut n = 0;
        for &vi in &c {
            for &vj in &c {
                for &vk in &c {
                    for &vl in &c {
                        t[n] = vi * vj * vk * vl;
                        n += 1;
                    }
                }
            }
        }
        Self(t)
    }

    /// The isotropic rank-4 generator
    /// `(2/5) * (d_ij d_kl + d_ik d_jl + d_il d_jk)`, the usual reference
    /// subtracted from orientation tensors so that the cubatic score
    /// measures anisotropy above isotropic.
    pub fn isotropic() -> Self {
        let mut t = [0.0f32; 81];
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    for l in 0..3 {
                        let d = u32::from(i == j && k == l)
                            + u32::from(i == k && j == l)
                            + u32::from(i == l && j == k);
                        t[((i * 3 + j) * 3 + k) * 3 + l] = 0.4 * d as f32;
                    }
                }
            }
        }
        Self(t)
    }

    /// Frobenius inner product.
    pub fn dot(&self, other: &Self) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn get(&self, i: usize, j: usize, k: usize, l: usize) -> f32 {
        self.0[((i * 3 + j) * 3 + k) * 3 + l]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl Add for Tensor4 {
    type Output = Tensor4;

    fn add(mut self, rhs: Tensor4) -> Tensor4 {
        for n in 0..81 {
            self.0[n] += rhs.0[n];
        }
        self
    }
}

impl AddAssign for Tensor4 {
    fn add_assign(&mut self, rhs: Tensor4) {
        for n in 0..81 {
            self.0[n] += rhs.0[n];
        }
    }
}

impl Sub for Tensor4 {
    type Output = Tensor4;

    fn sub(mut self, rhs: Tensor4) -> Tensor4 {
        for n in 0..81 {
            self.0[n] -= rhs.0[n];
        }
        self
    }
}

impl SubAssign for Tensor4 {
    fn sub_assign(&mut self, rhs: Tensor4) {
        for n in 0..81 {
            self.0[n] -= rhs.0[n];
        }
    }
}

impl Mul<f32> for Tensor4 {
    type Output = Tensor4;

    fn mul(mut self, rhs: f32) -> Tensor4 {
        for n in 0..81 {
            self.0[n] *= rhs;
        }
        self
    }
}
