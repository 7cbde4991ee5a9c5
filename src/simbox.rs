use crate::error::{OrderError, OrderResult};
use nalgebra::Vector3;

/// Orthorhombic periodic box. 2D boxes have no z extent and leave the z
/// component of displacements untouched when wrapping.
#[derive(Clone, Copy, Debug)]
pub struct SimBox {
    lengths: Vector3<f32>,
    is_2d: bool,
}

impl SimBox {
    pub fn new(lx: f32, ly: f32, lz: f32) -> OrderResult<Self> {
        if lx <= 0.0 || ly <= 0.0 || lz <= 0.0 {
            return Err(OrderError::Config("box lengths must be positive".into()));
        }
        Ok(Self {
            lengths: Vector3::new(lx, ly, lz),
            is_2d: false,
        })
    }

    pub fn new_2d(lx: f32, ly: f32) -> OrderResult<Self> {
        if lx <= 0.0 || ly <= 0.0 {
            return Err(OrderError::Config("box lengths must be positive".into()));
        }
        Ok(Self {
            lengths: Vector3::new(lx, ly, 0.0),
            is_2d: true,
        })
    }

    pub fn cubic(l: f32) -> OrderResult<Self> {
        Self::new(l, l, l)
    }

    pub fn lx(&self) -> f32 {
        self.lengths.x
    }

    pub fn ly(&self) -> f32 {
        self.lengths.y
    }

    pub fn lz(&self) -> f32 {
        self.lengths.z
    }

    pub fn is_2d(&self) -> bool {
        self.is_2d
    }

    /// Minimum-image convention applied per axis.
    pub fn wrap(&self, v: Vector3<f32>) -> Vector3<f32> {
        let mut dx = v.x;
        let mut dy = v.y;
        let mut dz = v.z;
        dx -= (dx / self.lengths.x).round() * self.lengths.x;
        dy -= (dy / self.lengths.y).round() * self.lengths.y;
        if !self.is_2d {
            dz -= (dz / self.lengths.z).round() * self.lengths.z;
        }
        Vector3::new(dx, dy, dz)
    }
}
