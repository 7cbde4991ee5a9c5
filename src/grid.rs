use crate::error::{OrderError, OrderResult};
use crate::simbox::SimBox;
use nalgebra::Vector3;

/// Rectilinear 3D histogram grid centered on the origin, with independent
/// step sizes and half-extents per axis. Bins are laid out
/// `z * nx * ny + y * nx + x`.
#[derive(Clone, Debug)]
pub struct HistogramGrid {
    max: Vector3<f32>,
    step: Vector3<f32>,
    nbins: [usize; 3],
    x_centers: Vec<f32>,
    y_centers: Vec<f32>,
    z_centers: Vec<f32>,
}

fn centers(max: f32, step: f32, n: usize) -> Vec<f32> {
    (0..n).map(|i| -max + (i as f32 + 0.5) * step).collect()
}

impl HistogramGrid {
    pub fn new(
        simbox: &SimBox,
        max_x: f32,
        max_y: f32,
        max_z: f32,
        dx: f32,
        dy: f32,
        dz: f32,
    ) -> OrderResult<Self> {
        if dx <= 0.0 || dy <= 0.0 || dz <= 0.0 {
            return Err(OrderError::Config("grid steps must be positive".into()));
        }
        if dx > max_x || dy > max_y || dz > max_z {
            return Err(OrderError::Config(
                "grid step must not exceed the half-extent on any axis".into(),
            ));
        }
        if max_x > simbox.lx() / 2.0 || max_y > simbox.ly() / 2.0 {
            return Err(OrderError::Config(
                "half-extents must be at most half the box length".into(),
            ));
        }
        if max_z > simbox.lz() / 2.0 && !simbox.is_2d() {
            return Err(OrderError::Config(
                "z half-extent must be at most half the box length".into(),
            ));
        }

        let nx = 2 * (max_x / dx).floor() as usize;
        let ny = 2 * (max_y / dy).floor() as usize;
        let nz = 2 * (max_z / dz).floor() as usize;

        Ok(Self {
            max: Vector3::new(max_x, max_y, max_z),
            step: Vector3::new(dx, dy, dz),
            nbins: [nx, ny, nz],
            x_centers: centers(max_x, dx, nx),
            y_centers: centers(max_y, dy, ny),
            z_centers: centers(max_z, dz, nz),
        })
    }

    pub fn nbins(&self) -> (usize, usize, usize) {
        (self.nbins[0], self.nbins[1], self.nbins[2])
    }

    pub fn len(&self) -> usize {
        self.nbins[0] * self.nbins[1] * self.nbins[2]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn half_extents(&self) -> Vector3<f32> {
        self.max
    }

    pub fn x_centers(&self) -> &[f32] {
        &self.x_centers
    }

    pub fn y_centers(&self) -> &[f32] {
        &self.y_centers
    }

    pub fn z_centers(&self) -> &[f32] {
        &self.z_centers
    }

    /// Flat bin index for a displacement already rotated into the reference
    /// body frame, or `None` when the point falls outside the grid. Floored
    /// bin coordinates are checked on both sides before the cast; a float
    /// cast in Rust saturates instead of wrapping, so the negative side
    /// needs its own test.
    pub fn bin_index(&self, v: &Vector3<f32>) -> Option<usize> {
        let bx = ((v.x + self.max.x) / self.step.x).floor();
        let by = ((v.y + self.max.y) / self.step.y).floor();
        let bz = ((v.z + self.max.z) / self.step.z).floor();
        if bx < 0.0 || by < 0.0 || bz < 0.0 {
            return None;
        }
        let (bx, by, bz) = (bx as usize, by as usize, bz as usize);
        let [nx, ny, nz] = self.nbins;
        if bx >= nx || by >= ny || bz >= nz {
            return None;
        }
        Some((bz * ny + by) * nx + bx)
    }
}
