use crate::config;
use crate::error::{OrderError, OrderResult};
use crate::grid::HistogramGrid;
use crate::search::CellList;
use crate::simbox::SimBox;
use nalgebra::{UnitQuaternion, Vector3};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

// per-axis squared-component threshold below which a pair is treated as the
// same particle and skipped
const COINCIDENT_EPS: f32 = 1.0e-6;

/// Anisotropic 3D pair-correlation accumulator.
///
/// For every reference/target pair, the minimum-image displacement is
/// rotated into the reference particle's body frame (conjugate of the
/// reference orientation, then the per-reference extra twist) and binned on
/// a fixed rectilinear grid. Counts accumulate across `compute` calls until
/// `reset`; turning them into a PMF is the caller's job.
#[derive(Debug)]
pub struct PmftXyz {
    simbox: SimBox,
    grid: HistogramGrid,
    counts: Vec<AtomicU32>,
    cells: Option<CellList>,
}

fn cutoff_fits_cells(simbox: &SimBox, r_max: f32) -> bool {
    let mut l_min = simbox.lx().min(simbox.ly());
    if !simbox.is_2d() {
        l_min = l_min.min(simbox.lz());
    }
    r_max < l_min / 3.0
}

impl PmftXyz {
    pub fn new(
        simbox: SimBox,
        max_x: f32,
        max_y: f32,
        max_z: f32,
        dx: f32,
        dy: f32,
        dz: f32,
    ) -> OrderResult<Self> {
        let grid = HistogramGrid::new(&simbox, max_x, max_y, max_z, dx, dy, dz)?;
        let counts = (0..grid.len()).map(|_| AtomicU32::new(0)).collect();
        let r_max = grid.half_extents().norm();
        let cells = cutoff_fits_cells(&simbox, r_max).then(|| CellList::new(&simbox, r_max));
        Ok(Self {
            simbox,
            grid,
            counts,
            cells,
        })
    }

    /// Whether pair search runs through the cell list rather than the
    /// direct O(N_ref * N_p) loop.
    pub fn use_cells(&self) -> bool {
        self.cells.is_some()
    }

    /// Bin all reference/target pairs into the histogram.
    ///
    /// `orientations` describes the targets and is accepted for interface
    /// symmetry only; binning uses the reference orientation and the
    /// per-reference extra twist. Pairs falling outside the grid and
    /// coincident pairs are dropped silently.
    pub fn compute(
        &mut self,
        ref_points: &[Vector3<f32>],
        ref_orientations: &[UnitQuaternion<f32>],
        points: &[Vector3<f32>],
        orientations: &[UnitQuaternion<f32>],
        extra_orientations: &[UnitQuaternion<f32>],
    ) -> OrderResult<()> {
        if ref_orientations.len() != ref_points.len() {
            return Err(OrderError::Shape(
                "ref_orientations length must match ref_points".into(),
            ));
        }
        if extra_orientations.len() != ref_points.len() {
            return Err(OrderError::Shape(
                "extra_orientations length must match ref_points".into(),
            ));
        }
        if orientations.len() != points.len() {
            return Err(OrderError::Shape(
                "orientations length must match points".into(),
            ));
        }

        let n_ref = ref_points.len();
        debug!(
            n_ref,
            n_points = points.len(),
            cells = self.use_cells(),
            "binning pair displacements"
        );

        if let Some(cells) = self.cells.as_mut() {
            cells.build(points);
        }

        let simbox = &self.simbox;
        let grid = &self.grid;
        let counts = &self.counts;

        let deposit = |i: usize, j: usize| {
            let delta = simbox.wrap(ref_points[i] - points[j]);
            if delta.x * delta.x < COINCIDENT_EPS
                && delta.y * delta.y < COINCIDENT_EPS
                && delta.z * delta.z < COINCIDENT_EPS
            {
                return;
            }
            let v = ref_orientations[i].inverse_transform_vector(&delta);
            let v = extra_orientations[i].transform_vector(&v);
            if let Some(idx) = grid.bin_index(&v) {
                counts[idx].fetch_add(1, Ordering::Relaxed);
            }
        };

        let parallel = n_ref >= config::get_parallel_threshold();
        match self.cells.as_ref() {
            Some(cells) => {
                let kernel = |i: usize| {
                    let home = cells.cell_of(&ref_points[i]);
                    for &neigh in cells.neighbors(home) {
                        for j in cells.iter(neigh) {
                            deposit(i, j);
                        }
                    }
                };
                if parallel {
                    (0..n_ref).into_par_iter().for_each(kernel);
                } else {
                    (0..n_ref).for_each(kernel);
                }
            }
            None => {
                let kernel = |i: usize| {
                    for j in 0..points.len() {
                        deposit(i, j);
                    }
                };
                if parallel {
                    (0..n_ref).into_par_iter().for_each(kernel);
                } else {
                    (0..n_ref).for_each(kernel);
                }
            }
        }
        Ok(())
    }

    /// Zero the histogram; bin geometry and the cell layout are kept.
    pub fn reset(&mut self) {
        for c in &self.counts {
            c.store(0, Ordering::Relaxed);
        }
    }

    /// Snapshot of the histogram, laid out `z * nx * ny + y * nx + x`.
    pub fn counts(&self) -> Vec<u32> {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    pub fn nbins(&self) -> (usize, usize, usize) {
        self.grid.nbins()
    }

    pub fn x_centers(&self) -> &[f32] {
        self.grid.x_centers()
    }

    pub fn y_centers(&self) -> &[f32] {
        self.grid.y_centers()
    }

    pub fn z_centers(&self) -> &[f32] {
        self.grid.z_centers()
    }

    pub fn simbox(&self) -> &SimBox {
        &self.simbox
    }
}
