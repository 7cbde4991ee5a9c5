use crate::simbox::SimBox;
use nalgebra::Vector3;

const EMPTY: usize = usize::MAX;

/// Uniform-grid spatial index over a periodic box. Particles are chained
/// per cell through `head`/`next`; neighbor cell lists (the cell itself plus
/// its wrapped adjacent cells, deduplicated) are precomputed at
/// construction. The cell layout is fixed for the lifetime of the index;
/// `build` re-populates it from a fresh point set.
#[derive(Debug)]
pub struct CellList {
    lengths: Vector3<f32>,
    num_cells: Vector3<usize>,
    head: Vec<usize>,
    next: Vec<usize>,
    neighbor_cells: Vec<Vec<usize>>,
}

impl CellList {
    pub fn new(simbox: &SimBox, width: f32) -> Self {
        let width = width.max(1.0e-6);
        let nx = ((simbox.lx() / width).floor() as usize).max(1);
        let ny = ((simbox.ly() / width).floor() as usize).max(1);
        let nz = ((simbox.lz() / width).floor() as usize).max(1);
        let num_cells = Vector3::new(nx, ny, nz);
        let total = nx * ny * nz;

        let mut neighbor_cells = Vec::with_capacity(total);
        for cz in 0..nz {
            for cy in 0..ny {
                for cx in 0..nx {
                    let mut neigh = Vec::with_capacity(27);
                    for dz in -1i64..=1 {
                        for dy in -1i64..=1 {
                            for dx in -1i64..=1 {
                                let wx = (cx as i64 + dx).rem_euclid(nx as i64) as usize;
                                let wy = (cy as i64 + dy).rem_euclid(ny as i64) as usize;
                                let wz = (cz as i64 + dz).rem_euclid(nz as i64) as usize;
                                neigh.push((wz * ny + wy) * nx + wx);
                            }
                        }
                    }
                    neigh.sort_unstable();
                    neigh.dedup();
                    neighbor_cells.push(neigh);
                }
            }
        }

        Self {
            lengths: Vector3::new(simbox.lx(), simbox.ly(), simbox.lz()),
            num_cells,
            head: vec![EMPTY; total],
            next: Vec::new(),
            neighbor_cells,
        }
    }

    /// Re-populate the index from a point set. Points outside the box are
    /// wrapped into it before binning.
    pub fn build(&mut self, points: &[Vector3<f32>]) {
        self.head.fill(EMPTY);
        self.next.clear();
        self.next.resize(points.len(), EMPTY);
        for (i, p) in points.iter().enumerate() {
            let cell = self.cell_of(p);
            self.next[i] = self.head[cell];
            self.head[cell] = i;
        }
    }

    fn axis_cell(coord: f32, length: f32, n: usize) -> usize {
        if n == 1 {
            return 0;
        }
        // fractional coordinate wrapped to [0, 1)
        let f = coord / length;
        let f = f - f.floor();
        ((f * n as f32) as usize).min(n - 1)
    }

    pub fn cell_of(&self, p: &Vector3<f32>) -> usize {
        let bx = Self::axis_cell(p.x, self.lengths.x, self.num_cells.x);
        let by = Self::axis_cell(p.y, self.lengths.y, self.num_cells.y);
        let bz = Self::axis_cell(p.z, self.lengths.z, self.num_cells.z);
        (bz * self.num_cells.y + by) * self.num_cells.x + bx
    }

    /// Neighbor cells of `cell`, including `cell` itself.
    pub fn neighbors(&self, cell: usize) -> &[usize] {
        &self.neighbor_cells[cell]
    }

    /// Iterate over the particle indices stored in `cell`.
    pub fn iter(&self, cell: usize) -> CellIter<'_> {
        CellIter {
            next: &self.next,
            current: self.head[cell],
        }
    }

    pub fn num_cells(&self) -> (usize, usize, usize) {
        (self.num_cells.x, self.num_cells.y, self.num_cells.z)
    }
}

pub struct CellIter<'a> {
    next: &'a [usize],
    current: usize,
}

impl Iterator for CellIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == EMPTY {
            return None;
        }
        let i = self.current;
        self.current = self.next[i];
        Some(i)
    }
}
