use crate::config;
use crate::error::{OrderError, OrderResult};
use crate::tensor::Tensor4;
use nalgebra::{Unit, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f32::consts::TAU;
use tracing::debug;

const MAX_ANNEALING_STEPS: u32 = 10_000;

/// Global cubatic order parameter estimator.
///
/// `compute` builds one rank-4 orientation tensor per particle, averages
/// them into a global tensor, and then anneals a trial orientation until its
/// idealized cubatic tensor matches the global tensor as well as the
/// stochastic search manages. The retained score is
/// `1 - |G - M(omega)|^2 / |M(omega)|^2` under the Frobenius inner product.
#[derive(Debug)]
pub struct CubaticOrderParameter {
    t_initial: f32,
    t_final: f32,
    scale: f32,
    gen_r4: Tensor4,
    rng: StdRng,
    n: usize,
    particle_tensors: Vec<Tensor4>,
    global_tensor: Tensor4,
    cubatic_tensor: Tensor4,
    cubatic_orientation: UnitQuaternion<f32>,
    order_parameter: f32,
}

/// `2 * sum_k outer4(rotate(q, e_k))` over the three world basis vectors.
/// The generator subtraction happens at the aggregate level.
fn orientation_tensor(q: &UnitQuaternion<f32>) -> Tensor4 {
    let mut m = Tensor4::zeros();
    for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
        m += Tensor4::outer(&q.transform_vector(&axis));
    }
    m * 2.0
}

fn score_against(global: &Tensor4, cubatic: &Tensor4) -> f32 {
    let diff = *global - *cubatic;
    1.0 - diff.dot(&diff) / cubatic.dot(cubatic)
}

impl CubaticOrderParameter {
    pub fn new(t_initial: f32, t_final: f32, scale: f32, gen_r4: Tensor4) -> OrderResult<Self> {
        Self::with_rng(t_initial, t_final, scale, gen_r4, StdRng::from_entropy())
    }

    /// Deterministic variant for reproducible runs; the annealer owns the
    /// stream, nothing else draws from it.
    pub fn with_seed(
        t_initial: f32,
        t_final: f32,
        scale: f32,
        gen_r4: Tensor4,
        seed: u64,
    ) -> OrderResult<Self> {
        Self::with_rng(t_initial, t_final, scale, gen_r4, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        t_initial: f32,
        t_final: f32,
        scale: f32,
        gen_r4: Tensor4,
        rng: StdRng,
    ) -> OrderResult<Self> {
        if t_initial <= t_final {
            return Err(OrderError::Config(
                "t_initial must be greater than t_final".into(),
            ));
        }
        if t_final <= 1.0e-6 {
            return Err(OrderError::Config("t_final must be greater than 1e-6".into()));
        }
        if !(0.0..=1.0).contains(&scale) {
            return Err(OrderError::Config("scale must be between 0 and 1".into()));
        }
        Ok(Self {
            t_initial,
            t_final,
            scale,
            gen_r4,
            rng,
            n: 0,
            particle_tensors: Vec::new(),
            global_tensor: Tensor4::zeros(),
            cubatic_tensor: Tensor4::zeros(),
            cubatic_orientation: UnitQuaternion::identity(),
            order_parameter: 0.0,
        })
    }

    /// Uniform axis on the unit sphere, forced to unit norm.
    fn random_axis(&mut self) -> Unit<Vector3<f32>> {
        let theta = self.rng.gen::<f32>() * TAU;
        let phi = (2.0 * self.rng.gen::<f32>() - 1.0).acos();
        Unit::new_normalize(Vector3::new(
            theta.cos() * phi.sin(),
            theta.sin() * phi.sin(),
            phi.cos(),
        ))
    }

    fn cubatic_tensor_for(&self, orientation: &UnitQuaternion<f32>) -> Tensor4 {
        orientation_tensor(orientation) - self.gen_r4
    }

    pub fn compute(&mut self, orientations: &[UnitQuaternion<f32>]) -> OrderResult<()> {
        if orientations.is_empty() {
            return Err(OrderError::Shape("orientations must not be empty".into()));
        }
        let n = orientations.len();
        let parallel = n >= config::get_parallel_threshold();

        // per-particle tensors: one row per particle, one writer per row
        self.particle_tensors = if parallel {
            orientations.par_iter().map(orientation_tensor).collect()
        } else {
            orientations.iter().map(orientation_tensor).collect()
        };

        // global tensor: column mean, one writer per tensor index
        let rows = &self.particle_tensors;
        let n_inv = 1.0 / n as f32;
        let mean_at = |k: usize| rows.iter().map(|t| t.as_slice()[k]).sum::<f32>() * n_inv;
        let mut global = [0.0f32; 81];
        if parallel {
            let values: Vec<f32> = (0..81).into_par_iter().map(mean_at).collect();
            global.copy_from_slice(&values);
        } else {
            for (k, slot) in global.iter_mut().enumerate() {
                *slot = mean_at(k);
            }
        }
        self.global_tensor = Tensor4::from_array(global) - self.gen_r4;

        let gen_r4 = self.gen_r4;
        if parallel {
            self.particle_tensors
                .par_iter_mut()
                .for_each(|t| *t -= gen_r4);
        } else {
            for t in &mut self.particle_tensors {
                *t -= gen_r4;
            }
        }

        self.n = n;
        self.anneal()
    }

    fn anneal(&mut self) -> OrderResult<()> {
        // random starting orientation
        let axis = self.random_axis();
        let angle = self.rng.gen::<f32>() * TAU;
        let mut orientation = UnitQuaternion::from_axis_angle(&axis, angle);
        let mut tensor = self.cubatic_tensor_for(&orientation);
        let mut score = score_against(&self.global_tensor, &tensor);
        if score.is_nan() {
            return Err(OrderError::Numeric("cubatic score is NaN".into()));
        }

        let mut t_current = self.t_initial;
        let mut steps = 0u32;
        while t_current > self.t_final && steps < MAX_ANNEALING_STEPS {
            steps += 1;
            let axis = self.random_axis();
            let angle = 0.1 * self.rng.gen::<f32>() * TAU;
            let candidate = UnitQuaternion::from_axis_angle(&axis, angle) * orientation;
            let candidate_tensor = self.cubatic_tensor_for(&candidate);
            let candidate_score = score_against(&self.global_tensor, &candidate_tensor);
            if candidate_score.is_nan() {
                return Err(OrderError::Numeric("cubatic score is NaN".into()));
            }

            let accepted = if candidate_score > score {
                true
            } else {
                let boltzmann = (-(score - candidate_score) / t_current).exp();
                boltzmann >= self.rng.gen::<f32>()
            };
            // rejected proposals do not advance the temperature
            if accepted {
                orientation = candidate;
                tensor = candidate_tensor;
                score = candidate_score;
                t_current *= self.scale;
            }
        }

        debug!(
            n = self.n,
            steps,
            score,
            "cubatic annealing finished"
        );
        self.cubatic_orientation = orientation;
        self.cubatic_tensor = tensor;
        self.order_parameter = score;
        Ok(())
    }

    pub fn order_parameter(&self) -> f32 {
        self.order_parameter
    }

    pub fn cubatic_orientation(&self) -> UnitQuaternion<f32> {
        self.cubatic_orientation
    }

    pub fn cubatic_tensor(&self) -> &Tensor4 {
        &self.cubatic_tensor
    }

    pub fn global_tensor(&self) -> &Tensor4 {
        &self.global_tensor
    }

    /// One generator-subtracted tensor per particle, in input order.
    pub fn particle_tensors(&self) -> &[Tensor4] {
        &self.particle_tensors
    }

    pub fn generator_tensor(&self) -> &Tensor4 {
        &self.gen_r4
    }

    pub fn num_particles(&self) -> usize {
        self.n
    }
}
