use nalgebra::{UnitQuaternion, Vector3};
use orderparam_rs::{OrderError, PmftXyz, SimBox};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::FRAC_PI_2;

fn identities(n: usize) -> Vec<UnitQuaternion<f32>> {
    vec![UnitQuaternion::identity(); n]
}

fn flat_index(nbins: (usize, usize, usize), bx: usize, by: usize, bz: usize) -> usize {
    (bz * nbins.1 + by) * nbins.0 + bx
}

#[test]
fn test_single_pair_no_rotation() {
    let b = SimBox::cubic(10.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();
    assert!(!pmft.use_cells());

    let refs = vec![Vector3::new(0.0, 0.0, 0.0)];
    let points = vec![Vector3::new(1.0, 0.0, 0.0)];
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();

    let counts = pmft.counts();
    let nbins = pmft.nbins();
    assert_eq!(nbins, (8, 8, 8));
    // delta = ref - point = (-1, 0, 0) shifts to (1, 2, 2) -> bin (2, 4, 4)
    assert_eq!(counts[flat_index(nbins, 2, 4, 4)], 1);
    assert_eq!(counts.iter().sum::<u32>(), 1);
}

#[test]
fn test_reference_orientation_rotates_into_body_frame() {
    let b = SimBox::cubic(10.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();

    let refs = vec![Vector3::new(0.0, 0.0, 0.0)];
    let points = vec![Vector3::new(1.1, 0.3, 0.0)];
    let ref_q = vec![UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2)];
    pmft.compute(&refs, &ref_q, &points, &identities(1), &identities(1))
        .unwrap();

    // delta = (-1.1, -0.3, 0); the conjugate of a +90 degree z rotation
    // takes it to (-0.3, 1.1, 0) -> bin (3, 6, 4)
    let counts = pmft.counts();
    let nbins = pmft.nbins();
    assert_eq!(counts[flat_index(nbins, 3, 6, 4)], 1);
    assert_eq!(counts.iter().sum::<u32>(), 1);
}

#[test]
fn test_extra_orientation_applies_after_conjugate() {
    let b = SimBox::cubic(10.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();

    let refs = vec![Vector3::new(0.0, 0.0, 0.0)];
    let points = vec![Vector3::new(1.1, 0.3, 0.0)];
    let extra = vec![UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2)];
    pmft.compute(&refs, &identities(1), &points, &identities(1), &extra)
        .unwrap();

    // delta = (-1.1, -0.3, 0) twisted by +90 degrees about z gives
    // (0.3, -1.1, 0) -> bin (4, 1, 4)
    let counts = pmft.counts();
    let nbins = pmft.nbins();
    assert_eq!(counts[flat_index(nbins, 4, 1, 4)], 1);
    assert_eq!(counts.iter().sum::<u32>(), 1);
}

#[test]
fn test_periodic_wrap_uses_minimum_image() {
    let b = SimBox::cubic(10.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();

    let refs = vec![Vector3::new(4.9, 0.0, 0.0)];
    let points = vec![Vector3::new(-4.9, 0.0, 0.0)];
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();

    // raw separation 9.8 wraps to -0.2, not the bare difference
    let counts = pmft.counts();
    let nbins = pmft.nbins();
    assert_eq!(counts[flat_index(nbins, 3, 4, 4)], 1);
    assert_eq!(counts.iter().sum::<u32>(), 1);
}

#[test]
fn test_self_contribution_is_excluded() {
    let b = SimBox::cubic(10.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();

    let pts = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
    pmft.compute(&pts, &identities(2), &pts, &identities(2), &identities(2))
        .unwrap();

    let counts = pmft.counts();
    let nbins = pmft.nbins();
    // each particle sees only the other one
    assert_eq!(counts[flat_index(nbins, 2, 4, 4)], 1);
    assert_eq!(counts[flat_index(nbins, 6, 4, 4)], 1);
    assert_eq!(counts.iter().sum::<u32>(), 2);
}

#[test]
fn test_global_rotation_leaves_histogram_invariant() {
    let b = SimBox::cubic(10.0).unwrap();
    let q_global = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
    let ref_q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);

    let refs = vec![Vector3::new(5.0, 5.0, 5.0)];
    let points = vec![
        Vector3::new(5.7, 5.3, 5.2),
        Vector3::new(4.6, 5.9, 5.4),
        Vector3::new(5.2, 4.8, 5.6),
    ];

    let mut plain = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();
    plain
        .compute(&refs, &[ref_q], &points, &identities(3), &identities(1))
        .unwrap();

    let rot_refs: Vec<_> = refs.iter().map(|p| q_global.transform_vector(p)).collect();
    let rot_points: Vec<_> = points.iter().map(|p| q_global.transform_vector(p)).collect();
    let mut rotated = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();
    rotated
        .compute(
            &rot_refs,
            &[q_global * ref_q],
            &rot_points,
            &identities(3),
            &identities(1),
        )
        .unwrap();

    assert_eq!(plain.counts(), rotated.counts());
    assert_eq!(plain.counts().iter().sum::<u32>(), 3);
}

#[test]
fn test_cell_list_matches_direct_kernel() {
    // identical point cloud, grid, and pair set; only the box size flips
    // the kernel-selection heuristic
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<Vector3<f32>> = (0..200)
        .map(|_| {
            Vector3::new(
                0.2 + rng.gen::<f32>() * 1.5,
                0.2 + rng.gen::<f32>() * 1.5,
                0.2 + rng.gen::<f32>() * 1.5,
            )
        })
        .collect();
    let quats = identities(points.len());

    let tight = SimBox::cubic(4.0).unwrap();
    let mut direct = PmftXyz::new(tight, 1.0, 1.0, 1.0, 0.25, 0.25, 0.25).unwrap();
    assert!(!direct.use_cells());

    let roomy = SimBox::cubic(8.0).unwrap();
    let mut celled = PmftXyz::new(roomy, 1.0, 1.0, 1.0, 0.25, 0.25, 0.25).unwrap();
    assert!(celled.use_cells());

    direct
        .compute(&points, &quats, &points, &quats, &quats)
        .unwrap();
    celled
        .compute(&points, &quats, &points, &quats, &quats)
        .unwrap();

    let a = direct.counts();
    let b = celled.counts();
    assert!(a.iter().sum::<u32>() > 0);
    assert_eq!(a, b);
}

#[test]
fn test_reset_restores_a_fresh_histogram() {
    let b = SimBox::cubic(10.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();

    let refs = vec![Vector3::new(0.0, 0.0, 0.0)];
    let points = vec![Vector3::new(1.0, 0.0, 0.0)];
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();
    let first = pmft.counts();

    // counts accumulate across calls until reset
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();
    assert_eq!(pmft.counts().iter().sum::<u32>(), 2);

    pmft.reset();
    assert_eq!(pmft.counts().iter().sum::<u32>(), 0);
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();
    assert_eq!(pmft.counts(), first);
}

#[test]
fn test_2d_box_bins_through_cells() {
    let b = SimBox::new_2d(10.0, 10.0).unwrap();
    // r_max = 3 < 10/3, so the cell-listed kernel runs
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 1.0, 0.5, 0.5, 0.5).unwrap();
    assert!(pmft.use_cells());

    let refs = vec![Vector3::new(0.0, 0.0, 0.0)];
    let points = vec![Vector3::new(1.0, 0.0, 0.0)];
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();

    let counts = pmft.counts();
    let nbins = pmft.nbins();
    assert_eq!(nbins, (8, 8, 4));
    assert_eq!(counts[flat_index(nbins, 2, 4, 2)], 1);
    assert_eq!(counts.iter().sum::<u32>(), 1);
}

#[test]
fn test_out_of_grid_pairs_are_dropped() {
    let b = SimBox::cubic(20.0).unwrap();
    let mut pmft = PmftXyz::new(b, 2.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap();

    let refs = vec![Vector3::new(0.0, 0.0, 0.0)];
    let points = vec![Vector3::new(5.0, 0.0, 0.0)];
    pmft.compute(&refs, &identities(1), &points, &identities(1), &identities(1))
        .unwrap();
    assert_eq!(pmft.counts().iter().sum::<u32>(), 0);
}

#[test]
fn test_grid_validation_errors() {
    let b = SimBox::cubic(10.0).unwrap();
    assert!(matches!(
        PmftXyz::new(b, 2.0, 2.0, 2.0, 0.0, 0.5, 0.5).unwrap_err(),
        OrderError::Config(_)
    ));
    assert!(matches!(
        PmftXyz::new(b, 2.0, 2.0, 2.0, 3.0, 0.5, 0.5).unwrap_err(),
        OrderError::Config(_)
    ));
    assert!(matches!(
        PmftXyz::new(b, 6.0, 2.0, 2.0, 0.5, 0.5, 0.5).unwrap_err(),
        OrderError::Config(_)
    ));
}
