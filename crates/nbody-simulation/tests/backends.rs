use approx::{assert_abs_diff_eq, assert_relative_eq};
use glam::DVec2;
use nbody_physics::{Body, PhysicsError};
use nbody_simulation::{
    step_frame, Backend, GpuBackend, HostBackend, HostReduction, SimulationError,
    SimulationParams,
};

/// Accelerator for tests, or `None` when the machine has no f64-capable GPU
fn accelerator(max_bodies: u32) -> Option<GpuBackend> {
    match GpuBackend::init(max_bodies) {
        Ok(backend) => Some(backend),
        Err(e) => {
            eprintln!("skipping accelerator checks: {e}");
            None
        }
    }
}

/// Host backends plus the accelerator when available
fn backends(max_bodies: u32) -> Vec<Box<dyn Backend>> {
    let mut all: Vec<Box<dyn Backend>> = vec![
        Box::new(HostBackend::new()),
        Box::new(HostBackend::new().with_reduction(HostReduction::Tree)),
    ];
    if let Some(gpu) = accelerator(max_bodies) {
        all.push(Box::new(gpu));
    }
    all
}

fn two_bodies() -> Vec<Body> {
    vec![
        Body::at_rest(DVec2::new(0.0, 0.0), 10.0).unwrap(),
        Body::at_rest(DVec2::new(10.0, 0.0), 20.0).unwrap(),
    ]
}

/// Deterministic spread of bodies inside the default world
fn cluster(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let f = i as f64;
            Body::new(
                DVec2::new(960.0 + (f * 0.37).sin() * 700.0, 540.0 + (f * 0.13).cos() * 400.0),
                DVec2::new((f * 0.71).cos() * 3.0, (f * 0.29).sin() * 3.0),
                10.0 + (f * 1.7) % 90.0,
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn two_body_velocities_after_one_call() {
    for backend in backends(16) {
        let mut bodies = two_bodies();
        let elapsed = backend.compute_forces(&mut bodies, 1.0).unwrap();
        assert!(elapsed >= 0.0);

        let force = 10.0 * 20.0 * 1.0 / (100.0 + 0.1);
        assert_abs_diff_eq!(bodies[0].velocity().x, force / 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bodies[0].velocity().x, 0.19980, epsilon = 1e-5);
        assert_abs_diff_eq!(bodies[0].velocity().y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bodies[1].velocity().x, -force / 20.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bodies[1].velocity().x, -0.09990, epsilon = 1e-5);
        assert_abs_diff_eq!(bodies[1].velocity().y, 0.0, epsilon = 1e-6);

        // Positions are not moved by force accumulation
        assert_eq!(bodies[0].position(), DVec2::new(0.0, 0.0));
        assert_eq!(bodies[1].position(), DVec2::new(10.0, 0.0));
    }
}

#[test]
fn single_body_feels_no_force() {
    for backend in backends(4) {
        let mut bodies = vec![Body::new(DVec2::new(50.0, 60.0), DVec2::new(1.5, -2.5), 42.0).unwrap()];
        backend.compute_forces(&mut bodies, 9.8).unwrap();
        assert_eq!(bodies[0].velocity(), DVec2::new(1.5, -2.5), "{}", backend.name());
    }
}

#[test]
fn zero_gravity_leaves_velocities_unchanged() {
    for backend in backends(128) {
        let initial = cluster(100);
        let mut bodies = initial.clone();
        backend.compute_forces(&mut bodies, 0.0).unwrap();
        for (before, after) in initial.iter().zip(&bodies) {
            assert_eq!(before.velocity(), after.velocity(), "{}", backend.name());
        }
    }
}

#[test]
fn pair_accelerations_are_opposed() {
    for backend in backends(16) {
        let mut bodies = vec![
            Body::at_rest(DVec2::new(3.0, 4.0), 5.0).unwrap(),
            Body::at_rest(DVec2::new(-9.0, 13.0), 5.0).unwrap(),
        ];
        backend.compute_forces(&mut bodies, 2.0).unwrap();

        // Equal masses -> equal and opposite accelerations
        let a = bodies[0].velocity();
        let b = bodies[1].velocity();
        assert_relative_eq!(a.x, -b.x, max_relative = 1e-12);
        assert_relative_eq!(a.y, -b.y, max_relative = 1e-12);
        assert!(a.x < 0.0 && a.y > 0.0);
    }
}

#[test]
fn boundary_reflects_before_moving() {
    for backend in backends(4) {
        let mut bodies = vec![Body::new(DVec2::new(-5.0, 500.0), DVec2::new(3.0, 0.0), 1.0).unwrap()];
        backend.advance(&mut bodies, 1.0, 100.0, 1000.0).unwrap();

        assert_eq!(bodies[0].velocity().x, -3.0, "{}", backend.name());
        assert_eq!(bodies[0].position().x, -8.0, "{}", backend.name());
        assert_eq!(bodies[0].position().y, 500.0, "{}", backend.name());
    }
}

#[test]
fn zero_dt_keeps_positions() {
    for backend in backends(64) {
        let mut bodies = cluster(50);
        // Push one body out of bounds so it reflects
        bodies[0].set_position(DVec2::new(-10.0, 2000.0));
        let before = bodies.clone();

        backend.advance(&mut bodies, 0.0, 1920.0, 1080.0).unwrap();

        for (b, a) in before.iter().zip(&bodies) {
            assert_eq!(b.position(), a.position());
        }
        assert_eq!(bodies[0].velocity(), -before[0].velocity());
        assert_eq!(bodies[1].velocity(), before[1].velocity());
    }
}

#[test]
fn invalid_mass_is_rejected_on_entry() {
    for backend in backends(4) {
        let mut bodies = two_bodies();
        bodies.push(bytemuck::Zeroable::zeroed());

        let err = backend.compute_forces(&mut bodies, 1.0).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Physics(PhysicsError::InvalidMass { index: 2, .. })
        ));
        // Nothing was touched
        assert_eq!(bodies[0].velocity(), DVec2::ZERO);
    }
}

#[test]
fn bodies_keep_order_and_length() {
    for backend in backends(64) {
        let mut bodies = cluster(33);
        let masses: Vec<f64> = bodies.iter().map(Body::mass).collect();
        step_frame(&backend, &mut bodies, &SimulationParams::default()).unwrap();

        assert_eq!(bodies.len(), 33);
        let after: Vec<f64> = bodies.iter().map(Body::mass).collect();
        assert_eq!(masses, after);
    }
}

#[test]
fn host_and_accelerator_agree() {
    let Some(gpu) = accelerator(512) else {
        return;
    };
    let host = HostBackend::new();
    let params = SimulationParams::default();

    let initial = cluster(500);
    let mut on_host = initial.clone();
    let mut on_gpu = initial;

    for _ in 0..5 {
        step_frame(&host, &mut on_host, &params).unwrap();
        step_frame(&gpu, &mut on_gpu, &params).unwrap();
    }

    for (h, g) in on_host.iter().zip(&on_gpu) {
        assert_relative_eq!(h.position().x, g.position().x, max_relative = 1e-6);
        assert_relative_eq!(h.position().y, g.position().y, max_relative = 1e-6);
        assert_relative_eq!(h.velocity().x, g.velocity().x, epsilon = 1e-9, max_relative = 1e-6);
        assert_relative_eq!(h.velocity().y, g.velocity().y, epsilon = 1e-9, max_relative = 1e-6);
    }

    gpu.shutdown();
}

#[test]
fn accelerator_rejects_more_bodies_than_reserved() {
    let Some(gpu) = accelerator(8) else {
        return;
    };
    assert_eq!(gpu.capacity(), 8);

    let mut bodies = cluster(9);
    let err = gpu.compute_forces(&mut bodies, 1.0).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::CapacityExceeded {
            requested: 9,
            capacity: 8
        }
    ));
    assert!(gpu.advance(&mut bodies, 1.0, 10.0, 10.0).is_err());

    // Smaller sequences are fine
    let mut fewer = cluster(3);
    assert!(gpu.compute_forces(&mut fewer, 1.0).is_ok());
}
