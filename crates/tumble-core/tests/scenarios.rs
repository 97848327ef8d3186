//! End-to-end simulation scenarios: free fall, bouncing, momentum transfer,
//! stacking, detection geometry and conservation properties.

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};
use tumble_core::{GeometryId, World};

const H: f64 = 0.01;

fn add_unit_sphere(world: &mut World, position: Vector3<f64>, velocity: Vector3<f64>) -> GeometryId {
    let id = world.add_sphere(1.0).expect("capacity available");
    world.set_mass(id, 1.0).expect("valid body");
    world
        .set_state(
            id,
            position,
            UnitQuaternion::identity(),
            velocity,
            Vector3::zeros(),
        )
        .expect("valid body");
    world.activate(id).expect("valid body");
    id
}

fn add_unit_cube(world: &mut World, position: Vector3<f64>) -> GeometryId {
    let id = world
        .add_cuboid(Vector3::new(0.5, 0.5, 0.5))
        .expect("capacity available");
    world.set_mass(id, 1.0).expect("valid body");
    world
        .set_state(
            id,
            position,
            UnitQuaternion::identity(),
            Vector3::zeros(),
            Vector3::zeros(),
        )
        .expect("valid body");
    world.activate(id).expect("valid body");
    id
}

#[test]
fn free_fall_matches_the_integrator_closed_form() {
    let mut world = World::new(4, 16);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    let ball = add_unit_sphere(&mut world, Vector3::new(0.0, 10.0, 0.0), Vector3::zeros());
    world.initialize();

    world.step(H);
    let initial_energy = world.total_energy();

    for _ in 1..100 {
        world.step(H);
    }

    let body = world.body(ball).expect("body exists");

    // Semi-implicit Euler drops g·h²·n(n+1)/2 over n steps; that lands a
    // little below the continuum ½·g·t².
    let expected = 10.0 - 9.81 * H * H * (100.0 * 101.0) / 2.0;
    assert_relative_eq!(body.position.y, expected, epsilon = 1e-9);
    assert!((body.position.y - 5.095).abs() < 0.06);

    // Kinetic plus potential energy is conserved to within one percent.
    let drift = (world.total_energy() - initial_energy).abs() / initial_energy.abs();
    assert!(drift < 0.01, "energy drift {drift} too large");
}

#[test]
fn ground_bounce_recovers_nearly_all_height() {
    let mut world = World::new(4, 16);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    world.add_half_space(Vector3::y(), 0.0).expect("fits");
    let ball = add_unit_sphere(&mut world, Vector3::new(0.0, 10.0, 0.0), Vector3::zeros());
    world.initialize();

    let mut min_y = f64::MAX;
    let mut max_y_after_bounce = f64::MIN;
    let mut bounced = false;
    let mut worst_penetration: f64 = 0.0;

    for _ in 0..400 {
        world.step(H);
        let y = world.body(ball).expect("body exists").position.y;

        min_y = min_y.min(y);
        if world.body(ball).expect("body exists").velocity.y > 0.0 {
            bounced = true;
        }
        if bounced {
            max_y_after_bounce = max_y_after_bounce.max(y);
        }

        for i in 0..world.contact_count() {
            let contact = world.contact(i).expect("index in range");
            worst_penetration = worst_penetration.max(contact.penetration);
        }
    }

    assert!(bounced, "the sphere must rebound");
    assert!(min_y > 0.85, "the sphere must not pass through the ground");
    assert!(
        max_y_after_bounce >= 9.5,
        "elastic rebound should recover nearly all height, got {max_y_after_bounce}"
    );
    assert!(max_y_after_bounce <= 10.05, "no energy gain");
    // Residual penetration after projection stays within the accepted
    // resolver residual.
    assert!(
        worst_penetration < 0.05,
        "worst residual penetration {worst_penetration}"
    );
}

#[test]
fn newtons_cradle_hands_the_velocity_down_the_row() {
    let mut world = World::new(8, 32);
    let mut row = Vec::new();
    for i in 0..5 {
        let x = 2.0 * i as f64;
        let velocity = if i == 0 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::zeros()
        };
        row.push(add_unit_sphere(
            &mut world,
            Vector3::new(x, 0.0, 0.0),
            velocity,
        ));
    }
    world.initialize();

    for _ in 0..200 {
        world.step(H);
    }

    for (i, &id) in row.iter().enumerate() {
        let v = world.body(id).expect("body exists").velocity;
        if i == 4 {
            assert!(
                (v.x - 1.0).abs() < 0.05,
                "rightmost sphere should carry the velocity, got {}",
                v.x
            );
        } else {
            assert!(
                v.norm() < 0.05,
                "sphere {i} should be at rest, got {:?}",
                v
            );
        }
    }

    // The whole exchange conserved linear momentum.
    assert_relative_eq!(
        world.total_linear_momentum(),
        Vector3::new(1.0, 0.0, 0.0),
        epsilon = 1e-9
    );
}

#[test]
fn head_on_impulse_is_symmetric_between_finite_masses() {
    let mut world = World::new(4, 16);
    let a = add_unit_sphere(&mut world, Vector3::new(-1.05, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    let b = add_unit_sphere(&mut world, Vector3::new(1.05, 0.0, 0.0), Vector3::zeros());
    world.initialize();

    let before = world.total_linear_momentum();
    for _ in 0..100 {
        world.step(H);
    }

    assert_relative_eq!(world.total_linear_momentum(), before, epsilon = 1e-9);

    // Equal masses, elastic: the moving sphere stops, the struck one leaves.
    let va = world.body(a).expect("body exists").velocity;
    let vb = world.body(b).expect("body exists").velocity;
    assert!(va.norm() < 0.05, "sphere A should stop, got {va:?}");
    assert!((vb.x - 1.0).abs() < 0.05, "sphere B should leave, got {vb:?}");
}

#[test]
fn resting_stack_settles_and_deactivates() {
    let mut world = World::new(8, 64);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    world.set_restitution(0.0);
    world.set_friction(0.5);
    world.add_half_space(Vector3::y(), 0.0).expect("fits");

    let lower = add_unit_cube(&mut world, Vector3::new(0.0, 0.5, 0.0));
    let upper = add_unit_cube(&mut world, Vector3::new(0.0, 1.5, 0.0));
    world.set_can_deactivate(lower, true).expect("valid body");
    world.set_can_deactivate(upper, true).expect("valid body");
    world.initialize();

    for _ in 0..500 {
        world.step(H);
    }

    for id in [lower, upper] {
        let body = world.body(id).expect("body exists");
        assert!(!body.is_active, "stacked cube should fall asleep");
        assert!(
            body.velocity.norm() < 1e-3,
            "sleeping cube should be at rest, got {:?}",
            body.velocity
        );
    }

    // The lower cube is still sitting on the ground, not inside it.
    let y = world.body(lower).expect("body exists").position.y;
    assert!(y > 0.45 && y < 0.55, "lower cube rests near y = 0.5, got {y}");
}

#[test]
fn diagonal_cube_overlap_reports_one_shallow_contact() {
    use tumble_core::{detect, ContactRegistry};

    let mut world = World::new(4, 16);
    let a = add_unit_cube(&mut world, Vector3::zeros());
    let b = add_unit_cube(&mut world, Vector3::new(0.9, 0.9, 0.9));
    world.initialize();

    // Run detection on its own so the reported penetration is the raw
    // geometric overlap, before the resolvers shrink it.
    let bodies: Vec<_> = world.bodies().copied().collect();
    let geometry_a = *world.geometry(a).expect("geometry exists");
    let geometry_b = *world.geometry(b).expect("geometry exists");

    let mut registry = ContactRegistry::new(16);
    let count = detect(&mut registry, &bodies, &geometry_a, &geometry_b);

    assert_eq!(count, 1);
    let contact = registry.get(0).expect("one contact");
    assert!((contact.penetration - 0.1).abs() < 0.011);
    assert_relative_eq!(contact.normal.norm(), 1.0, epsilon = 1e-9);
    assert!(!contact.with_scenery());
}

#[test]
fn true_plane_culls_by_center_distance() {
    // Above by a hair: no contact.
    let mut world = World::new(4, 16);
    world.add_true_plane(Vector3::y(), 0.0).expect("fits");
    add_unit_sphere(&mut world, Vector3::new(0.0, 1.0001, 0.0), Vector3::zeros());
    world.initialize();
    world.step(H);
    assert_eq!(world.contact_count(), 0);

    // Below by a hair: exactly one contact with a tiny penetration.
    let mut world = World::new(4, 16);
    world.add_true_plane(Vector3::y(), 0.0).expect("fits");
    add_unit_sphere(&mut world, Vector3::new(0.0, 0.9999, 0.0), Vector3::zeros());
    world.initialize();
    world.step(H);

    assert_eq!(world.contact_count(), 1);
    let contact = world.contact(0).expect("one contact");
    assert!((contact.penetration - 0.0001).abs() < 1e-6);
    assert!(contact.with_scenery);
}

#[test]
fn isolated_system_conserves_energy_and_momentum() {
    let mut world = World::new(4, 16);
    let brick = world
        .add_cuboid(Vector3::new(0.5, 0.25, 0.125))
        .expect("fits");
    world.set_mass(brick, 3.0).expect("valid body");
    world
        .set_state(
            brick,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::new(0.3, -0.1, 0.2),
            Vector3::new(2.0, 0.5, -1.0),
        )
        .expect("valid body");
    world.activate(brick).expect("valid body");
    world.initialize();

    let energy_0 = world.total_kinetic_energy();
    let linear_0 = world.total_linear_momentum();
    let angular_0 = world.total_angular_momentum();

    for _ in 0..100 {
        world.step(H);
        let q = world.body(brick).expect("body exists").orientation;
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-9);
    }

    // Momenta are exact (no forces, no contacts); the kinetic energy of the
    // tumbling brick drifts O(h) through the orientation update.
    assert_relative_eq!(world.total_linear_momentum(), linear_0, epsilon = 1e-12);
    let angular_drift =
        (world.total_angular_momentum() - angular_0).norm() / angular_0.norm();
    assert!(angular_drift < 1e-9, "angular momentum drift {angular_drift}");

    let energy_drift = (world.total_kinetic_energy() - energy_0).abs() / energy_0;
    assert!(energy_drift < 0.05, "kinetic energy drift {energy_drift}");
}

#[test]
fn deactivated_body_holds_its_pose() {
    let mut world = World::new(4, 16);
    let ball = add_unit_sphere(&mut world, Vector3::new(0.0, 2.0, 0.0), Vector3::zeros());
    world.deactivate(ball).expect("valid body");
    world.initialize();

    let before = *world.body(ball).expect("body exists");
    for _ in 0..50 {
        world.step(H);
    }
    let after = world.body(ball).expect("body exists");

    assert_eq!(after.position, before.position);
    assert_eq!(after.orientation, before.orientation);
    assert!(!after.is_active);
}

#[test]
fn saturated_registry_drops_contacts_but_keeps_stepping() {
    let mut world = World::new(8, 1);

    // Three mutually overlapping spheres produce three candidate contacts.
    add_unit_sphere(&mut world, Vector3::new(0.0, 0.0, 0.0), Vector3::zeros());
    add_unit_sphere(&mut world, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
    add_unit_sphere(&mut world, Vector3::new(0.5, 0.8, 0.0), Vector3::zeros());
    world.initialize();

    world.step(H);
    assert_eq!(world.contact_count(), 1, "arena holds exactly one contact");

    // Later steps may resolve the overlaps, but the arena bound holds and
    // the world keeps stepping.
    for _ in 0..9 {
        world.step(H);
        assert!(world.contact_count() <= 1);
    }
    assert_eq!(world.step_count(), 10);
}

#[test]
fn restitution_zero_kills_the_bounce() {
    let mut world = World::new(4, 16);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    world.set_restitution(0.0);
    world.add_half_space(Vector3::y(), 0.0).expect("fits");
    let ball = add_unit_sphere(&mut world, Vector3::new(0.0, 3.0, 0.0), Vector3::zeros());
    world.initialize();

    for _ in 0..300 {
        world.step(H);
    }

    let body = world.body(ball).expect("body exists");
    assert!(
        body.velocity.norm() < 0.2,
        "inelastic drop should come to rest, got {:?}",
        body.velocity
    );
    assert!((body.position.y - 1.0).abs() < 0.05, "resting on the ground");
}

#[test]
fn spinning_sphere_with_friction_starts_rolling() {
    // A sphere pressed onto the ground, sliding without spin; friction
    // converts some slide into spin about z.
    let mut world = World::new(4, 16);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    world.set_restitution(0.0);
    world.set_friction(0.8);
    world.add_half_space(Vector3::y(), 0.0).expect("fits");
    let ball = add_unit_sphere(
        &mut world,
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(2.0, 0.0, 0.0),
    );
    world.initialize();

    for _ in 0..100 {
        world.step(H);
    }

    let body = world.body(ball).expect("body exists");
    assert!(
        body.velocity.x < 2.0,
        "friction should slow the slide, got {}",
        body.velocity.x
    );
    assert!(
        body.angular_velocity.z < -1e-3,
        "friction torque should spin the sphere, got {}",
        body.angular_velocity.z
    );
}
