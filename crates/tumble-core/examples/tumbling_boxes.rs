//! A handful of boxes tossed onto the ground with friction, stepped until
//! they settle and deactivate.
//!
//! Run with: `cargo run --example tumbling_boxes`

use nalgebra::{UnitQuaternion, Vector3};
use tumble_core::World;

fn main() {
    tracing_subscriber::fmt::init();

    let mut world = World::new(16, 128);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    world.set_restitution(0.2);
    world.set_friction(0.6);
    world.add_half_space(Vector3::y(), 0.0).expect("capacity available");

    for i in 0..4 {
        let x = -1.5 + i as f64;
        let spin = 1.0 + 0.5 * i as f64;

        let cube = world
            .add_cuboid(Vector3::new(0.3, 0.3, 0.3))
            .expect("capacity available");
        world.set_mass(cube, 2.0).expect("cube has a body");
        world
            .set_state(
                cube,
                Vector3::new(x, 3.0 + i as f64, 0.0),
                UnitQuaternion::from_euler_angles(0.3 * i as f64, 0.5, 0.0),
                Vector3::new(0.0, -1.0, 0.0),
                Vector3::new(spin, 0.0, spin),
            )
            .expect("cube has a body");
        world.set_can_deactivate(cube, true).expect("cube has a body");
        world.set_damping(cube, true).expect("cube has a body");
        world.activate(cube).expect("cube has a body");
    }

    world.initialize();

    let h = 1.0 / 120.0;
    loop {
        world.step(h);

        let sleeping = world.bodies().filter(|b| !b.is_active).count();
        if sleeping == world.body_count() {
            println!("all boxes settled after {:.2} s", world.time());
            break;
        }
        if world.time() > 30.0 {
            println!("boxes still moving after 30 s");
            break;
        }
    }

    let mut out = std::io::stdout();
    world.dump(&mut out).expect("stdout is writable");
}
