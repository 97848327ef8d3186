//! A sphere dropped onto a ground plane, printed as a height trace.
//!
//! Run with: `cargo run --example falling_sphere`

use nalgebra::{UnitQuaternion, Vector3};
use tumble_core::World;

fn main() {
    tracing_subscriber::fmt::init();

    let mut world = World::new(8, 32);
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
    world.set_restitution(0.7);
    world.add_half_space(Vector3::y(), 0.0).expect("capacity available");

    let ball = world.add_sphere(0.5).expect("capacity available");
    world.set_mass(ball, 1.0).expect("sphere has a body");
    world
        .set_state(
            ball,
            Vector3::new(0.0, 5.0, 0.0),
            UnitQuaternion::identity(),
            Vector3::zeros(),
            Vector3::zeros(),
        )
        .expect("sphere has a body");
    world.activate(ball).expect("sphere has a body");

    world.initialize();

    let h = 1.0 / 100.0;
    for step in 0..500 {
        world.step(h);

        if step % 25 == 0 {
            let body = world.body(ball).expect("sphere has a body");
            println!(
                "t = {:5.2}  y = {:6.3}  vy = {:7.3}  contacts = {}",
                world.time(),
                body.position.y,
                body.velocity.y,
                world.contact_count(),
            );
        }
    }

    let mut out = std::io::stdout();
    world.dump(&mut out).expect("stdout is writable");
}
