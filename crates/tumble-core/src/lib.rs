//! Geometry, collision detection and world orchestration for the tumble
//! rigid-body dynamics workspace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         World                               │
//! │  Owns: body arena, geometry arena, contact registry         │
//! │  Steps: gravity → integrate → detect → resolve              │
//! └──────────────┬──────────────────────────┬───────────────────┘
//!                │                          │
//!                ▼                          ▼
//! ┌──────────────────────────┐  ┌──────────────────────────────┐
//! │        collision         │  │        tumble-contact        │
//! │  per-pair narrow phase   │  │  impulse transfer +          │
//! │  over the Shape union    │  │  position projection         │
//! └──────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! The world is strictly single-threaded and synchronous: `step(h)` is
//! bounded-time given the capacities fixed at construction, detection scans
//! pairs in lexicographic order and both resolvers are deterministic
//! largest-first loops. There is no cross-step allocation.
//!
//! # Quick start
//!
//! ```
//! use tumble_core::World;
//! use nalgebra::{UnitQuaternion, Vector3};
//!
//! // A bouncing ball over a ground plane.
//! let mut world = World::new(16, 64);
//! world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
//! world.add_half_space(Vector3::y(), 0.0).unwrap();
//!
//! let ball = world.add_sphere(0.5).unwrap();
//! world.set_mass(ball, 1.0).unwrap();
//! world.set_state(
//!     ball,
//!     Vector3::new(0.0, 3.0, 0.0),
//!     UnitQuaternion::identity(),
//!     Vector3::zeros(),
//!     Vector3::zeros(),
//! ).unwrap();
//! world.activate(ball).unwrap();
//!
//! world.initialize();
//! for _ in 0..240 {
//!     world.step(1.0 / 120.0);
//! }
//!
//! // The ball is somewhere above the plane, not through it.
//! assert!(world.body(ball).unwrap().position.y > 0.4);
//! ```

pub mod collision;
pub mod geometry;
pub mod world;

pub use collision::detect;
pub use geometry::{Geometry, GeometryId, Shape};
pub use world::{ContactInfo, World};

pub use tumble_contact::{Contact, ContactRegistry};
pub use tumble_types::{
    BodyId, Frame, RigidBody, SevereErrorSink, TumbleError, WorldConfig, INFINITE_MASS,
};
