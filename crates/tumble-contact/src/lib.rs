//! Contact registry and collision resolvers for the tumble workspace.
//!
//! Detection (in `tumble-core`) writes [`Contact`]s into a fixed-capacity
//! [`ContactRegistry`]; this crate then resolves them in two passes:
//!
//! 1. [`impulse_transfers`] applies sequential, largest-closing-velocity-first
//!    momentum impulses with optional Coulomb friction, so bodies bounce.
//! 2. [`position_projections`] applies sequential, largest-penetration-first
//!    position/orientation jolts, so bodies do not overlap.
//!
//! Both resolvers terminate within `8 × contact count` iterations; residual
//! errors beyond the tolerances are accepted rather than treated as failures.
//!
//! # Example
//!
//! ```
//! use tumble_contact::{impulse_transfers, ContactRegistry};
//! use tumble_types::{BodyId, RigidBody};
//! use nalgebra::{Matrix3, UnitQuaternion, Vector3};
//!
//! // One sphere hitting the ground at 2 m/s.
//! let mut body = RigidBody::new();
//! body.set_mass(1.0);
//! body.set_moment_of_inertia(&Matrix3::from_diagonal(&Vector3::new(0.4, 0.4, 0.4)));
//! body.set_state(
//!     Vector3::new(0.0, 1.0, 0.0),
//!     UnitQuaternion::identity(),
//!     Vector3::new(0.0, -2.0, 0.0),
//!     Vector3::zeros(),
//! );
//! body.activate();
//! let mut bodies = [body];
//!
//! let mut registry = ContactRegistry::new(16);
//! registry.register_new_contact(
//!     Some(BodyId::new(0)),
//!     None, // scenery
//!     Vector3::zeros(),
//!     Vector3::new(0.0, 1.0, 0.0),
//!     0.01,
//! );
//! registry.update_derived(&bodies, 0.01);
//!
//! impulse_transfers(&mut registry, &mut bodies, 0.01, 0, 0.0);
//! assert!(bodies[0].linear_momentum.y > 0.0, "the body bounces");
//! ```

pub mod contact;
pub mod impulse;
pub mod projection;
pub mod registry;

pub use contact::{contact_basis, Contact};
pub use impulse::impulse_transfers;
pub use projection::position_projections;
pub use registry::ContactRegistry;
