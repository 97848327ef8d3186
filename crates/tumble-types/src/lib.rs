//! Core types for the tumble rigid-body dynamics workspace.
//!
//! This crate provides the foundational pieces shared by the collision and
//! world layers:
//!
//! - [`Frame`] - body-to-world transforms and quaternion integration helpers
//! - [`RigidBody`] - momentum-space rigid body state and its integrator
//! - [`WorldConfig`] - capacities, gravity and contact coefficients
//! - [`TumbleError`] / [`SevereErrorSink`] - error surface and misuse sink
//!
//! # Design
//!
//! State is momentum-primary: linear and angular momentum are integrated,
//! velocities are derived through the inverse mass and the world-frame
//! inverse inertia tensor. This keeps impulse application a plain momentum
//! addition and makes conservation checks direct.
//!
//! # Example
//!
//! ```
//! use tumble_types::RigidBody;
//! use nalgebra::{Matrix3, UnitQuaternion, Vector3};
//!
//! let mut body = RigidBody::new();
//! body.set_mass(2.0);
//! body.set_moment_of_inertia(&Matrix3::from_diagonal(&Vector3::new(0.8, 0.8, 0.8)));
//! body.set_state(
//!     Vector3::new(0.0, 10.0, 0.0),
//!     UnitQuaternion::identity(),
//!     Vector3::zeros(),
//!     Vector3::zeros(),
//! );
//! body.activate();
//!
//! body.add_external_force(Vector3::new(0.0, -9.81 * 2.0, 0.0), 0.0);
//! body.integrate(0.01);
//! assert!(body.position.y < 10.0);
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod frame;

pub use body::{BodyId, RigidBody, INFINITE_MASS};
pub use config::WorldConfig;
pub use error::{log_severe_error, Result, SevereErrorSink, TumbleError};
pub use frame::Frame;
