//! World configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use nalgebra::Vector3;

/// Configuration for a rigid-body world.
///
/// Capacities are fixed at world construction; all contact storage is
/// reserved up front and never grows during stepping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Maximum number of geometries the world can hold.
    pub max_objects: usize,
    /// Maximum number of contacts the registry can hold per step.
    pub max_collisions: usize,
    /// Gravity applied to every body each step (set to zero to disable).
    pub gravity: Vector3<f64>,
    /// Restitution coefficient stamped onto every registered contact.
    pub restitution: f64,
    /// Position projection relaxation factor in (0, 1]; 0 disables it.
    pub relaxation: f64,
    /// Friction coefficient stamped onto every registered contact.
    pub friction: f64,
    /// Bouncing-velocity tolerance for the impulse resolver.
    pub velocity_eps: f64,
    /// Penetration tolerance for the position projection resolver.
    pub position_eps: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(64, 256)
    }
}

impl WorldConfig {
    /// Create a configuration with the given capacities and the standard
    /// defaults: no gravity, restitution 1.0, relaxation 0.2, friction 0.0.
    #[must_use]
    pub fn new(max_objects: usize, max_collisions: usize) -> Self {
        Self {
            max_objects,
            max_collisions,
            gravity: Vector3::zeros(),
            restitution: 1.0,
            relaxation: 0.2,
            friction: 0.0,
            velocity_eps: 0.01,
            position_eps: 0.01,
        }
    }

    /// Set the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set standard gravity along the negative Y axis.
    #[must_use]
    pub fn with_earth_gravity(mut self) -> Self {
        self.gravity = Vector3::new(0.0, -9.81, 0.0);
        self
    }

    /// Set the common restitution coefficient.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set the position projection relaxation factor.
    #[must_use]
    pub fn with_relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Set the common friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TumbleError::InvalidConfig`] when a capacity is zero
    /// or a coefficient is out of its documented range.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_objects == 0 {
            return Err(crate::TumbleError::invalid_config(
                "max_objects must be at least 1",
            ));
        }
        if self.max_collisions == 0 {
            return Err(crate::TumbleError::invalid_config(
                "max_collisions must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(crate::TumbleError::invalid_config(
                "restitution must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.relaxation) {
            return Err(crate::TumbleError::invalid_config(
                "relaxation must be between 0 and 1",
            ));
        }
        if self.friction < 0.0 {
            return Err(crate::TumbleError::invalid_config(
                "friction cannot be negative",
            ));
        }
        if self.velocity_eps <= 0.0 || self.position_eps <= 0.0 {
            return Err(crate::TumbleError::invalid_config(
                "resolver tolerances must be positive",
            ));
        }
        Ok(())
    }
}
