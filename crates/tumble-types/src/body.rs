//! Rigid body state and integration.
//!
//! A [`RigidBody`] carries momentum-space state: position, orientation,
//! linear momentum and angular momentum are primary, velocities are derived.
//! Masses are stored through their inverses so both immovable (inverse 0)
//! and massless (inverse `1e30`) bodies are representable without special
//! cases in the solvers.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::frame::{self, Frame};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a rigid body in its world's body arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub usize);

impl BodyId {
    /// Create a body id from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Inverse-mass encoding threshold: masses at or above this are immovable,
/// an inverse mass at or above this marks a massless body.
pub const INFINITE_MASS: f64 = 1e30;

/// Fraction of the body mass used as the deactivation energy threshold.
const ENERGY_THRESHOLD_FRACTION: f64 = 0.3;

/// Per-second retention factor for angular momentum damping.
const ANGULAR_DAMPING: f64 = 0.998;

/// Per-second retention factor for linear momentum damping.
///
/// Zero disables the linear part entirely; the momentum is left untouched.
const LINEAR_DAMPING: f64 = 0.0;

/// A rigid body: inverse mass properties, momentum-space state, force
/// accumulators and quantities derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Inverse mass; 0 denotes an immovable (infinite mass) body.
    pub inverse_mass: f64,
    /// Inverse moment of inertia tensor in the body-fixed frame.
    pub inverse_inertia_body: Matrix3<f64>,

    /// Position in world frame.
    pub position: Vector3<f64>,
    /// Orientation versor in world frame.
    pub orientation: UnitQuaternion<f64>,
    /// Linear momentum in world frame.
    pub linear_momentum: Vector3<f64>,
    /// Angular momentum in world frame.
    pub angular_momentum: Vector3<f64>,

    /// Accumulated force for the next integration step.
    pub force: Vector3<f64>,
    /// Accumulated torque for the next integration step.
    pub torque: Vector3<f64>,
    /// Accumulated potential energy of the applied forces.
    pub potential_energy: f64,

    /// Body-to-world transform, kept consistent with `(orientation, position)`.
    pub to_world: Frame,
    /// Inverse inertia tensor in world frame, `R · I_b⁻¹ · Rᵀ`.
    pub inverse_inertia_world: Matrix3<f64>,
    /// Linear velocity, `M⁻¹ · P`.
    pub velocity: Vector3<f64>,
    /// Angular velocity, `I_w⁻¹ · L`.
    pub angular_velocity: Vector3<f64>,
    /// Total angular momentum about the world origin, `X × P + L`.
    pub total_angular_momentum: Vector3<f64>,
    /// Kinetic energy, `½ (V·P + Ω·L)`.
    pub kinetic_energy: f64,

    /// Low-pass filtered kinetic energy used for deactivation.
    pub average_kinetic_energy: f64,
    /// Energy level below which the body counts as stationary.
    pub kinetic_energy_threshold: f64,
    /// Whether momentum damping is applied during integration.
    pub damping_enabled: bool,

    /// Whether the body currently integrates and responds to contacts.
    pub is_active: bool,
    /// Whether the body is allowed to deactivate when it comes to rest.
    pub can_deactivate: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// Create an immovable body at the origin, inactive, with zero state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inverse_mass: 0.0,
            inverse_inertia_body: Matrix3::zeros(),
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            linear_momentum: Vector3::zeros(),
            angular_momentum: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            potential_energy: 0.0,
            to_world: Frame::identity(),
            inverse_inertia_world: Matrix3::zeros(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            total_angular_momentum: Vector3::zeros(),
            kinetic_energy: 0.0,
            average_kinetic_energy: 0.0,
            kinetic_energy_threshold: 0.0,
            damping_enabled: false,
            is_active: false,
            can_deactivate: false,
        }
    }

    // =========================================================================
    // Mass properties
    // =========================================================================

    /// Set the body mass.
    ///
    /// A mass of 0 encodes a massless body (inverse mass `1e30`); a mass at
    /// or above `1e30` encodes an immovable body (inverse mass 0). The
    /// deactivation threshold is re-derived as `0.3 · mass`.
    #[allow(clippy::float_cmp)]
    pub fn set_mass(&mut self, mass: f64) {
        self.inverse_mass = if mass == 0.0 {
            INFINITE_MASS
        } else if mass >= INFINITE_MASS {
            0.0
        } else {
            1.0 / mass
        };

        self.kinetic_energy_threshold = ENERGY_THRESHOLD_FRACTION * mass;
    }

    /// Get the body mass, inverting the encoding of [`RigidBody::set_mass`].
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn mass(&self) -> f64 {
        if self.inverse_mass == 0.0 {
            INFINITE_MASS
        } else if self.inverse_mass >= INFINITE_MASS {
            0.0
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Whether the body has finite (movable) mass.
    #[must_use]
    pub fn is_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Set the body-frame moment of inertia tensor.
    ///
    /// The stored quantity is its inverse; a singular tensor (determinant 0)
    /// stores the zero inverse, making the body rotationally immovable.
    pub fn set_moment_of_inertia(&mut self, inertia_body: &Matrix3<f64>) {
        self.inverse_inertia_body = frame::invert_or_zero(inertia_body);
    }

    // =========================================================================
    // State initialization and derived quantities
    // =========================================================================

    /// Initialize position, orientation, velocity and angular velocity,
    /// deriving the momenta and the remaining quantities from them.
    pub fn set_state(
        &mut self,
        position: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        velocity: Vector3<f64>,
        angular_velocity: Vector3<f64>,
    ) {
        self.position = position;
        self.orientation = orientation;
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;

        self.refresh_derived_from_velocities();
    }

    /// Rebuild the transform, world inertia and derived quantities, deriving
    /// velocities from the momenta.
    pub fn refresh_derived(&mut self) {
        self.refresh_transform();

        self.velocity = self.inverse_mass * self.linear_momentum;
        self.angular_velocity = self.inverse_inertia_world * self.angular_momentum;

        self.refresh_energy_and_momentum();
    }

    /// Rebuild the transform, world inertia and derived quantities, deriving
    /// momenta from the velocities.
    pub fn refresh_derived_from_velocities(&mut self) {
        self.refresh_transform();

        self.linear_momentum = self.mass() * self.velocity;
        self.angular_momentum =
            frame::invert_or_zero(&self.inverse_inertia_world) * self.angular_velocity;

        self.refresh_energy_and_momentum();
    }

    fn refresh_transform(&mut self) {
        self.orientation = frame::normalize_or_identity(*self.orientation.quaternion());
        self.to_world = Frame::from_orientation_position(&self.orientation, &self.position);
        self.inverse_inertia_world = self.to_world.rotate_tensor(&self.inverse_inertia_body);
    }

    fn refresh_energy_and_momentum(&mut self) {
        self.total_angular_momentum =
            self.position.cross(&self.linear_momentum) + self.angular_momentum;
        self.kinetic_energy = 0.5 * self.velocity.dot(&self.linear_momentum)
            + 0.5 * self.angular_velocity.dot(&self.angular_momentum);
    }

    // =========================================================================
    // Integration
    // =========================================================================

    /// Advance the body one semi-implicit Euler step of length `h`.
    ///
    /// Momenta are updated from the accumulated force and torque first, then
    /// the new velocities advance position and orientation. The orientation
    /// is renormalized and every derived quantity is refreshed. Inactive
    /// bodies do not move.
    pub fn integrate(&mut self, h: f64) {
        if !self.is_active {
            return;
        }

        self.linear_momentum += self.force * h;
        self.angular_momentum += self.torque * h;

        // Remove kinetic energy added through the numerical instability of
        // the semi-implicit integrator.
        if self.damping_enabled {
            self.damp_momentum(h);
        }

        self.velocity = self.inverse_mass * self.linear_momentum;
        self.angular_velocity = self.inverse_inertia_world * self.angular_momentum;

        let orientation_dot =
            frame::orientation_derivative(&self.angular_velocity, &self.orientation);

        self.position += self.velocity * h;
        self.orientation =
            frame::normalize_or_identity(self.orientation.quaternion() + orientation_dot * h);

        self.refresh_derived();

        if self.can_deactivate {
            self.update_activation(h);
        }
    }

    /// Damp linear and angular momentum by the per-second retention factors
    /// raised to the step length.
    pub fn damp_momentum(&mut self, h: f64) {
        if LINEAR_DAMPING > 0.0 {
            self.linear_momentum *= LINEAR_DAMPING.powf(h);
        }
        if ANGULAR_DAMPING > 0.0 {
            self.angular_momentum *= ANGULAR_DAMPING.powf(h);
        }
    }

    /// Update the filtered kinetic energy and deactivate the body when it
    /// drops below the threshold.
    fn update_activation(&mut self, h: f64) {
        // Exponential average with alpha = (1/2)^h.
        let alpha = 0.5_f64.powf(h);
        self.average_kinetic_energy =
            alpha * self.average_kinetic_energy + (1.0 - alpha) * self.kinetic_energy;

        if self.average_kinetic_energy < self.kinetic_energy_threshold {
            self.deactivate();
        } else if self.average_kinetic_energy > 10.0 * self.kinetic_energy_threshold {
            self.average_kinetic_energy = 10.0 * self.kinetic_energy_threshold;
        }
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Allow the body to move.
    ///
    /// The filtered kinetic energy is re-seeded at twice the threshold so the
    /// body is not immediately deactivated again.
    pub fn activate(&mut self) {
        if !self.is_active {
            self.is_active = true;
            self.average_kinetic_energy = 2.0 * ENERGY_THRESHOLD_FRACTION * self.mass();
        }
    }

    /// Stop the body: zero the momenta, velocities, accumulators and kinetic
    /// energy, and exclude it from integration.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.linear_momentum = Vector3::zeros();
        self.angular_momentum = Vector3::zeros();
        self.total_angular_momentum = Vector3::zeros();
        self.velocity = Vector3::zeros();
        self.angular_velocity = Vector3::zeros();
        self.kinetic_energy = 0.0;
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    /// Set whether the body may deactivate; forbidding deactivation wakes a
    /// currently inactive body.
    pub fn set_can_deactivate(&mut self, flag: bool) {
        self.can_deactivate = flag;

        if !self.can_deactivate && !self.is_active {
            self.activate();
        }
    }

    // =========================================================================
    // Force and torque accumulation
    // =========================================================================

    /// Clear the force and torque accumulators and the potential energy.
    pub fn clear_accumulators(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
        self.potential_energy = 0.0;
    }

    /// Add an external force acting on the whole body (such as gravity).
    ///
    /// External forces do not activate inactive bodies.
    pub fn add_external_force(&mut self, force: Vector3<f64>, potential_energy: f64) {
        self.force += force;
        self.potential_energy += potential_energy;
    }

    /// Add an internal force at the center of mass; activates the body.
    pub fn add_force(&mut self, force: Vector3<f64>, potential_energy: f64) {
        self.force += force;
        self.potential_energy += potential_energy;
        self.is_active = true;
    }

    /// Add an internal force at a world-frame point; activates the body.
    pub fn add_force_at_point(
        &mut self,
        world_point: Vector3<f64>,
        force: Vector3<f64>,
        potential_energy: f64,
    ) {
        self.force += force;
        self.torque += (world_point - self.position).cross(&force);
        self.potential_energy += potential_energy;
        self.is_active = true;
    }

    /// Add an internal force at a body-frame point; activates the body.
    pub fn add_force_at_body_point(
        &mut self,
        body_point: Vector3<f64>,
        force: Vector3<f64>,
        potential_energy: f64,
    ) {
        let world_point = self.to_world.transform_point(&body_point);
        self.add_force_at_point(world_point, force, potential_energy);
    }

    /// Add an internal torque; activates the body.
    pub fn add_torque(&mut self, torque: Vector3<f64>) {
        self.torque += torque;
        self.is_active = true;
    }

    /// Check that the state contains no `NaN` or infinite components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|x| x.is_finite())
            && self.orientation.coords.iter().all(|x| x.is_finite())
            && self.linear_momentum.iter().all(|x| x.is_finite())
            && self.angular_momentum.iter().all(|x| x.is_finite())
    }
}
