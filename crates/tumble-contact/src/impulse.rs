//! Iterative impulse transfer.
//!
//! Collisions are resolved sequentially, always taking the contact with the
//! largest outstanding bouncing velocity. Each transfer applies a momentum
//! impulse pair to the involved bodies and folds the resulting velocity
//! jolts back into every contact that shares a body, including the one just
//! resolved.

use nalgebra::{Matrix3, Vector3};
use tumble_types::{frame, BodyId, RigidBody};

use crate::contact::Contact;
use crate::registry::ContactRegistry;

/// Default velocity tolerance when the caller passes 0.
const DEFAULT_VELOCITY_EPS: f64 = 0.01;

/// Resolve all registered contacts with the impulse transfer method.
///
/// Passing 0 for `max_iterations` selects the default cap of eight times the
/// contact count; passing 0.0 for `eps` selects the default tolerance of
/// 0.01. The loop stops early once no contact's bouncing velocity exceeds
/// `eps`; hitting the iteration cap is an accepted residual, not an error.
#[allow(clippy::float_cmp)]
pub fn impulse_transfers(
    registry: &mut ContactRegistry,
    bodies: &mut [RigidBody],
    h: f64,
    max_iterations: usize,
    eps: f64,
) {
    if registry.count() == 0 {
        return;
    }

    let max_iterations = if max_iterations == 0 {
        8 * registry.count()
    } else {
        max_iterations
    };
    let eps = if eps == 0.0 { DEFAULT_VELOCITY_EPS } else { eps };

    for iteration in 0..max_iterations {
        let Some(index) = registry.find_largest_bouncing_velocity(eps) else {
            tracing::trace!(target: "tumble", iteration, "impulse transfers converged");
            break;
        };

        let (pair_a, pair_b) = {
            let contact = &registry.contacts()[index];
            (contact.body_a, contact.body_b)
        };
        activate_lone_inactive(bodies, pair_a, pair_b);

        let (v_jolt, w_jolt) = registry.contacts_mut()[index].apply_impulse(bodies);

        // The momentum change alters closing velocities on every contact
        // that shares a body with the resolved one.
        let pair = [pair_a, pair_b];
        for contact in registry.contacts_mut() {
            let slots = [contact.body_a, contact.body_b];
            for (slot, slot_body) in slots.iter().enumerate() {
                let Some(slot_body) = slot_body else { continue };

                for (jolt, pair_body) in pair.iter().enumerate() {
                    if Some(*slot_body) != *pair_body {
                        continue;
                    }

                    let delta_v =
                        v_jolt[jolt] + w_jolt[jolt].cross(&contact.relative_position[slot]);
                    let delta_v_contact = contact.to_world.transpose() * delta_v;

                    // The change subtracts when the shared body sits in the
                    // second slot of the scanned contact.
                    contact.velocity += if slot == 1 { -delta_v_contact } else { delta_v_contact };
                    contact.bouncing_velocity = contact.compute_bouncing_velocity(bodies, h);
                }
            }
        }
    }
}

/// Activate the inactive body when exactly one side of a body/body contact
/// is active. Scenery contacts never wake a body.
pub(crate) fn activate_lone_inactive(
    bodies: &mut [RigidBody],
    body_a: Option<BodyId>,
    body_b: Option<BodyId>,
) {
    let (Some(a), Some(b)) = (body_a, body_b) else {
        return;
    };

    let active_a = bodies[a.index()].is_active;
    let active_b = bodies[b.index()].is_active;
    if active_a ^ active_b {
        if active_a {
            bodies[b.index()].activate();
        } else {
            bodies[a.index()].activate();
        }
    }
}

impl Contact {
    /// Apply the impulse pair resolving this contact and return the linear
    /// and angular velocity jolts experienced by each body slot.
    ///
    /// Momenta are changed directly; velocities and the remaining derived
    /// body quantities are refreshed on the next integration step.
    #[allow(clippy::float_cmp)]
    pub(crate) fn apply_impulse(
        &mut self,
        bodies: &mut [RigidBody],
    ) -> ([Vector3<f64>; 2], [Vector3<f64>; 2]) {
        let mut v_jolt = [Vector3::zeros(); 2];
        let mut w_jolt = [Vector3::zeros(); 2];

        let Some(a) = self.body_a else {
            return (v_jolt, w_jolt);
        };

        let impulse_contact = if self.friction == 0.0 {
            self.impulse_frictionless(bodies)
        } else {
            self.impulse_with_friction(bodies)
        };

        let impulse = self.to_world * impulse_contact;
        let impulse_torque = self.relative_position[0].cross(&impulse);

        {
            let body_a = &mut bodies[a.index()];
            body_a.linear_momentum += impulse;
            body_a.angular_momentum += impulse_torque;

            v_jolt[0] = body_a.inverse_mass * impulse;
            w_jolt[0] = body_a.inverse_inertia_world * impulse_torque;
        }

        if let Some(b) = self.body_b {
            let impulse_torque_b = self.relative_position[1].cross(&impulse);

            let body_b = &mut bodies[b.index()];
            body_b.linear_momentum -= impulse;
            body_b.angular_momentum -= impulse_torque_b;

            v_jolt[1] = -(body_b.inverse_mass * impulse);
            w_jolt[1] = -(body_b.inverse_inertia_world * impulse_torque_b);
        }

        (v_jolt, w_jolt)
    }

    /// Contact-frame impulse for a frictionless contact.
    ///
    /// The impulse acts along the normal only:
    /// `j = Δv_n / Σ(M⁻¹ + ((I_w⁻¹ · (r × N̂)) × r) · N̂)`.
    fn impulse_frictionless(&self, bodies: &[RigidBody]) -> Vector3<f64> {
        let mut inverse_reduced_mass = 0.0;

        if let Some(a) = self.body_a {
            let body = &bodies[a.index()];
            inverse_reduced_mass += body.inverse_mass;
            inverse_reduced_mass += (body.inverse_inertia_world
                * self.relative_position[0].cross(&self.normal))
            .cross(&self.relative_position[0])
            .dot(&self.normal);
        }
        if let Some(b) = self.body_b {
            let body = &bodies[b.index()];
            inverse_reduced_mass += body.inverse_mass;
            inverse_reduced_mass += (body.inverse_inertia_world
                * self.relative_position[1].cross(&self.normal))
            .cross(&self.relative_position[1])
            .dot(&self.normal);
        }

        if inverse_reduced_mass <= 0.0 {
            // Two immovable bodies; nothing an impulse could change.
            return Vector3::zeros();
        }

        Vector3::new(self.bouncing_velocity / inverse_reduced_mass, 0.0, 0.0)
    }

    /// Contact-frame impulse in the general case, projected back onto the
    /// Coulomb friction cone when the tangential component exceeds it.
    fn impulse_with_friction(&self, bodies: &[RigidBody]) -> Vector3<f64> {
        let Some(a) = self.body_a else {
            return Vector3::zeros();
        };
        let body_a = &bodies[a.index()];

        // Unit-impulse-to-velocity matrix in world frame:
        // dV = -(r × I_w⁻¹) × r, summed over both bodies.
        let skew_a = self.relative_position[0].cross_matrix();
        let mut delta_v_world = -(skew_a * body_a.inverse_inertia_world * skew_a);

        let mut inverse_reduced_mass = body_a.inverse_mass;

        if let Some(b) = self.body_b {
            let body_b = &bodies[b.index()];
            let skew_b = self.relative_position[1].cross_matrix();
            delta_v_world += -(skew_b * body_b.inverse_inertia_world * skew_b);
            inverse_reduced_mass += body_b.inverse_mass;
        }

        // Change of basis into contact coordinates, plus the linear term of
        // the inverse reduced mass on the diagonal.
        let mut delta_v_contact: Matrix3<f64> =
            self.to_world.transpose() * delta_v_world * self.to_world;
        delta_v_contact[(0, 0)] += inverse_reduced_mass;
        delta_v_contact[(1, 1)] += inverse_reduced_mass;
        delta_v_contact[(2, 2)] += inverse_reduced_mass;

        // Target velocity change: bounce along the normal, kill the slide.
        let target = Vector3::new(self.bouncing_velocity, -self.velocity.y, -self.velocity.z);
        let mut impulse = frame::invert_or_zero(&delta_v_contact) * target;

        let tangential = (impulse.y * impulse.y + impulse.z * impulse.z).sqrt();
        if tangential > impulse.x * self.friction {
            // The static cone is violated; slide with dynamic friction along
            // the tangential direction instead.
            impulse.y /= tangential;
            impulse.z /= tangential;

            let effective_inverse_mass = delta_v_contact[(0, 0)]
                + delta_v_contact[(0, 1)] * self.friction * impulse.y
                + delta_v_contact[(0, 2)] * self.friction * impulse.z;
            let normal_impulse = self.bouncing_velocity / effective_inverse_mass;

            impulse.x = normal_impulse;
            impulse.y *= self.friction * normal_impulse;
            impulse.z *= self.friction * normal_impulse;
        }

        impulse
    }
}
