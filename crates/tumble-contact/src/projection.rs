//! Iterative position projection.
//!
//! After impulse transfer has fixed the velocities, residual
//! interpenetrations are removed by non-physical position and orientation
//! jolts, always resolving the deepest contact first. Each projection is
//! split between the two bodies in proportion to their linear and angular
//! inverse inertias along the contact normal, and the penetrations of
//! neighboring contacts are adjusted for the displacement.

use nalgebra::{Quaternion, Vector3};
use tumble_types::{frame, RigidBody};

use crate::contact::Contact;
use crate::impulse::activate_lone_inactive;
use crate::registry::ContactRegistry;

/// Default penetration tolerance when the caller passes 0.
const DEFAULT_POSITION_EPS: f64 = 1e-2;

/// Limit on the angular share of a projection, as a fraction of the lever
/// arm. Prevents large spurious rotations when the mass is large and the
/// inertia tensor small.
const ANGULAR_LIMIT: f64 = 0.3;

/// Resolve residual penetrations with the position projection method.
///
/// Passing 0 for `max_iterations` selects the default cap of eight times the
/// contact count; passing 0.0 for `eps` selects the default tolerance of
/// 0.01. Hitting the iteration cap leaves an accepted residual.
#[allow(clippy::float_cmp)]
pub fn position_projections(
    registry: &mut ContactRegistry,
    bodies: &mut [RigidBody],
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
    let eps = if eps == 0.0 { DEFAULT_POSITION_EPS } else { eps };
    let relaxation = registry.relaxation;

    for iteration in 0..max_iterations {
        let Some(index) = registry.find_largest_penetration(eps) else {
            tracing::trace!(target: "tumble", iteration, "position projections converged");
            break;
        };

        let (pair_a, pair_b) = {
            let contact = &registry.contacts()[index];
            (contact.body_a, contact.body_b)
        };
        activate_lone_inactive(bodies, pair_a, pair_b);

        let (x_jolt, q_jolt) = registry.contacts_mut()[index].apply_projection(bodies, relaxation);

        // Moving the bodies changes how deep every contact that shares a
        // body sits; adjust their penetrations by the projected displacement.
        let pair = [pair_a, pair_b];
        for contact in registry.contacts_mut() {
            let slots = [contact.body_a, contact.body_b];
            for (slot, slot_body) in slots.iter().enumerate() {
                let Some(slot_body) = slot_body else { continue };

                for (jolt, pair_body) in pair.iter().enumerate() {
                    if Some(*slot_body) != *pair_body {
                        continue;
                    }

                    let delta_position =
                        x_jolt[jolt] + q_jolt[jolt].cross(&contact.relative_position[slot]);
                    let along_normal = delta_position.dot(&contact.normal);

                    // Positive for the second slot: moving B along the
                    // normal deepens the contact, moving A resolves it.
                    contact.penetration += if slot == 1 { along_normal } else { -along_normal };
                }
            }
        }
    }
}

impl Contact {
    /// Apply the position/orientation jolts resolving this contact and
    /// return them per body slot.
    #[allow(clippy::float_cmp)]
    pub(crate) fn apply_projection(
        &mut self,
        bodies: &mut [RigidBody],
        relaxation: f64,
    ) -> ([Vector3<f64>; 2], [Vector3<f64>; 2]) {
        let mut x_jolt = [Vector3::zeros(); 2];
        let mut q_jolt = [Vector3::zeros(); 2];

        let ids = [self.body_a, self.body_b];

        // Inverse inertia of each body along the contact normal, split into
        // its linear and angular components.
        let mut inverse_angular_inertia = [0.0; 2];
        let mut inverse_total_inertia = 0.0;

        for (i, id) in ids.iter().enumerate() {
            let Some(id) = id else { continue };
            let body = &bodies[id.index()];

            inverse_angular_inertia[i] = (body.inverse_inertia_world
                * self.relative_position[i].cross(&self.normal))
            .cross(&self.relative_position[i])
            .dot(&self.normal);

            inverse_total_inertia += body.inverse_mass + inverse_angular_inertia[i];
        }

        if inverse_total_inertia <= 0.0 {
            // Both sides immovable; no projection can help.
            return (x_jolt, q_jolt);
        }

        for (i, id) in ids.iter().enumerate() {
            let Some(id) = id else { continue };
            let body = &mut bodies[id.index()];

            // A resolves by +penetration along the normal, B by -penetration.
            let mut penetration = if i == 0 { self.penetration } else { -self.penetration };
            if relaxation > 0.0 && relaxation <= 1.0 {
                penetration *= 1.0 - relaxation;
            }

            let mut delta_x = penetration * (body.inverse_mass / inverse_total_inertia);
            let mut delta_q = penetration * (inverse_angular_inertia[i] / inverse_total_inertia);

            // Limit the angular share and pour the excess back into the
            // linear movement.
            let lever = self.relative_position[i]
                - self.normal * self.relative_position[i].dot(&self.normal);
            let max_q = ANGULAR_LIMIT * lever.norm();

            if delta_q < -max_q {
                delta_x = (delta_x + delta_q) + max_q;
                delta_q = -max_q;
            } else if delta_q > max_q {
                delta_x = (delta_x + delta_q) - max_q;
                delta_q = max_q;
            }

            x_jolt[i] = self.normal * delta_x;
            body.position += x_jolt[i];

            if delta_q != 0.0 && inverse_angular_inertia[i] != 0.0 {
                q_jolt[i] = body.inverse_inertia_world
                    * self.relative_position[i].cross(&self.normal)
                    * (delta_q / inverse_angular_inertia[i]);

                // Q ← normalize(Q + ½·Ω̂·Q), then rebuild the derived state.
                let raw = body.orientation.quaternion()
                    + Quaternion::from_imag(q_jolt[i]) * body.orientation.quaternion() * 0.5;
                body.orientation = frame::normalize_or_identity(raw);
                body.refresh_derived();
            }
        }

        (x_jolt, q_jolt)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, UnitQuaternion};
    use tumble_types::BodyId;

    fn sphere_with_mass(position: Vector3<f64>, mass: f64) -> RigidBody {
        let mut body = RigidBody::new();
        body.set_mass(mass);
        let i = 0.4 * mass;
        body.set_moment_of_inertia(&Matrix3::from_diagonal(&Vector3::new(i, i, i)));
        body.set_state(position, UnitQuaternion::identity(), Vector3::zeros(), Vector3::zeros());
        body.activate();
        body
    }

    #[test]
    fn scenery_projection_pushes_the_body_out() {
        // Sphere sunk 0.1 into the ground, contact straight below the center
        // so the lever arm is parallel to the normal and no rotation occurs.
        let mut bodies = [sphere_with_mass(Vector3::new(0.0, 0.9, 0.0), 1.0)];
        let mut registry = ContactRegistry::new(4);
        registry.relaxation = 0.0; // full projection in one pass
        registry.register_new_contact(
            Some(BodyId::new(0)),
            None,
            Vector3::new(0.0, -0.05, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            0.1,
        );
        registry.update_derived(&bodies, 0.01);

        position_projections(&mut registry, &mut bodies, 0, 0.0);

        assert_relative_eq!(bodies[0].position.y, 1.0, epsilon = 1e-9);
        let contact = registry.get(0).expect("contact exists");
        assert!(contact.penetration <= 1e-9);
    }

    #[test]
    fn relaxation_spreads_the_correction_over_iterations() {
        let mut bodies = [sphere_with_mass(Vector3::new(0.0, 0.9, 0.0), 1.0)];
        let mut registry = ContactRegistry::new(4);
        registry.relaxation = 0.2;
        registry.register_new_contact(
            Some(BodyId::new(0)),
            None,
            Vector3::new(0.0, -0.05, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            0.1,
        );
        registry.update_derived(&bodies, 0.01);

        position_projections(&mut registry, &mut bodies, 0, 0.0);

        // The default cap of 8 iterations at 80% correction each leaves the
        // residual below the tolerance.
        let contact = registry.get(0).expect("contact exists");
        assert!(contact.penetration <= DEFAULT_POSITION_EPS + 1e-12);
        assert!(bodies[0].position.y > 0.98);
        assert!(bodies[0].position.y <= 1.0 + 1e-9);
    }

    #[test]
    fn projection_splits_by_inverse_mass() {
        // A light and a heavy sphere overlapping along x.
        let mut bodies = [
            sphere_with_mass(Vector3::new(-0.9, 0.0, 0.0), 1.0),
            sphere_with_mass(Vector3::new(0.9, 0.0, 0.0), 9.0),
        ];
        let mut registry = ContactRegistry::new(4);
        registry.relaxation = 0.0;
        // Sphere/sphere convention: normal along X_A - X_B = -x.
        registry.register_new_contact(
            Some(BodyId::new(0)),
            Some(BodyId::new(1)),
            Vector3::zeros(),
            Vector3::new(-1.0, 0.0, 0.0),
            0.2,
        );
        registry.update_derived(&bodies, 0.01);

        position_projections(&mut registry, &mut bodies, 0, 0.0);

        let moved_a = (bodies[0].position.x - (-0.9)).abs();
        let moved_b = (bodies[1].position.x - 0.9).abs();

        // Lever arms are parallel to the normal, so the split is purely by
        // inverse mass: 0.9 vs 0.1 of the 0.2 penetration.
        assert_relative_eq!(moved_a, 0.18, epsilon = 1e-9);
        assert_relative_eq!(moved_b, 0.02, epsilon = 1e-9);
        // A moves away from B (toward -x), B away from A (toward +x).
        assert!(bodies[0].position.x < -0.9);
        assert!(bodies[1].position.x > 0.9);
    }

    #[test]
    fn immovable_pair_is_left_alone() {
        let mut bodies = [
            sphere_with_mass(Vector3::new(-0.9, 0.0, 0.0), 1e30),
            sphere_with_mass(Vector3::new(0.9, 0.0, 0.0), 1e30),
        ];
        // Zero inertia inverse as well.
        bodies[0].set_moment_of_inertia(&Matrix3::zeros());
        bodies[1].set_moment_of_inertia(&Matrix3::zeros());
        bodies[0].refresh_derived();
        bodies[1].refresh_derived();

        let mut registry = ContactRegistry::new(4);
        registry.register_new_contact(
            Some(BodyId::new(0)),
            Some(BodyId::new(1)),
            Vector3::zeros(),
            Vector3::new(-1.0, 0.0, 0.0),
            0.2,
        );
        registry.update_derived(&bodies, 0.01);

        position_projections(&mut registry, &mut bodies, 4, 0.0);

        assert_eq!(bodies[0].position.x, -0.9);
        assert_eq!(bodies[1].position.x, 0.9);
    }
}
