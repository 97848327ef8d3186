//! A single contact and its derived quantities.

use nalgebra::{Matrix3, Vector3};
use tumble_types::{BodyId, RigidBody};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative normal velocity below which restitution is suppressed.
///
/// Without this cutoff resting contacts keep micro-bouncing on the velocity
/// induced by one step of gravity.
pub(crate) const LOW_VELOCITY_LIMIT: f64 = 0.25;

/// A contact between two bodies, or between a body and static scenery.
///
/// The detection phase fills the state fields; the resolvers work on the
/// derived fields computed by [`Contact::update_derived`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// First body. Always present after [`Contact::update_derived`].
    pub body_a: Option<BodyId>,
    /// Second body; `None` for a collision with scenery.
    pub body_b: Option<BodyId>,
    /// Contact point in world frame.
    pub position: Vector3<f64>,
    /// Contact normal in world frame.
    pub normal: Vector3<f64>,
    /// Penetration depth at the contact point.
    pub penetration: f64,
    /// Restitution coefficient for this contact.
    pub restitution: f64,
    /// Friction coefficient for this contact.
    pub friction: f64,

    /// Contact-to-world basis; column 0 is the normal, columns 1 and 2 span
    /// the tangent plane.
    pub(crate) to_world: Matrix3<f64>,
    /// Contact point relative to each body center.
    pub(crate) relative_position: [Vector3<f64>; 2],
    /// Relative velocity `v_A - v_B` at the contact point, in contact frame.
    pub(crate) velocity: Vector3<f64>,
    /// Required change in normal velocity to resolve the contact.
    pub(crate) bouncing_velocity: f64,
}

impl Contact {
    /// Create a contact with empty derived state.
    #[must_use]
    pub fn new(
        body_a: Option<BodyId>,
        body_b: Option<BodyId>,
        position: Vector3<f64>,
        normal: Vector3<f64>,
        penetration: f64,
        restitution: f64,
        friction: f64,
    ) -> Self {
        Self {
            body_a,
            body_b,
            position,
            normal,
            penetration,
            restitution,
            friction,
            to_world: Matrix3::identity(),
            relative_position: [Vector3::zeros(); 2],
            velocity: Vector3::zeros(),
            bouncing_velocity: 0.0,
        }
    }

    /// Whether this contact is with static scenery.
    #[must_use]
    pub fn with_scenery(&self) -> bool {
        self.body_b.is_none()
    }

    /// Relative contact-frame velocity (derived; valid after
    /// [`Contact::update_derived`]).
    #[must_use]
    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// Desired bouncing velocity (derived; valid after
    /// [`Contact::update_derived`]).
    #[must_use]
    pub fn bouncing_velocity(&self) -> f64 {
        self.bouncing_velocity
    }

    /// Recompute the derived quantities from the contact state.
    ///
    /// Normalizes the body slots so that `body_a` is always present (swapping
    /// and flipping the normal when the detection phase put scenery first),
    /// builds the contact basis, the relative positions, the contact-frame
    /// relative velocity and the bouncing velocity.
    pub fn update_derived(&mut self, bodies: &[RigidBody], h: f64) {
        if self.body_a.is_none() {
            self.normal = -self.normal;
            std::mem::swap(&mut self.body_a, &mut self.body_b);
        }
        let Some(a) = self.body_a else {
            return;
        };

        self.to_world = contact_basis(&self.normal);

        let body_a = &bodies[a.index()];
        self.relative_position[0] = self.position - body_a.position;
        self.velocity = self.point_velocity(body_a, self.relative_position[0], h);

        if let Some(b) = self.body_b {
            let body_b = &bodies[b.index()];
            self.relative_position[1] = self.position - body_b.position;
            self.velocity -= self.point_velocity(body_b, self.relative_position[1], h);
        }

        self.bouncing_velocity = self.compute_bouncing_velocity(bodies, h);
    }

    /// Velocity of the contact point on one body, in contact coordinates.
    ///
    /// The force-induced velocity of the last step contributes only its
    /// tangential components; the normal part is handled separately by the
    /// bounce correction.
    fn point_velocity(&self, body: &RigidBody, relative_position: Vector3<f64>, h: f64) -> Vector3<f64> {
        let v_world = body.velocity + body.angular_velocity.cross(&relative_position);
        let v = self.to_world.transpose() * v_world;

        let dv_world = body.inverse_mass * body.force * h;
        let mut dv = self.to_world.transpose() * dv_world;
        dv.x = 0.0;

        v + dv
    }

    /// Bouncing velocity `-(1 + ε)·V_c.x + ε·ΔV_force`, with restitution
    /// suppressed when the closing velocity net of the force-induced part is
    /// below [`LOW_VELOCITY_LIMIT`].
    pub(crate) fn compute_bouncing_velocity(&self, bodies: &[RigidBody], h: f64) -> f64 {
        let mut dv_from_force = 0.0;

        if let Some(a) = self.body_a {
            let body = &bodies[a.index()];
            if body.is_active {
                dv_from_force += (body.inverse_mass * body.force * h).dot(&self.normal);
            }
        }
        if let Some(b) = self.body_b {
            let body = &bodies[b.index()];
            if body.is_active {
                dv_from_force -= (body.inverse_mass * body.force * h).dot(&self.normal);
            }
        }

        let restitution = if (self.velocity.x - dv_from_force).abs() < LOW_VELOCITY_LIMIT {
            0.0
        } else {
            self.restitution
        };

        -(1.0 + restitution) * self.velocity.x + restitution * dv_from_force
    }
}

/// Build an orthonormal basis at a contact point.
///
/// Column 0 is the contact normal; the two tangents are chosen against the
/// world axis the normal is furthest from, so the construction never
/// degenerates for a unit normal.
#[must_use]
pub fn contact_basis(normal: &Vector3<f64>) -> Matrix3<f64> {
    let tangent_y;
    let mut tangent_z;

    if normal.x.abs() > normal.y.abs() {
        let length = 1.0 / (normal.z * normal.z + normal.x * normal.x).sqrt();

        tangent_y = Vector3::new(normal.z * length, 0.0, -normal.x * length);
        tangent_z = Vector3::new(
            normal.y * tangent_y.x,
            normal.z * tangent_y.x - normal.x * tangent_y.z,
            -normal.y * tangent_y.x,
        );
    } else {
        let length = 1.0 / (normal.z * normal.z + normal.y * normal.y).sqrt();

        tangent_y = Vector3::new(0.0, -normal.z * length, normal.y * length);
        tangent_z = Vector3::new(
            normal.y * tangent_y.z - normal.z * tangent_y.y,
            -normal.x * tangent_y.z,
            normal.x * tangent_y.y,
        );
    }
    if let Some(unit) = tangent_z.try_normalize(0.0) {
        tangent_z = unit;
    }

    Matrix3::from_columns(&[*normal, tangent_y, tangent_z])
}
