//! Sphere detectors: sphere/sphere, sphere/half-space, sphere/true-plane.

use nalgebra::Vector3;
use tumble_contact::ContactRegistry;
use tumble_types::RigidBody;

use crate::geometry::Geometry;

/// Sphere against a half-space.
///
/// Registers a single contact at the sphere surface point closest to the
/// plane, with the plane normal and penetration equal to how far the sphere
/// dips into the half-space.
pub(crate) fn sphere_half_space(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    sphere: &Geometry,
    radius: f64,
    normal: Vector3<f64>,
    offset: f64,
) -> usize {
    if !registry.has_space() {
        return 0;
    }

    let position = sphere.position(bodies);
    let distance = normal.dot(&position) - radius - offset;

    if distance >= 0.0 {
        return 0;
    }

    registry.register_new_contact(
        sphere.body,
        None, // scenery
        position - normal * (distance + radius),
        normal,
        -distance,
    )
}

/// Sphere against a two-sided plane.
///
/// The normal is flipped toward the side of the plane the sphere center is
/// on, so the contact always pushes the sphere away from the plane.
pub(crate) fn sphere_true_plane(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    sphere: &Geometry,
    radius: f64,
    normal: Vector3<f64>,
    offset: f64,
) -> usize {
    if !registry.has_space() {
        return 0;
    }

    let position = sphere.position(bodies);
    let distance = normal.dot(&position) - offset;

    if distance * distance > radius * radius {
        return 0;
    }

    let mut contact_normal = normal;
    let mut penetration = -distance;
    if distance < 0.0 {
        contact_normal = -contact_normal;
        penetration = -penetration;
    }
    penetration += radius;

    registry.register_new_contact(
        sphere.body,
        None, // scenery
        position - normal * distance,
        contact_normal,
        penetration,
    )
}

/// Sphere against sphere.
///
/// The contact sits halfway along the center displacement with the normal
/// along `X_A − X_B`.
pub(crate) fn sphere_sphere(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    a: &Geometry,
    radius_a: f64,
    b: &Geometry,
    radius_b: f64,
) -> usize {
    if !registry.has_space() {
        return 0;
    }

    let position_a = a.position(bodies);
    let position_b = b.position(bodies);

    let displacement = position_a - position_b;
    let distance = displacement.norm();

    // Coincident centers leave no usable normal.
    if distance >= radius_a + radius_b || distance <= 0.0 {
        return 0;
    }

    registry.register_new_contact(
        a.body,
        b.body,
        position_b + displacement * 0.5,
        displacement * (1.0 / distance),
        radius_a + radius_b - distance,
    )
}
