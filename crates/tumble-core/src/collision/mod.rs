//! Narrow-phase collision detection.
//!
//! [`detect`] dispatches on the unordered pair of shape variants and runs
//! the matching per-pair detector. Detectors append contacts to the registry
//! and return how many they registered; unsupported pairs are no-ops. The
//! registry's capacity is never exceeded: a full arena silently drops
//! further contacts.

mod cuboid;
mod sphere;

pub use cuboid::cuboid_point;

use nalgebra::Vector3;
use tumble_contact::ContactRegistry;
use tumble_types::{Frame, RigidBody};

use crate::geometry::{Geometry, Shape};

/// Squared-norm threshold under which an axis counts as degenerate and the
/// absolute threshold for treating an edge as parallel to a plane.
pub(crate) const PARALLEL_EPS: f64 = 1e-4;

/// World transform of a geometry: the body's frame, or identity for scenery.
pub(crate) fn frame_of(geometry: &Geometry, bodies: &[RigidBody]) -> Frame {
    match geometry.body {
        Some(id) => bodies[id.index()].to_world,
        None => Frame::identity(),
    }
}

/// Detect and register collisions between a pair of geometries.
///
/// Returns the number of contacts registered. The pair table:
///
/// | A \ B     | Sphere | Cuboid | HalfSpace | TruePlane |
/// |-----------|--------|--------|-----------|-----------|
/// | Sphere    | yes    | yes    | yes       | yes       |
/// | Cuboid    | yes    | yes    | yes       | —         |
/// | HalfSpace | yes    | yes    | —         | —         |
/// | TruePlane | yes    | —      | —         | —         |
pub fn detect(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    a: &Geometry,
    b: &Geometry,
) -> usize {
    if !registry.has_space() {
        return 0;
    }

    match (&a.shape, &b.shape) {
        (Shape::Sphere { radius: radius_a }, Shape::Sphere { radius: radius_b }) => {
            sphere::sphere_sphere(registry, bodies, a, *radius_a, b, *radius_b)
        }
        (Shape::Sphere { radius }, Shape::Cuboid { half_extent }) => {
            cuboid::cuboid_sphere(registry, bodies, b, *half_extent, a, *radius)
        }
        (Shape::Cuboid { half_extent }, Shape::Sphere { radius }) => {
            cuboid::cuboid_sphere(registry, bodies, a, *half_extent, b, *radius)
        }
        (Shape::Sphere { radius }, Shape::HalfSpace { normal, offset }) => {
            sphere::sphere_half_space(registry, bodies, a, *radius, *normal, *offset)
        }
        (Shape::HalfSpace { normal, offset }, Shape::Sphere { radius }) => {
            sphere::sphere_half_space(registry, bodies, b, *radius, *normal, *offset)
        }
        (Shape::Sphere { radius }, Shape::TruePlane { normal, offset }) => {
            sphere::sphere_true_plane(registry, bodies, a, *radius, *normal, *offset)
        }
        (Shape::TruePlane { normal, offset }, Shape::Sphere { radius }) => {
            sphere::sphere_true_plane(registry, bodies, b, *radius, *normal, *offset)
        }
        (
            Shape::Cuboid {
                half_extent: half_extent_a,
            },
            Shape::Cuboid {
                half_extent: half_extent_b,
            },
        ) => cuboid::cuboid_cuboid(registry, bodies, a, *half_extent_a, b, *half_extent_b),
        (Shape::Cuboid { half_extent }, Shape::HalfSpace { normal, offset }) => {
            cuboid::cuboid_half_space(registry, bodies, a, *half_extent, *normal, *offset)
        }
        (Shape::HalfSpace { normal, offset }, Shape::Cuboid { half_extent }) => {
            cuboid::cuboid_half_space(registry, bodies, b, *half_extent, *normal, *offset)
        }
        // Plane/plane pairs and cuboid/true-plane are not supported.
        _ => 0,
    }
}

/// Unit vector, or zero when the input is degenerate.
pub(crate) fn unit_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}
