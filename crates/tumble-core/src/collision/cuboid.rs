//! Cuboid detectors: cuboid/sphere, cuboid/half-space, cuboid/cuboid (SAT)
//! and the cuboid/point containment check.

use nalgebra::Vector3;
use tumble_contact::ContactRegistry;
use tumble_types::{Frame, RigidBody};

use crate::geometry::{Geometry, Shape};

use super::{frame_of, unit_or_zero, PARALLEL_EPS};

/// Vertex sign table for the eight cuboid corners.
const VERTICES: [[f64; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0],
];

/// Sum of the cuboid's half-extent projections onto a direction.
fn project_on(frame: &Frame, half_extent: &Vector3<f64>, direction: &Vector3<f64>) -> f64 {
    half_extent.x * direction.dot(&frame.axis(0)).abs()
        + half_extent.y * direction.dot(&frame.axis(1)).abs()
        + half_extent.z * direction.dot(&frame.axis(2)).abs()
}

/// Cuboid against a sphere.
///
/// The sphere center is clamped to the cuboid in its body frame; the closest
/// point becomes the contact point.
pub(crate) fn cuboid_sphere(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    cuboid: &Geometry,
    half_extent: Vector3<f64>,
    sphere: &Geometry,
    radius: f64,
) -> usize {
    let frame = frame_of(cuboid, bodies);
    let center = sphere.position(bodies);
    let relative_center = frame.inverse_transform_point(&center);

    // Early out on the per-axis bounding check.
    if relative_center.x.abs() - radius > half_extent.x
        || relative_center.y.abs() - radius > half_extent.y
        || relative_center.z.abs() - radius > half_extent.z
    {
        return 0;
    }

    let closest_point = Vector3::new(
        relative_center.x.clamp(-half_extent.x, half_extent.x),
        relative_center.y.clamp(-half_extent.y, half_extent.y),
        relative_center.z.clamp(-half_extent.z, half_extent.z),
    );

    let squared_distance = (closest_point - relative_center).norm_squared();
    if squared_distance > radius * radius {
        return 0;
    }
    let distance = squared_distance.sqrt();

    let closest_point_world = frame.transform_point(&closest_point);

    registry.register_new_contact(
        cuboid.body,
        sphere.body,
        closest_point_world,
        unit_or_zero(closest_point_world - center),
        radius - distance,
    )
}

/// Cuboid against a half-space.
///
/// When a cuboid axis is effectively parallel to the plane, a single contact
/// at the midpoint of the most-inside edge or face is registered. Otherwise
/// every penetrating vertex yields a contact halfway between the vertex and
/// the plane. The switch between the two paths happens at the parallelism
/// threshold `1e-4` and is discontinuous by construction.
pub(crate) fn cuboid_half_space(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    cuboid: &Geometry,
    half_extent: Vector3<f64>,
    normal: Vector3<f64>,
    offset: f64,
) -> usize {
    if !registry.has_space() {
        return 0;
    }

    let frame = frame_of(cuboid, bodies);

    // Quick rejection on the projected radius.
    let projected_radius = project_on(&frame, &half_extent, &normal);
    let distance = normal.dot(&frame.position()) - projected_radius;
    if distance > offset {
        return 0;
    }

    let axis_n = Vector3::new(
        frame.axis(0).dot(&normal),
        frame.axis(1).dot(&normal),
        frame.axis(2).dot(&normal),
    );

    let mut contact_point = Vector3::zeros();
    let mut parallel_count = 0;

    for i in 0..3 {
        if axis_n[i].abs() < PARALLEL_EPS {
            // Edge almost parallel to the plane: keep the edge midpoint.
            parallel_count += 1;
        } else {
            // Pick the vertex coordinate closest to the plane.
            contact_point[i] = if axis_n[i] < 0.0 {
                half_extent[i]
            } else {
                -half_extent[i]
            };
        }
    }

    if parallel_count > 0 {
        let contact_point = frame.transform_point(&contact_point);
        let penetration = offset - contact_point.dot(&normal);

        return registry.register_new_contact(
            cuboid.body,
            None, // scenery
            contact_point + 0.5 * penetration * normal,
            normal,
            penetration,
        );
    }

    // No parallel axes: scan all eight vertices and register one contact per
    // penetrating vertex, halfway between the vertex and the plane.
    let mut contact_count = 0;

    for signs in &VERTICES {
        if !registry.has_space() {
            break;
        }

        let vertex = Vector3::new(
            signs[0] * half_extent.x,
            signs[1] * half_extent.y,
            signs[2] * half_extent.z,
        );
        let vertex_world = frame.transform_point(&vertex);

        let penetration = offset - vertex_world.dot(&normal);
        if penetration >= 0.0 {
            contact_count += registry.register_new_contact(
                cuboid.body,
                None, // scenery
                vertex_world + 0.5 * penetration * normal,
                normal,
                penetration,
            );
        }
    }

    contact_count
}

/// Cuboid containment check against a world point.
///
/// Registers a scenery contact on the face of least penetration when the
/// point is inside the cuboid.
pub fn cuboid_point(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    cuboid: &Geometry,
    point: Vector3<f64>,
) -> usize {
    let Shape::Cuboid { half_extent } = cuboid.shape else {
        return 0;
    };
    let frame = frame_of(cuboid, bodies);

    let relative = frame.inverse_transform_point(&point);

    let mut normal = Vector3::zeros();
    let mut min_depth = f64::MAX;

    for i in 0..3 {
        let depth = half_extent[i] - relative[i].abs();
        if depth < 0.0 {
            return 0;
        }
        if depth < min_depth {
            min_depth = depth;
            normal = if relative[i] < 0.0 {
                -frame.axis(i)
            } else {
                frame.axis(i)
            };
        }
    }

    registry.register_new_contact(cuboid.body, None, point, normal, min_depth)
}

/// Cuboid against cuboid with the separating axis theorem.
///
/// Fifteen candidate axes are tested: the three axes of each body and the
/// nine pairwise cross products. Any axis with no overlap proves separation;
/// otherwise the axis with the smallest penetration decides the contact
/// class (vertex/face for a body axis, edge/edge for a cross product).
pub(crate) fn cuboid_cuboid(
    registry: &mut ContactRegistry,
    bodies: &[RigidBody],
    a: &Geometry,
    half_extent_a: Vector3<f64>,
    b: &Geometry,
    half_extent_b: Vector3<f64>,
) -> usize {
    let frame_a = frame_of(a, bodies);
    let frame_b = frame_of(b, bodies);
    let displacement = frame_b.position() - frame_a.position();

    let mut sat = SatState {
        smallest_penetration: f64::MAX,
        axis_index_a: None,
        axis_index_b: None,
    };

    for i in 0..3 {
        if !sat.check_axis(
            &frame_a,
            &half_extent_a,
            &frame_b,
            &half_extent_b,
            &displacement,
            frame_a.axis(i),
            Some(i),
            None,
        ) {
            return 0;
        }
    }
    for i in 0..3 {
        if !sat.check_axis(
            &frame_a,
            &half_extent_a,
            &frame_b,
            &half_extent_b,
            &displacement,
            frame_b.axis(i),
            None,
            Some(i),
        ) {
            return 0;
        }
    }

    // Remember which body owned the best face axis before the cross
    // products; the edge/face fallback keeps that body's edge endpoint.
    let use_a = sat.axis_index_b.is_some();

    for i in 0..3 {
        for j in 0..3 {
            if !sat.check_axis(
                &frame_a,
                &half_extent_a,
                &frame_b,
                &half_extent_b,
                &displacement,
                frame_a.axis(i).cross(&frame_b.axis(j)),
                Some(i),
                Some(j),
            ) {
                return 0;
            }
        }
    }

    let smallest_penetration = sat.smallest_penetration;
    match (sat.axis_index_a, sat.axis_index_b) {
        // Vertex of B against a face of A.
        (Some(index), None) => register_face_contact(
            registry,
            a,
            &frame_a,
            &half_extent_a,
            b,
            &frame_b,
            &half_extent_b,
            displacement,
            frame_a.axis(index),
            smallest_penetration,
        ),
        // Vertex of A against a face of B.
        (None, Some(index)) => register_face_contact(
            registry,
            b,
            &frame_b,
            &half_extent_b,
            a,
            &frame_a,
            &half_extent_a,
            -displacement,
            frame_b.axis(index),
            smallest_penetration,
        ),
        // Edge of A against edge of B.
        (Some(index_a), Some(index_b)) => {
            let axis_a = frame_a.axis(index_a);
            let axis_b = frame_b.axis(index_b);

            let mut normal = unit_or_zero(axis_a.cross(&axis_b));
            if normal.dot(&displacement) > 0.0 {
                normal = -normal;
            }

            // Midpoint of each involved edge, nudged toward the other body
            // on the non-parallel axes.
            let mut point_on_edge_a = Vector3::zeros();
            let mut point_on_edge_b = Vector3::zeros();

            for i in 0..3 {
                if i != index_a {
                    let along = frame_a.axis(i).dot(&normal);
                    if along.abs() > PARALLEL_EPS {
                        point_on_edge_a[i] = if along > 0.0 {
                            -half_extent_a[i]
                        } else {
                            half_extent_a[i]
                        };
                    }
                }
                if i != index_b {
                    let along = frame_b.axis(i).dot(&normal);
                    if along.abs() > PARALLEL_EPS {
                        point_on_edge_b[i] = if along > 0.0 {
                            half_extent_b[i]
                        } else {
                            -half_extent_b[i]
                        };
                    }
                }
            }

            let contact_point = contact_point_on_edges(
                frame_a.transform_point(&point_on_edge_a),
                axis_a,
                half_extent_a[index_a],
                frame_b.transform_point(&point_on_edge_b),
                axis_b,
                half_extent_b[index_b],
                use_a,
            );

            registry.register_new_contact(a.body, b.body, contact_point, normal, smallest_penetration)
        }
        (None, None) => 0,
    }
}

/// Running state of the separating axis scan: the smallest positive
/// penetration seen so far and which body axes produced it.
struct SatState {
    smallest_penetration: f64,
    axis_index_a: Option<usize>,
    axis_index_b: Option<usize>,
}

impl SatState {
    /// Test one candidate axis.
    ///
    /// Returns false when the axis separates the cuboids; degenerate axes
    /// pass vacuously, and a smaller positive penetration takes over the
    /// tracked winner (strictly smaller, so the first axis wins ties).
    #[allow(clippy::too_many_arguments)]
    fn check_axis(
        &mut self,
        frame_a: &Frame,
        half_extent_a: &Vector3<f64>,
        frame_b: &Frame,
        half_extent_b: &Vector3<f64>,
        displacement: &Vector3<f64>,
        axis: Vector3<f64>,
        tag_a: Option<usize>,
        tag_b: Option<usize>,
    ) -> bool {
        // Skip almost parallel cross products.
        if axis.norm_squared() < PARALLEL_EPS {
            return true;
        }
        let direction = axis.normalize();

        let penetration = project_on(frame_a, half_extent_a, &direction)
            + project_on(frame_b, half_extent_b, &direction)
            - displacement.dot(&direction).abs();

        if penetration < 0.0 {
            return false;
        }
        if penetration < self.smallest_penetration {
            self.smallest_penetration = penetration;
            self.axis_index_a = tag_a;
            self.axis_index_b = tag_b;
        }
        true
    }
}

/// Register the single vertex/face contact for a winning body axis.
///
/// `face` owns the face, `other` supplies the vertex; `displacement` points
/// from the face owner's center to the other body's center. A vertex
/// coordinate on an axis effectively normal to the contact normal collapses
/// to the midpoint of the overlap interval on that axis.
#[allow(clippy::too_many_arguments)]
fn register_face_contact(
    registry: &mut ContactRegistry,
    face: &Geometry,
    face_frame: &Frame,
    face_half_extent: &Vector3<f64>,
    other: &Geometry,
    other_frame: &Frame,
    other_half_extent: &Vector3<f64>,
    displacement: Vector3<f64>,
    axis: Vector3<f64>,
    penetration: f64,
) -> usize {
    // Orient the face normal toward the face owner's side.
    let mut normal = axis;
    if normal.dot(&displacement) > 0.0 {
        normal = -normal;
    }

    let axis_n = Vector3::new(
        other_frame.axis(0).dot(&normal),
        other_frame.axis(1).dot(&normal),
        other_frame.axis(2).dot(&normal),
    );

    // Find the vertex of the other cuboid closest along the normal.
    let mut contact_point = Vector3::zeros();

    for i in 0..3 {
        if axis_n[i].abs() < PARALLEL_EPS {
            // Edge almost normal to the contact normal: take the midpoint of
            // the overlap of both projections on this axis.
            let distance = -displacement.dot(&other_frame.axis(i));
            let projected_face = project_on(face_frame, face_half_extent, &other_frame.axis(i));
            let half_extent = other_half_extent[i];

            let left = (distance - projected_face).max(-half_extent);
            let right = (distance + projected_face).min(half_extent);
            let midpoint = 0.5 * (left + right);
            contact_point[i] = if midpoint.abs() < PARALLEL_EPS { 0.0 } else { midpoint };
        } else {
            contact_point[i] = if axis_n[i] > 0.0 {
                other_half_extent[i]
            } else {
                -other_half_extent[i]
            };
        }
    }

    registry.register_new_contact(
        face.body,
        other.body,
        other_frame.transform_point(&contact_point),
        normal,
        penetration,
    )
}

/// Closest approach of two edge segments, as the contact point.
///
/// When the nearest points fall outside either segment the contact
/// degenerates to edge/face and the retained endpoint is chosen by `use_a`.
/// Nearly parallel edges fall back to the same endpoint choice.
fn contact_point_on_edges(
    point_on_a: Vector3<f64>,
    axis_a: Vector3<f64>,
    half_a: f64,
    point_on_b: Vector3<f64>,
    axis_b: Vector3<f64>,
    half_b: f64,
    use_a: bool,
) -> Vector3<f64> {
    let squared_norm_a = axis_a.norm_squared();
    let squared_norm_b = axis_b.norm_squared();
    let dot_ab = axis_b.dot(&axis_a);

    let between = point_on_a - point_on_b;
    let along_a = between.dot(&axis_a);
    let along_b = between.dot(&axis_b);

    let denominator = squared_norm_a * squared_norm_b - dot_ab * dot_ab;
    if denominator.abs() < PARALLEL_EPS {
        return if use_a { point_on_a } else { point_on_b };
    }

    let mu_a = (dot_ab * along_b - squared_norm_b * along_a) / denominator;
    let mu_b = (squared_norm_a * along_b - dot_ab * along_a) / denominator;

    if mu_a > half_a || mu_a < -half_a || mu_b > half_b || mu_b < -half_b {
        if use_a {
            point_on_a
        } else {
            point_on_b
        }
    } else {
        (point_on_a + axis_a * mu_a) * 0.5 + (point_on_b + axis_b * mu_b) * 0.5
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_4;
    use tumble_types::BodyId;

    fn make_body(
        bodies: &mut Vec<RigidBody>,
        position: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
    ) -> BodyId {
        let mut body = RigidBody::new();
        body.set_mass(1.0);
        body.set_state(position, orientation, Vector3::zeros(), Vector3::zeros());
        bodies.push(body);
        BodyId::new(bodies.len() - 1)
    }

    fn cuboid_at(
        bodies: &mut Vec<RigidBody>,
        position: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        half_extent: Vector3<f64>,
    ) -> Geometry {
        let id = make_body(bodies, position, orientation);
        Geometry::new(Shape::cuboid(half_extent), Some(id))
    }

    fn sphere_at(bodies: &mut Vec<RigidBody>, position: Vector3<f64>, radius: f64) -> Geometry {
        let id = make_body(bodies, position, UnitQuaternion::identity());
        Geometry::new(Shape::sphere(radius), Some(id))
    }

    #[test]
    fn sphere_on_cuboid_face() {
        let mut bodies = Vec::new();
        let cuboid = cuboid_at(
            &mut bodies,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::new(0.5, 0.5, 0.5),
        );
        // Sphere above the top face, overlapping by 0.2.
        let sphere = sphere_at(&mut bodies, Vector3::new(0.0, 1.3, 0.0), 1.0);

        let mut registry = ContactRegistry::new(4);
        let count = cuboid_sphere(
            &mut registry,
            &bodies,
            &cuboid,
            Vector3::new(0.5, 0.5, 0.5),
            &sphere,
            1.0,
        );
        assert_eq!(count, 1);

        let contact = registry.get(0).expect("contact registered");
        assert_relative_eq!(contact.position, Vector3::new(0.0, 0.5, 0.0), epsilon = 1e-12);
        // Normal from the closest point toward the cuboid, away from the
        // sphere center.
        assert_relative_eq!(contact.normal, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(contact.penetration, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn sphere_clear_of_the_cuboid() {
        let mut bodies = Vec::new();
        let cuboid = cuboid_at(
            &mut bodies,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::new(0.5, 0.5, 0.5),
        );
        let sphere = sphere_at(&mut bodies, Vector3::new(0.0, 2.0, 0.0), 1.0);

        let mut registry = ContactRegistry::new(4);
        assert_eq!(
            cuboid_sphere(
                &mut registry,
                &bodies,
                &cuboid,
                Vector3::new(0.5, 0.5, 0.5),
                &sphere,
                1.0
            ),
            0
        );
    }

    #[test]
    fn axis_aligned_cuboid_on_half_space_yields_one_midpoint_contact() {
        let mut bodies = Vec::new();
        // Unit cube resting 0.1 into the ground, faces parallel to it.
        let cuboid = cuboid_at(
            &mut bodies,
            Vector3::new(0.0, 0.4, 0.0),
            UnitQuaternion::identity(),
            Vector3::new(0.5, 0.5, 0.5),
        );

        let mut registry = ContactRegistry::new(16);
        let count = cuboid_half_space(
            &mut registry,
            &bodies,
            &cuboid,
            Vector3::new(0.5, 0.5, 0.5),
            Vector3::y(),
            0.0,
        );

        // The x and z axes are parallel to the plane, so the bottom face
        // midpoint is the single contact.
        assert_eq!(count, 1);
        let contact = registry.get(0).expect("contact registered");
        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-12);
        assert_relative_eq!(contact.position.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(contact.position.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tilted_cuboid_on_half_space_yields_vertex_contacts() {
        let mut bodies = Vec::new();
        // Rotate about z by 45 degrees: no axis is parallel to the ground
        // when also tipped slightly about x.
        let orientation = UnitQuaternion::from_euler_angles(0.3, 0.0, FRAC_PI_4);
        let cuboid = cuboid_at(
            &mut bodies,
            Vector3::new(0.0, 0.5, 0.0),
            orientation,
            Vector3::new(0.5, 0.5, 0.5),
        );

        let mut registry = ContactRegistry::new(16);
        let count = cuboid_half_space(
            &mut registry,
            &bodies,
            &cuboid,
            Vector3::new(0.5, 0.5, 0.5),
            Vector3::y(),
            0.0,
        );

        // At least the lowest corner penetrates; every registered contact
        // reports a non-negative penetration and the plane normal.
        assert!(count >= 1);
        for i in 0..count {
            let contact = registry.get(i).expect("contact registered");
            assert!(contact.penetration >= 0.0);
            assert_relative_eq!(contact.normal, Vector3::y(), epsilon = 1e-12);
        }
    }

    #[test]
    fn separated_cuboids_produce_no_contact() {
        let mut bodies = Vec::new();
        let he = Vector3::new(0.5, 0.5, 0.5);
        let a = cuboid_at(&mut bodies, Vector3::zeros(), UnitQuaternion::identity(), he);
        let b = cuboid_at(
            &mut bodies,
            Vector3::new(2.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            he,
        );

        let mut registry = ContactRegistry::new(16);
        assert_eq!(cuboid_cuboid(&mut registry, &bodies, &a, he, &b, he), 0);
    }

    #[test]
    fn face_overlap_picks_the_least_penetration_axis() {
        let mut bodies = Vec::new();
        let he = Vector3::new(0.5, 0.5, 0.5);
        let a = cuboid_at(&mut bodies, Vector3::zeros(), UnitQuaternion::identity(), he);
        // Overlapping by 0.1 along x only.
        let b = cuboid_at(
            &mut bodies,
            Vector3::new(0.9, 0.0, 0.0),
            UnitQuaternion::identity(),
            he,
        );

        let mut registry = ContactRegistry::new(16);
        let count = cuboid_cuboid(&mut registry, &bodies, &a, he, &b, he);
        assert_eq!(count, 1);

        let contact = registry.get(0).expect("contact registered");
        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-12);
        // Normal flipped away from the displacement direction.
        assert_relative_eq!(contact.normal, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn diagonal_offset_cubes_report_a_single_shallow_contact() {
        let mut bodies = Vec::new();
        let he = Vector3::new(0.5, 0.5, 0.5);
        let a = cuboid_at(&mut bodies, Vector3::zeros(), UnitQuaternion::identity(), he);
        let b = cuboid_at(
            &mut bodies,
            Vector3::new(0.9, 0.9, 0.9),
            UnitQuaternion::identity(),
            he,
        );

        let mut registry = ContactRegistry::new(16);
        let count = cuboid_cuboid(&mut registry, &bodies, &a, he, &b, he);
        assert_eq!(count, 1);

        let contact = registry.get(0).expect("contact registered");
        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-12);
        // Identity orientations degenerate every cross product, so a body
        // axis wins and the normal is a coordinate axis.
        let n = contact.normal;
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert!(
            n.x.abs() > 0.999 || n.y.abs() > 0.999 || n.z.abs() > 0.999,
            "normal {n:?} should be a coordinate axis"
        );
    }

    #[test]
    fn rotated_cuboid_vertex_into_face() {
        let mut bodies = Vec::new();
        let he = Vector3::new(0.5, 0.5, 0.5);
        let a = cuboid_at(&mut bodies, Vector3::zeros(), UnitQuaternion::identity(), he);
        // Cube rotated 45 degrees about z approaches along x; its edge
        // reaches sqrt(2)/2 from its center.
        let b = cuboid_at(
            &mut bodies,
            Vector3::new(1.1, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4),
            he,
        );

        let mut registry = ContactRegistry::new(16);
        let count = cuboid_cuboid(&mut registry, &bodies, &a, he, &b, he);
        assert_eq!(count, 1);

        let contact = registry.get(0).expect("contact registered");
        // Expected overlap: 0.5 + sqrt(2)/2 - 1.1.
        let expected = 0.5 + std::f64::consts::FRAC_1_SQRT_2 - 1.1;
        assert_relative_eq!(contact.penetration, expected, epsilon = 1e-9);
        assert_relative_eq!(contact.normal, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn edge_points_clamp_to_the_segment_ends() {
        // Perpendicular edges crossing at a known point.
        let crossing = contact_point_on_edges(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::x(),
            1.0,
            Vector3::new(0.0, 0.1, 0.5),
            Vector3::z(),
            1.0,
            false,
        );
        // Nearest points are (0,0,0) on the first edge and (0,0.1,0) on the
        // second; the contact is their midpoint.
        assert_relative_eq!(crossing, Vector3::new(0.0, 0.05, 0.0), epsilon = 1e-12);

        // Out-of-bounds nearest point falls back to an endpoint.
        let fallback = contact_point_on_edges(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::x(),
            1.0,
            Vector3::new(5.0, 0.1, 0.0),
            Vector3::z(),
            1.0,
            true,
        );
        assert_relative_eq!(fallback, Vector3::new(0.0, 0.0, 0.0), epsilon = 1e-12);

        // Parallel edges use the endpoint chosen by the caller.
        let parallel = contact_point_on_edges(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::x(),
            1.0,
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::x(),
            1.0,
            false,
        );
        assert_relative_eq!(parallel, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn point_inside_cuboid_reports_least_depth_face() {
        let mut bodies = Vec::new();
        let cuboid = cuboid_at(
            &mut bodies,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::new(0.5, 1.0, 1.0),
        );

        let mut registry = ContactRegistry::new(4);
        // Closest to the +x face.
        let count = cuboid_point(&mut registry, &bodies, &cuboid, Vector3::new(0.4, 0.2, 0.0));
        assert_eq!(count, 1);

        let contact = registry.get(0).expect("contact registered");
        assert_relative_eq!(contact.normal, Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-12);

        // Outside point registers nothing.
        assert_eq!(
            cuboid_point(&mut registry, &bodies, &cuboid, Vector3::new(2.0, 0.0, 0.0)),
            0
        );
    }
}
