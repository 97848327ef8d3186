//! Collision geometry: a tagged union of shapes with an optional rigid body.

use nalgebra::{Matrix3, Vector3};
use tumble_types::{BodyId, RigidBody};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a geometry in its world's geometry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryId(pub usize);

impl GeometryId {
    /// Create a geometry id from a raw arena index.
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

/// Shape of a collision geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Sphere with the given radius.
    Sphere {
        /// Sphere radius; must be positive.
        radius: f64,
    },
    /// Rectangular parallelepiped given by its half-extents along the local
    /// axes.
    Cuboid {
        /// Half-extent along each local axis; each must be positive.
        half_extent: Vector3<f64>,
    },
    /// The half-space `{p : n·p ≤ d}`; the normal points out of it.
    HalfSpace {
        /// Unit plane normal.
        normal: Vector3<f64>,
        /// Plane offset from the origin along the normal.
        offset: f64,
    },
    /// A two-sided plane `{p : n·p = d}`.
    TruePlane {
        /// Unit plane normal.
        normal: Vector3<f64>,
        /// Plane offset from the origin along the normal.
        offset: f64,
    },
}

impl Shape {
    /// Create a sphere shape.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a cuboid shape from its half-extents.
    #[must_use]
    pub fn cuboid(half_extent: Vector3<f64>) -> Self {
        Self::Cuboid { half_extent }
    }

    /// Create a half-space; the normal is normalized.
    #[must_use]
    pub fn half_space(normal: Vector3<f64>, offset: f64) -> Self {
        Self::HalfSpace {
            normal: normal.normalize(),
            offset,
        }
    }

    /// Create a two-sided plane; the normal is normalized.
    #[must_use]
    pub fn true_plane(normal: Vector3<f64>, offset: f64) -> Self {
        Self::TruePlane {
            normal: normal.normalize(),
            offset,
        }
    }

    /// Name of the shape variant, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Cuboid { .. } => "cuboid",
            Self::HalfSpace { .. } => "half-space",
            Self::TruePlane { .. } => "true-plane",
        }
    }

    /// Volume of the shape; `None` for the unbounded plane variants.
    #[must_use]
    pub fn volume(&self) -> Option<f64> {
        match self {
            Self::Sphere { radius } => {
                Some(4.0 / 3.0 * std::f64::consts::PI * radius * radius * radius)
            }
            Self::Cuboid { half_extent } => {
                Some(8.0 * half_extent.x * half_extent.y * half_extent.z)
            }
            Self::HalfSpace { .. } | Self::TruePlane { .. } => None,
        }
    }

    /// Principal moment of inertia tensor for the given mass; `None` for the
    /// plane variants, which carry no body.
    ///
    /// Sphere: `Ixx = Iyy = Izz = (2/5) m r²`. Cuboid: the standard diagonal
    /// `(m/12)(e_j² + e_k²)` with `e` the full extents.
    #[must_use]
    pub fn principal_moment_of_inertia(&self, mass: f64) -> Option<Matrix3<f64>> {
        match self {
            Self::Sphere { radius } => {
                let i = 0.4 * mass * radius * radius;
                Some(Matrix3::from_diagonal(&Vector3::new(i, i, i)))
            }
            Self::Cuboid { half_extent } => {
                let extent = 2.0 * half_extent;
                let sq = extent.component_mul(&extent);
                Some(Matrix3::from_diagonal(&Vector3::new(
                    mass * (sq.y + sq.z) / 12.0,
                    mass * (sq.x + sq.z) / 12.0,
                    mass * (sq.x + sq.y) / 12.0,
                )))
            }
            Self::HalfSpace { .. } | Self::TruePlane { .. } => None,
        }
    }
}

/// A geometry in the world: a shape plus an optional back-reference to the
/// rigid body it represents. Scenery (half-spaces, planes) has no body and
/// never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geometry {
    /// The collision shape.
    pub shape: Shape,
    /// The rigid body represented by this geometry; `None` for scenery.
    pub body: Option<BodyId>,
}

impl Geometry {
    /// Create a geometry.
    #[must_use]
    pub fn new(shape: Shape, body: Option<BodyId>) -> Self {
        Self { shape, body }
    }

    /// Whether this geometry is static scenery.
    #[must_use]
    pub fn is_scenery(&self) -> bool {
        self.body.is_none()
    }

    /// World position of the geometry: the body's transform translation, or
    /// the origin for scenery.
    #[must_use]
    pub fn position(&self, bodies: &[RigidBody]) -> Vector3<f64> {
        match self.body {
            Some(id) => bodies[id.index()].to_world.position(),
            None => Vector3::zeros(),
        }
    }

    /// World-frame base unit vector of the geometry: a column of the body's
    /// transform, or the world basis for scenery.
    #[must_use]
    pub fn axis(&self, bodies: &[RigidBody], index: usize) -> Vector3<f64> {
        match self.body {
            Some(id) => bodies[id.index()].to_world.axis(index),
            None => {
                let mut axis = Vector3::zeros();
                axis[index] = 1.0;
                axis
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    #[test]
    fn sphere_volume_and_inertia() {
        let shape = Shape::sphere(2.0);
        let volume = shape.volume().expect("spheres have volume");
        assert_relative_eq!(volume, 4.0 / 3.0 * std::f64::consts::PI * 8.0, epsilon = 1e-12);

        let inertia = shape
            .principal_moment_of_inertia(5.0)
            .expect("spheres have inertia");
        assert_relative_eq!(inertia[(0, 0)], 0.4 * 5.0 * 4.0, epsilon = 1e-12);
        assert_relative_eq!(inertia[(0, 0)], inertia[(1, 1)], epsilon = 1e-12);
    }

    #[test]
    fn cuboid_volume_and_inertia() {
        let shape = Shape::cuboid(Vector3::new(0.5, 1.0, 1.5));
        assert_relative_eq!(shape.volume().expect("cuboids have volume"), 12.0, epsilon = 1e-12);

        // Full extents 1, 2, 3 with mass 12: Ixx = (2² + 3²) = 13.
        let inertia = shape
            .principal_moment_of_inertia(12.0)
            .expect("cuboids have inertia");
        assert_relative_eq!(inertia[(0, 0)], 13.0, epsilon = 1e-12);
        assert_relative_eq!(inertia[(1, 1)], 10.0, epsilon = 1e-12);
        assert_relative_eq!(inertia[(2, 2)], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn planes_have_neither_volume_nor_inertia() {
        let plane = Shape::true_plane(Vector3::new(0.0, 2.0, 0.0), 1.0);
        assert!(plane.volume().is_none());
        assert!(plane.principal_moment_of_inertia(1.0).is_none());

        // And the constructor normalized the normal.
        let Shape::TruePlane { normal, .. } = plane else {
            unreachable!()
        };
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn scenery_queries_fall_back_to_world_basis() {
        let geometry = Geometry::new(Shape::half_space(Vector3::y(), 0.0), None);
        let bodies: Vec<RigidBody> = Vec::new();

        assert!(geometry.is_scenery());
        assert_eq!(geometry.position(&bodies), Vector3::zeros());
        assert_eq!(geometry.axis(&bodies, 1), Vector3::y());
    }

    #[test]
    fn body_queries_read_the_transform() {
        let mut body = RigidBody::new();
        body.set_mass(1.0);
        body.set_state(
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
            Vector3::zeros(),
            Vector3::zeros(),
        );
        let bodies = vec![body];

        let geometry = Geometry::new(Shape::sphere(1.0), Some(BodyId::new(0)));
        assert_eq!(geometry.position(&bodies), Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(
            geometry.axis(&bodies, 0),
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }
}
