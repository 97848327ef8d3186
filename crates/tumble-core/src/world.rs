//! The world: body and geometry arenas, the step loop and aggregates.

use std::io;

use nalgebra::{UnitQuaternion, Vector3};

use tumble_contact::{impulse_transfers, position_projections, ContactRegistry};
use tumble_types::{
    log_severe_error, BodyId, RigidBody, Result, SevereErrorSink, TumbleError, WorldConfig,
};

use crate::collision;
use crate::geometry::{Geometry, GeometryId, Shape};

/// Read-only view of a registered contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Contact point in world frame.
    pub position: Vector3<f64>,
    /// Contact normal in world frame.
    pub normal: Vector3<f64>,
    /// Residual penetration depth after resolution.
    pub penetration: f64,
    /// Whether the contact is against static scenery.
    pub with_scenery: bool,
}

/// A bounded world of rigid bodies.
///
/// The world owns three arenas (bodies, geometries and the contact
/// registry) whose capacities are fixed at construction. [`World::step`]
/// advances the system one semi-implicit Euler step: gravity, integration,
/// clock and aggregates, all-pairs collision detection, impulse transfer,
/// position projection, and accumulator clearing.
///
/// # Example
///
/// ```
/// use tumble_core::World;
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let mut world = World::new(8, 32);
/// world.set_gravity(Vector3::new(0.0, -9.81, 0.0));
///
/// let ball = world.add_sphere(1.0).unwrap();
/// world.set_mass(ball, 1.0).unwrap();
/// world.set_state(
///     ball,
///     Vector3::new(0.0, 10.0, 0.0),
///     UnitQuaternion::identity(),
///     Vector3::zeros(),
///     Vector3::zeros(),
/// ).unwrap();
/// world.activate(ball).unwrap();
/// world.add_half_space(Vector3::y(), 0.0).unwrap();
///
/// world.initialize();
/// for _ in 0..100 {
///     world.step(0.01);
/// }
/// assert!(world.body(ball).unwrap().position.y < 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    severe_sink: SevereErrorSink,

    bodies: Vec<RigidBody>,
    geometries: Vec<Geometry>,
    registry: ContactRegistry,

    time: f64,
    step_count: u64,

    total_kinetic_energy: f64,
    total_potential_energy: f64,
    total_linear_momentum: Vector3<f64>,
    total_angular_momentum: Vector3<f64>,
}

impl World {
    /// Create a world with the given capacities and the default coefficients
    /// (no gravity, restitution 1.0, relaxation 0.2, friction 0.0).
    #[must_use]
    pub fn new(max_objects: usize, max_collisions: usize) -> Self {
        Self::from_config(WorldConfig::new(max_objects, max_collisions))
    }

    /// Create a world from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::InvalidConfig`] when the configuration fails
    /// [`WorldConfig::validate`].
    pub fn with_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: WorldConfig) -> Self {
        let mut registry = ContactRegistry::new(config.max_collisions);
        registry.restitution = config.restitution;
        registry.relaxation = config.relaxation;
        registry.friction = config.friction;

        Self {
            bodies: Vec::with_capacity(config.max_objects),
            geometries: Vec::with_capacity(config.max_objects),
            registry,
            severe_sink: log_severe_error,
            time: 0.0,
            step_count: 0,
            total_kinetic_energy: 0.0,
            total_potential_energy: 0.0,
            total_linear_momentum: Vector3::zeros(),
            total_angular_momentum: Vector3::zeros(),
            config,
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Get the world configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Install the sink invoked on unrecoverable misuse.
    pub fn set_severe_error_sink(&mut self, sink: SevereErrorSink) {
        self.severe_sink = sink;
    }

    /// Set the gravity vector applied to every body each step.
    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.config.gravity = gravity;
    }

    /// Set the restitution coefficient stamped onto new contacts.
    pub fn set_restitution(&mut self, restitution: f64) {
        self.config.restitution = restitution;
        self.registry.restitution = restitution;
    }

    /// Set the position projection relaxation factor.
    pub fn set_relaxation(&mut self, relaxation: f64) {
        self.config.relaxation = relaxation;
        self.registry.relaxation = relaxation;
    }

    /// Set the friction coefficient stamped onto new contacts.
    pub fn set_friction(&mut self, friction: f64) {
        self.config.friction = friction;
        self.registry.friction = friction;
    }

    // =========================================================================
    // Geometry and body management
    // =========================================================================

    /// Add a dynamic sphere with an attached rigid body.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::CapacityExceeded`] when the geometry arena is
    /// full.
    pub fn add_sphere(&mut self, radius: f64) -> Result<GeometryId> {
        self.push_geometry(Shape::sphere(radius), true)
    }

    /// Add a dynamic cuboid with an attached rigid body.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::CapacityExceeded`] when the geometry arena is
    /// full.
    pub fn add_cuboid(&mut self, half_extent: Vector3<f64>) -> Result<GeometryId> {
        self.push_geometry(Shape::cuboid(half_extent), true)
    }

    /// Add a static half-space; the normal is normalized and points out of
    /// the half-space.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::CapacityExceeded`] when the geometry arena is
    /// full.
    pub fn add_half_space(&mut self, normal: Vector3<f64>, offset: f64) -> Result<GeometryId> {
        self.push_geometry(Shape::half_space(normal, offset), false)
    }

    /// Add a static two-sided plane.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::CapacityExceeded`] when the geometry arena is
    /// full.
    pub fn add_true_plane(&mut self, normal: Vector3<f64>, offset: f64) -> Result<GeometryId> {
        self.push_geometry(Shape::true_plane(normal, offset), false)
    }

    fn push_geometry(&mut self, shape: Shape, with_body: bool) -> Result<GeometryId> {
        if self.geometries.len() >= self.config.max_objects {
            return Err(self.report(TumbleError::CapacityExceeded {
                what: "geometries",
                capacity: self.config.max_objects,
            }));
        }

        let body = if with_body {
            self.bodies.push(RigidBody::new());
            Some(BodyId::new(self.bodies.len() - 1))
        } else {
            None
        };

        self.geometries.push(Geometry::new(shape, body));
        Ok(GeometryId::new(self.geometries.len() - 1))
    }

    /// Remove every geometry and body; capacities and coefficients persist.
    pub fn clear_geometries(&mut self) {
        self.geometries.clear();
        self.bodies.clear();
        self.registry.clear();
    }

    /// Number of geometries in the world.
    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Number of rigid bodies in the world.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get a geometry by id.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::InvalidGeometryId`] for an out-of-range id.
    pub fn geometry(&self, id: GeometryId) -> Result<&Geometry> {
        self.geometries
            .get(id.index())
            .ok_or_else(|| self.report(TumbleError::InvalidGeometryId(id.index())))
    }

    /// Get the rigid body of a geometry.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::InvalidGeometryId`] for an out-of-range id and
    /// [`TumbleError::SceneryHasNoBody`] for scenery.
    pub fn body(&self, id: GeometryId) -> Result<&RigidBody> {
        let body_id = self.body_id(id)?;
        Ok(&self.bodies[body_id.index()])
    }

    /// Get the rigid body of a geometry mutably.
    ///
    /// # Errors
    ///
    /// Returns [`TumbleError::InvalidGeometryId`] for an out-of-range id and
    /// [`TumbleError::SceneryHasNoBody`] for scenery.
    pub fn body_mut(&mut self, id: GeometryId) -> Result<&mut RigidBody> {
        let body_id = self.body_id(id)?;
        Ok(&mut self.bodies[body_id.index()])
    }

    fn body_id(&self, id: GeometryId) -> Result<BodyId> {
        let geometry = self
            .geometries
            .get(id.index())
            .ok_or_else(|| self.report(TumbleError::InvalidGeometryId(id.index())))?;

        geometry
            .body
            .ok_or_else(|| self.report(TumbleError::SceneryHasNoBody(id.index())))
    }

    fn report(&self, error: TumbleError) -> TumbleError {
        (self.severe_sink)(error.id(), &error.to_string());
        error
    }

    // =========================================================================
    // Body mutators
    // =========================================================================

    /// Set the mass of a geometry's body, installing the shape's principal
    /// moment of inertia and refreshing the derived quantities.
    ///
    /// A mass of 0 makes the body massless and a mass at or above `1e30`
    /// makes it immovable.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn set_mass(&mut self, id: GeometryId, mass: f64) -> Result<()> {
        let body_id = self.body_id(id)?;
        let shape = self.geometries[id.index()].shape;

        let body = &mut self.bodies[body_id.index()];
        body.set_mass(mass);
        if let Some(inertia) = shape.principal_moment_of_inertia(mass) {
            body.set_moment_of_inertia(&inertia);
        }
        body.refresh_derived_from_velocities();
        Ok(())
    }

    /// Set the initial position, orientation, velocity and angular velocity
    /// of a geometry's body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn set_state(
        &mut self,
        id: GeometryId,
        position: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        velocity: Vector3<f64>,
        angular_velocity: Vector3<f64>,
    ) -> Result<()> {
        self.body_mut(id)?
            .set_state(position, orientation, velocity, angular_velocity);
        Ok(())
    }

    /// Allow or forbid deactivation for a geometry's body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn set_can_deactivate(&mut self, id: GeometryId, flag: bool) -> Result<()> {
        self.body_mut(id)?.set_can_deactivate(flag);
        Ok(())
    }

    /// Enable or disable momentum damping for a geometry's body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn set_damping(&mut self, id: GeometryId, flag: bool) -> Result<()> {
        self.body_mut(id)?.damping_enabled = flag;
        Ok(())
    }

    /// Activate a geometry's body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn activate(&mut self, id: GeometryId) -> Result<()> {
        self.body_mut(id)?.activate();
        Ok(())
    }

    /// Deactivate a geometry's body, zeroing its motion state.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn deactivate(&mut self, id: GeometryId) -> Result<()> {
        self.body_mut(id)?.deactivate();
        Ok(())
    }

    /// Add an external force at the center of mass; does not wake the body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn add_external_force(
        &mut self,
        id: GeometryId,
        force: Vector3<f64>,
        potential_energy: f64,
    ) -> Result<()> {
        self.body_mut(id)?.add_external_force(force, potential_energy);
        Ok(())
    }

    /// Add an internal force at a world-frame point; wakes the body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn add_force_at_point(
        &mut self,
        id: GeometryId,
        world_point: Vector3<f64>,
        force: Vector3<f64>,
    ) -> Result<()> {
        self.body_mut(id)?.add_force_at_point(world_point, force, 0.0);
        Ok(())
    }

    /// Add an internal torque; wakes the body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid id or a scenery geometry.
    pub fn add_torque(&mut self, id: GeometryId, torque: Vector3<f64>) -> Result<()> {
        self.body_mut(id)?.add_torque(torque);
        Ok(())
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Reset the clock, the registry, the accumulators and the aggregates,
    /// and rebuild every body's derived quantities.
    pub fn initialize(&mut self) {
        self.time = 0.0;
        self.step_count = 0;
        self.registry.clear();

        for body in &mut self.bodies {
            body.refresh_derived();
            body.clear_accumulators();
        }

        self.recompute_aggregates();
    }

    /// Advance the system one step of length `h`.
    ///
    /// A non-finite or non-positive `h` is reported through the severe-error
    /// sink and the step is aborted.
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&mut self, h: f64) {
        if !h.is_finite() || h <= 0.0 {
            let error = TumbleError::invalid_config(format!("step length {h} must be positive"));
            (self.severe_sink)(error.id(), &error.to_string());
            return;
        }

        // Accumulate gravity with its potential energy.
        let gravity = self.config.gravity;
        for body in &mut self.bodies {
            let force = body.mass() * gravity;
            let potential_energy = -force.dot(&body.position);
            body.add_external_force(force, potential_energy);
        }

        // Integrate the equations of motion on every active body.
        for body in &mut self.bodies {
            body.integrate(h);
        }

        // Advance the clock by multiplication to keep rounding errors from
        // accumulating over long runs.
        self.step_count += 1;
        self.time = h * self.step_count as f64;

        self.recompute_aggregates();

        // All-pairs collision detection in lexicographic (i, j) order.
        self.registry.clear();
        for i in 0..self.geometries.len() {
            for j in (i + 1)..self.geometries.len() {
                collision::detect(
                    &mut self.registry,
                    &self.bodies,
                    &self.geometries[i],
                    &self.geometries[j],
                );
            }
        }
        tracing::debug!(
            target: "tumble",
            step = self.step_count,
            contacts = self.registry.count(),
            "detection complete"
        );

        // Collision response.
        self.registry.update_derived(&self.bodies, h);
        impulse_transfers(&mut self.registry, &mut self.bodies, h, 0, self.config.velocity_eps);
        position_projections(&mut self.registry, &mut self.bodies, 0, self.config.position_eps);

        // Prepare the accumulators for the next step.
        for body in &mut self.bodies {
            body.clear_accumulators();
        }
    }

    fn recompute_aggregates(&mut self) {
        self.total_kinetic_energy = 0.0;
        self.total_potential_energy = 0.0;
        self.total_linear_momentum = Vector3::zeros();
        self.total_angular_momentum = Vector3::zeros();

        for body in &self.bodies {
            self.total_kinetic_energy += body.kinetic_energy;
            self.total_potential_energy += body.potential_energy;
            self.total_linear_momentum += body.linear_momentum;
            self.total_angular_momentum += body.total_angular_momentum;
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of steps taken since the last [`World::initialize`].
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Total energy: kinetic plus potential.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.total_kinetic_energy + self.total_potential_energy
    }

    /// Total kinetic energy of all bodies.
    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.total_kinetic_energy
    }

    /// Total potential energy accumulated by the applied forces.
    #[must_use]
    pub fn total_potential_energy(&self) -> f64 {
        self.total_potential_energy
    }

    /// Total linear momentum of all bodies.
    #[must_use]
    pub fn total_linear_momentum(&self) -> Vector3<f64> {
        self.total_linear_momentum
    }

    /// Total angular momentum of all bodies about the world origin.
    #[must_use]
    pub fn total_angular_momentum(&self) -> Vector3<f64> {
        self.total_angular_momentum
    }

    /// Number of contacts registered during the last step.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.registry.count()
    }

    /// View of the contact at `index`; an out-of-range index is reported
    /// through the severe-error sink and yields `None`.
    #[must_use]
    pub fn contact(&self, index: usize) -> Option<ContactInfo> {
        let Some(contact) = self.registry.get(index) else {
            let error = TumbleError::invalid_config(format!(
                "contact index {index} out of range ({} registered)",
                self.registry.count()
            ));
            (self.severe_sink)(error.id(), &error.to_string());
            return None;
        };

        Some(ContactInfo {
            position: contact.position,
            normal: contact.normal,
            penetration: contact.penetration,
            with_scenery: contact.with_scenery(),
        })
    }

    /// The contact registry, for inspection.
    #[must_use]
    pub fn registry(&self) -> &ContactRegistry {
        &self.registry
    }

    /// Iterate over all rigid bodies.
    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Write a human-readable dump of the parameters and per-body state.
    ///
    /// # Errors
    ///
    /// Propagates errors of the underlying writer.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "t = {:.4}  steps = {}  contacts = {}",
            self.time,
            self.step_count,
            self.registry.count()
        )?;
        writeln!(
            out,
            "gravity = {:?}  restitution = {}  relaxation = {}  friction = {}",
            self.config.gravity, self.config.restitution, self.config.relaxation, self.config.friction
        )?;
        writeln!(
            out,
            "{:>4} {:>10} {:>34} {:>44} {:>34} {:>34} {:>34} {:>34} {:>12}",
            "id", "mass", "X", "Q", "P", "L", "V", "W", "E_k"
        )?;

        for (i, body) in self.bodies.iter().enumerate() {
            writeln!(
                out,
                "{:>4} {:>10.4} {:>34} {:>44} {:>34} {:>34} {:>34} {:>34} {:>12.6}",
                i,
                body.mass(),
                format_vector(&body.position),
                format!("{:.4?}", body.orientation.coords.as_slice()),
                format_vector(&body.linear_momentum),
                format_vector(&body.angular_momentum),
                format_vector(&body.velocity),
                format_vector(&body.angular_velocity),
                body.kinetic_energy,
            )?;
        }

        for (i, contact) in self.registry.contacts().iter().enumerate() {
            writeln!(
                out,
                "contact {:>3}  X = {}  N = {}  pen = {:.6}  scenery = {}",
                i,
                format_vector(&contact.position),
                format_vector(&contact.normal),
                contact.penetration,
                contact.with_scenery(),
            )?;
        }
        Ok(())
    }
}

fn format_vector(v: &Vector3<f64>) -> String {
    format!("[{:>10.4} {:>10.4} {:>10.4}]", v.x, v.y, v.z)
}
