//! Fixed-capacity contact registry.

use nalgebra::Vector3;
use tumble_types::{BodyId, RigidBody};

use crate::contact::Contact;

/// Append-only arena of contacts with capacity fixed at construction.
///
/// Detection appends contacts; the resolvers update them in place. The
/// registry is cleared at the start of each step's detection phase. When the
/// arena is full further registrations are dropped silently; the caller can
/// notice by comparing [`ContactRegistry::count`] against
/// [`ContactRegistry::capacity`].
#[derive(Debug, Clone)]
pub struct ContactRegistry {
    contacts: Vec<Contact>,
    capacity: usize,

    /// Restitution coefficient stamped onto newly registered contacts.
    pub restitution: f64,
    /// Relaxation factor used by the position projection resolver.
    pub relaxation: f64,
    /// Friction coefficient stamped onto newly registered contacts.
    pub friction: f64,
}

impl ContactRegistry {
    /// Create an empty registry with storage for `capacity` contacts and the
    /// default coefficients (restitution 1.0, relaxation 0.2, friction 0.0).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            contacts: Vec::with_capacity(capacity),
            capacity,
            restitution: 1.0,
            relaxation: 0.2,
            friction: 0.0,
        }
    }

    /// Number of contacts currently registered.
    #[must_use]
    pub fn count(&self) -> usize {
        self.contacts.len()
    }

    /// Fixed capacity of the arena.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether there is room for at least one more contact.
    #[must_use]
    pub fn has_space(&self) -> bool {
        self.contacts.len() < self.capacity
    }

    /// Remove all contacts; storage is retained.
    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    /// Get a registered contact by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }

    /// View all registered contacts.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub(crate) fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }

    /// Register a new contact, stamping the registry's restitution and
    /// friction coefficients onto it.
    ///
    /// Returns 1 on success and 0 when the arena is full, so detectors can
    /// sum registration results into a contact count.
    pub fn register_new_contact(
        &mut self,
        body_a: Option<BodyId>,
        body_b: Option<BodyId>,
        position: Vector3<f64>,
        normal: Vector3<f64>,
        penetration: f64,
    ) -> usize {
        if !self.has_space() {
            return 0;
        }

        self.contacts.push(Contact::new(
            body_a,
            body_b,
            position,
            normal,
            penetration,
            self.restitution,
            self.friction,
        ));
        1
    }

    /// Recompute derived quantities on every registered contact.
    pub fn update_derived(&mut self, bodies: &[RigidBody], h: f64) {
        for contact in &mut self.contacts {
            contact.update_derived(bodies, h);
        }
    }

    /// Index of the contact with the largest bouncing velocity above `eps`,
    /// first-seen-wins on ties.
    #[must_use]
    pub(crate) fn find_largest_bouncing_velocity(&self, eps: f64) -> Option<usize> {
        let mut best = eps;
        let mut found = None;
        for (i, contact) in self.contacts.iter().enumerate() {
            if contact.bouncing_velocity > best {
                best = contact.bouncing_velocity;
                found = Some(i);
            }
        }
        found
    }

    /// Index of the contact with the largest penetration above `eps`,
    /// first-seen-wins on ties.
    #[must_use]
    pub(crate) fn find_largest_penetration(&self, eps: f64) -> Option<usize> {
        let mut best = eps;
        let mut found = None;
        for (i, contact) in self.contacts.iter().enumerate() {
            if contact.penetration > best {
                best = contact.penetration;
                found = Some(i);
            }
        }
        found
    }
}
