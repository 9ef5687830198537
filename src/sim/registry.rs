//! Body registry
//!
//! Owns every body of the active stage. Iteration order is insertion order,
//! which the collision resolver relies on to break ties deterministically.
//!
//! Removal leaves a tombstone so it is O(1); tombstones are invisible to all
//! queries immediately and are swept out by [`BodyRegistry::compact`] at the
//! end of a tick.

use std::collections::HashMap;

use super::body::{Body, BodyId};
use super::geom::Aabb;

#[derive(Debug, Clone)]
pub struct BodyRegistry {
    slots: Vec<Option<Body>>,
    /// Slot index per live id (lookup only, never iterated)
    index: HashMap<BodyId, usize>,
    next_id: u32,
    tombstones: usize,
}

impl Default for BodyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            tombstones: 0,
        }
    }

    /// Insert a body, assigning it a fresh id
    pub fn add(&mut self, mut body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.id = id;
        self.index.insert(id, self.slots.len());
        self.slots.push(Some(body));
        id
    }

    /// Remove a body. Returns `None` if it was already gone.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let slot = self.index.remove(&id)?;
        let body = self.slots.get_mut(slot)?.take();
        if body.is_some() {
            self.tombstones += 1;
        }
        body
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        let slot = *self.index.get(&id)?;
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let slot = *self.index.get(&id)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    /// All live bodies in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    /// Ids of live bodies matching `pred`, in insertion order
    pub fn ids_where(&self, pred: impl Fn(&Body) -> bool) -> Vec<BodyId> {
        self.iter().filter(|b| pred(b)).map(|b| b.id).collect()
    }

    pub fn count_where(&self, pred: impl Fn(&Body) -> bool) -> usize {
        self.iter().filter(|b| pred(b)).count()
    }

    /// Broad phase: bodies whose bounding box overlaps `region` (or touches
    /// it) and pass `filter`, in insertion order
    pub fn query_near(&self, region: &Aabb, filter: impl Fn(&Body) -> bool) -> Vec<BodyId> {
        let region = region.expand(crate::consts::EPSILON);
        self.iter()
            .filter(|b| filter(b) && b.aabb().overlaps(&region))
            .map(|b| b.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sweep out tombstones once they make up half the storage
    pub fn compact(&mut self) {
        if self.tombstones == 0 || self.tombstones * 2 < self.slots.len() {
            return;
        }
        self.slots.retain(|s| s.is_some());
        self.index.clear();
        for (slot, body) in self.slots.iter().enumerate() {
            if let Some(body) = body {
                self.index.insert(body.id, slot);
            }
        }
        self.tombstones = 0;
    }
}
