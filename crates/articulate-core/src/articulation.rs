//! Articulation map: the declared `child -> (parent, joint)` edges of one build

use std::collections::BTreeMap;

use crate::types::{JointSpec, ParentRef, PartId};

/// One declared edge
#[derive(Debug, Clone, PartialEq)]
pub struct Articulation {
    /// `None` means unparented: fixed to the world at the part's own origin
    pub parent: Option<ParentRef>,
    /// `None` means a fixed joint with a generated name
    pub joint: Option<JointSpec>,
}

/// Append-only edge map, iterated in ascending child id
#[derive(Debug, Clone, Default)]
pub struct ArticulationMap {
    edges: BTreeMap<PartId, Articulation>,
}

impl ArticulationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge; a child can be declared only once
    pub fn insert(
        &mut self,
        child: PartId,
        parent: Option<ParentRef>,
        joint: Option<JointSpec>,
    ) -> Result<(), ArticulationError> {
        self.check_insert(child, parent)?;
        self.edges.insert(child, Articulation { parent, joint });
        Ok(())
    }

    /// Whether [`insert`](Self::insert) would accept the edge
    pub fn check_insert(
        &self,
        child: PartId,
        parent: Option<ParentRef>,
    ) -> Result<(), ArticulationError> {
        if self.edges.contains_key(&child) {
            return Err(ArticulationError::AlreadyDeclared(child));
        }
        if parent == Some(ParentRef::Part(child)) {
            return Err(ArticulationError::SelfParent(child));
        }
        Ok(())
    }

    /// Re-declare the edge of a child that is so far attached only to the world
    ///
    /// Parts are often registered before the part they hang from exists; this
    /// moves them under it once it does. A child already parented to a part
    /// keeps its edge.
    pub fn reparent(
        &mut self,
        child: PartId,
        parent: Option<ParentRef>,
        joint: Option<JointSpec>,
    ) -> Result<(), ArticulationError> {
        if parent == Some(ParentRef::Part(child)) {
            return Err(ArticulationError::SelfParent(child));
        }
        if let Some(Articulation {
            parent: Some(ParentRef::Part(_)),
            ..
        }) = self.edges.get(&child)
        {
            return Err(ArticulationError::AlreadyDeclared(child));
        }
        self.edges.insert(child, Articulation { parent, joint });
        Ok(())
    }

    pub fn get(&self, child: PartId) -> Option<&Articulation> {
        self.edges.get(&child)
    }

    pub fn contains(&self, child: PartId) -> bool {
        self.edges.contains_key(&child)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartId, &Articulation)> {
        self.edges.iter().map(|(id, edge)| (*id, edge))
    }

    /// Names of all declared joints, in child order
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.edges
            .values()
            .filter_map(|edge| edge.joint.as_ref().map(|j| j.name()))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// First child found on a parent chain that loops back on itself
    pub fn find_cycle(&self) -> Option<PartId> {
        for &start in self.edges.keys() {
            let mut current = start;
            let mut steps = 0;
            while let Some(ParentRef::Part(parent)) =
                self.edges.get(&current).and_then(|edge| edge.parent)
            {
                if parent == start {
                    return Some(start);
                }
                current = parent;
                steps += 1;
                // A chain longer than the map revisits some node not on the start's loop
                if steps > self.edges.len() {
                    break;
                }
            }
        }
        None
    }
}

/// Articulation map errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArticulationError {
    #[error("Part {0} already has a declared parent")]
    AlreadyDeclared(PartId),
    #[error("Part {0} cannot be its own parent")]
    SelfParent(PartId),
}
