//! Part registration
//!
//! The geometry side hands over meshes by category together with their parent
//! references and joints. Each non-degenerate mesh gets the next part id, is
//! exported to `objs/<id>.obj`, and its edge is recorded for the tree builder.

use std::collections::HashSet;
use std::path::PathBuf;

use glam::DVec3;

use crate::articulation::ArticulationError;
use crate::catalogue::{CatalogueError, CataloguePart};
use crate::context::{BuildContext, BuildError};
use crate::mesh::{Mesh, MeshError, export_part};
use crate::part::PartRecord;
use crate::types::{JointSpec, ParentRef, PartId};

/// A value given once for every mesh, or once per mesh
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast<T> {
    One(T),
    Each(Vec<T>),
}

impl<T: Clone> Broadcast<T> {
    /// One value per slot; `None` if a list does not have `n` entries
    pub fn expand(self, n: usize) -> Option<Vec<T>> {
        match self {
            Broadcast::One(value) => Some(vec![value; n]),
            Broadcast::Each(values) => (values.len() == n).then_some(values),
        }
    }

    fn len_hint(&self) -> Option<usize> {
        match self {
            Broadcast::One(_) => None,
            Broadcast::Each(values) => Some(values.len()),
        }
    }
}

/// One mesh with its edge, after broadcasting
#[derive(Debug, Clone)]
pub struct Declaration {
    pub mesh: Mesh,
    /// `None` fixes the part to the world at its own origin
    pub parent: Option<ParentRef>,
    /// `None` becomes a fixed joint with a generated name
    pub joint: Option<JointSpec>,
}

impl Declaration {
    pub fn new(mesh: Mesh, parent: Option<ParentRef>, joint: Option<JointSpec>) -> Self {
        Self { mesh, parent, joint }
    }
}

/// Registration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("{field} has {found} entries for {expected} meshes")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate joint name: {0}")]
    DuplicateJointName(String),
    #[error("Unknown part: {0}")]
    UnknownPart(PartId),
    #[error("Articulation error: {0}")]
    Articulation(#[from] ArticulationError),
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

impl BuildContext {
    /// Register meshes of one category
    ///
    /// `parents` and `joints` are broadcast to every mesh or zipped with them.
    /// A joint broadcast to several meshes is suffixed with the mesh's slot
    /// (`door_0`, `door_1`, ...) to keep names unique. Degenerate meshes are
    /// skipped without consuming an id. Returns the ids in input order.
    pub fn register(
        &mut self,
        meshes: Vec<Mesh>,
        category: &str,
        parents: Broadcast<Option<ParentRef>>,
        joints: Broadcast<Option<JointSpec>>,
    ) -> Result<Vec<PartId>, RegistryError> {
        if meshes.is_empty() {
            return Ok(Vec::new());
        }
        let n = meshes.len();
        let broadcast_joint = matches!(joints, Broadcast::One(Some(_))) && n > 1;

        let parent_hint = parents.len_hint();
        let parents = parents.expand(n).ok_or(RegistryError::LengthMismatch {
            field: "parents",
            expected: n,
            found: parent_hint.unwrap_or(1),
        })?;
        let joint_hint = joints.len_hint();
        let joints = joints.expand(n).ok_or(RegistryError::LengthMismatch {
            field: "joints",
            expected: n,
            found: joint_hint.unwrap_or(1),
        })?;

        let declarations = meshes
            .into_iter()
            .zip(parents)
            .zip(joints)
            .enumerate()
            .map(|(slot, ((mesh, parent), joint))| {
                let joint = match joint {
                    Some(spec) if broadcast_joint => {
                        Some(spec.renamed(format!("{}_{}", spec.name(), slot)))
                    }
                    joint => joint,
                };
                Declaration::new(mesh, parent, joint)
            })
            .collect();
        self.register_declarations(category, declarations)
    }

    /// Register already-zipped declarations of one category
    ///
    /// The batch is all or nothing: every edge is checked before any file is
    /// written, and files already exported are removed if a later export fails.
    pub fn register_declarations(
        &mut self,
        category: &str,
        declarations: Vec<Declaration>,
    ) -> Result<Vec<PartId>, RegistryError> {
        let declarations: Vec<Declaration> = declarations
            .into_iter()
            .filter(|d| {
                let keep = !d.mesh.is_degenerate();
                if !keep {
                    tracing::debug!("Skipping empty {} mesh '{}'", category, d.mesh.name);
                }
                keep
            })
            .collect();
        if declarations.is_empty() {
            tracing::debug!("No geometry for {}, nothing registered", category);
            return Ok(Vec::new());
        }
        self.check_joint_names(declarations.iter().filter_map(|d| d.joint.as_ref()))?;
        let ids: Vec<PartId> = (0..declarations.len() as u64)
            .map(|offset| PartId(self.next_id + offset))
            .collect();
        for (&id, declaration) in ids.iter().zip(&declarations) {
            self.articulation.check_insert(id, declaration.parent)?;
        }
        self.ensure_dirs()?;

        let mut exported: Vec<(PathBuf, DVec3)> = Vec::with_capacity(declarations.len());
        for (&id, declaration) in ids.iter().zip(&declarations) {
            let mesh_file = self.objs_dir().join(id.file_name());
            match export_part(&declaration.mesh, &mesh_file) {
                Ok(origin) => exported.push((mesh_file, origin)),
                Err(e) => {
                    for (written, _) in &exported {
                        if let Err(remove_err) = std::fs::remove_file(written) {
                            tracing::warn!("Failed to remove {}: {}", written.display(), remove_err);
                        }
                    }
                    return Err(e.into());
                }
            }
        }

        let mut entries = Vec::with_capacity(declarations.len());
        for ((&id, declaration), (mesh_file, origin)) in ids.iter().zip(declarations).zip(exported) {
            self.articulation
                .insert(id, declaration.parent, declaration.joint)?;
            self.next_id += 1;

            let record = PartRecord::new(id, category, mesh_file, origin)
                .with_material(declaration.mesh.material.clone());
            tracing::debug!(
                "Registered part {} ({}) at {:?}, parent {:?}",
                id,
                category,
                origin,
                declaration.parent.map(|p| p.to_string())
            );
            entries.push(CataloguePart {
                part_name: record.catalogue_name(),
                file_name: id.file_name(),
                file_obj_path: record.mesh_file.to_string_lossy().to_string(),
            });
            self.parts.insert(id, record);
        }

        self.catalogue.append_parts(entries)?;
        Ok(ids)
    }

    /// Declare the edge of an already registered part
    ///
    /// Moves a part registered without a part parent under `parent`.
    pub fn add_joint(
        &mut self,
        parent: Option<ParentRef>,
        child: PartId,
        joint: Option<JointSpec>,
    ) -> Result<(), RegistryError> {
        if !self.parts.contains_key(&child) {
            return Err(RegistryError::UnknownPart(child));
        }
        let replaced = self
            .articulation
            .get(child)
            .and_then(|edge| edge.joint.as_ref())
            .map(|j| j.name().to_string());
        if let Some(spec) = &joint
            && replaced.as_deref() != Some(spec.name())
        {
            self.check_joint_names(std::iter::once(spec))?;
        }
        self.articulation.reparent(child, parent, joint)?;
        tracing::debug!("Part {} re-parented to {:?}", child, parent.map(|p| p.to_string()));
        Ok(())
    }

    fn check_joint_names<'a>(
        &self,
        joints: impl Iterator<Item = &'a JointSpec>,
    ) -> Result<(), RegistryError> {
        let mut seen: HashSet<&str> = self.articulation.joint_names().collect();
        for joint in joints {
            if !seen.insert(joint.name()) {
                return Err(RegistryError::DuplicateJointName(joint.name().to_string()));
            }
        }
        Ok(())
    }
}
