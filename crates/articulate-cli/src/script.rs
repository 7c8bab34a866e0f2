//! RON build scripts: a recorded sequence of registrations for one asset

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use articulate_core::{
    Broadcast, BuildContext, JointSpec, MaterialRef, Mesh, ParentRef, PartId, load_obj,
};
use glam::DVec3;
use serde::Deserialize;

/// Where a part's geometry comes from
#[derive(Debug, Clone, Deserialize)]
pub enum MeshSource {
    /// OBJ file, relative to the script
    Obj(PathBuf),
    /// Axis-aligned box
    Box { min: [f64; 3], max: [f64; 3] },
    /// Placeholder for an optional part that is absent
    Empty,
}

/// One `register` call
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub category: String,
    pub meshes: Vec<MeshSource>,
    /// Parent for every mesh
    #[serde(default)]
    pub parent: Option<ParentRef>,
    /// One parent per mesh
    #[serde(default)]
    pub parents: Option<Vec<Option<ParentRef>>>,
    /// Joint for every mesh
    #[serde(default)]
    pub joint: Option<JointSpec>,
    /// One joint per mesh
    #[serde(default)]
    pub joints: Option<Vec<Option<JointSpec>>>,
    #[serde(default)]
    pub material: Option<String>,
}

/// A late edge declaration
#[derive(Debug, Clone, Deserialize)]
pub struct Edge {
    pub parent: Option<ParentRef>,
    pub child: u64,
    #[serde(default)]
    pub joint: Option<JointSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildScript {
    pub build_id: Option<String>,
    pub obj_name: Option<String>,
    pub parts: Vec<Registration>,
    pub edges: Vec<Edge>,
}

impl BuildScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("Failed to parse script {}", path.display()))
    }

    /// Register every part and edge; returns the combined mesh to finalize with
    pub fn replay(&self, ctx: &mut BuildContext, base_dir: &Path) -> Result<Mesh> {
        let mut all_meshes = Vec::new();
        for registration in &self.parts {
            let meshes = registration
                .meshes
                .iter()
                .map(|source| load_source(source, &registration.category, base_dir))
                .collect::<Result<Vec<_>>>()?;
            let meshes: Vec<Mesh> = match &registration.material {
                Some(name) => meshes
                    .into_iter()
                    .map(|m| m.with_material(MaterialRef::new(name.clone())))
                    .collect(),
                None => meshes,
            };

            let parents = match (&registration.parent, &registration.parents) {
                (Some(_), Some(_)) => bail!("{}: give either parent or parents", registration.category),
                (_, Some(each)) => Broadcast::Each(each.clone()),
                (one, None) => Broadcast::One(*one),
            };
            let joints = match (&registration.joint, &registration.joints) {
                (Some(_), Some(_)) => bail!("{}: give either joint or joints", registration.category),
                (_, Some(each)) => Broadcast::Each(each.clone()),
                (one, None) => Broadcast::One(one.clone()),
            };

            all_meshes.extend(meshes.iter().cloned());
            let ids = ctx
                .register(meshes, &registration.category, parents, joints)
                .with_context(|| format!("Failed to register {}", registration.category))?;
            tracing::info!("Registered {} as {:?}", registration.category, ids);
        }

        for edge in &self.edges {
            ctx.add_joint(edge.parent, PartId(edge.child), edge.joint.clone())
                .with_context(|| format!("Failed to add edge for part {}", edge.child))?;
        }

        Ok(Mesh::join("whole", &all_meshes))
    }
}

fn load_source(source: &MeshSource, category: &str, base_dir: &Path) -> Result<Mesh> {
    match source {
        MeshSource::Obj(path) => {
            let path = base_dir.join(path);
            load_obj(&path).with_context(|| format!("Failed to load {}", path.display()))
        }
        MeshSource::Box { min, max } => Ok(Mesh::cuboid(
            category,
            DVec3::from_array(*min),
            DVec3::from_array(*max),
        )),
        MeshSource::Empty => Ok(Mesh::new(category)),
    }
}
