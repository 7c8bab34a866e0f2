//! Registered parts

use std::path::PathBuf;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::{MaterialRef, PartId};

/// A part exported during the current build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: PartId,
    /// Semantic name, e.g. "door" or "rack"
    pub category: String,
    /// Exported OBJ file
    pub mesh_file: PathBuf,
    /// World-space bounding box center of the exported geometry
    pub origin: DVec3,
    pub material: Option<MaterialRef>,
}

impl PartRecord {
    pub fn new(id: PartId, category: impl Into<String>, mesh_file: PathBuf, origin: DVec3) -> Self {
        Self {
            id,
            category: category.into(),
            mesh_file,
            origin,
            material: None,
        }
    }

    pub fn with_material(mut self, material: Option<MaterialRef>) -> Self {
        self.material = material;
        self
    }

    /// Name written to the part catalogue
    pub fn catalogue_name(&self) -> String {
        format!("{}_part", self.category)
    }
}
