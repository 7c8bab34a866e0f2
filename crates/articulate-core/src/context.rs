//! Per-build state and the finalize pipeline
//!
//! A [`BuildContext`] owns everything one asset build accumulates: the part id
//! counter, the exported part records, the articulation map, the catalogue and
//! the joint name generator. Registration goes through it (see
//! [`crate::registry`]) and [`BuildContext::finalize`] turns it into files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::articulation::ArticulationMap;
use crate::assembly::{KinematicGraph, NameGenerator, TreeError, build_tree};
use crate::catalogue::{Catalogue, CatalogueError};
use crate::config::{ConfigError, ExportConfig};
use crate::export::{ExportError, MeshPaths, write_description};
use crate::mesh::{Mesh, MeshError, write_obj};
use crate::normalize::{WholeTransform, normalize_whole, recenter_parts};
use crate::part::PartRecord;
use crate::types::PartId;

/// Sub-directory holding the exported meshes
pub const OBJS_DIR: &str = "objs";
/// File name of the normalized whole-asset mesh
pub const WHOLE_FILE: &str = "whole.obj";
/// File name of the description, next to `objs/`
pub const DESCRIPTION_FILE: &str = "scene.urdf";

/// What a successful finalize produced
#[derive(Debug, Clone)]
pub struct FinalizeReport {
    pub build_id: String,
    pub description_path: PathBuf,
    pub whole_path: PathBuf,
    pub whole_transform: WholeTransform,
    /// Part records with their recentered origins
    pub parts: BTreeMap<PartId, PartRecord>,
    pub graph: KinematicGraph,
}

/// Mutable state of one asset build
#[derive(Debug)]
pub struct BuildContext {
    pub(crate) config: ExportConfig,
    build_id: String,
    obj_name: String,
    build_dir: PathBuf,
    pub(crate) next_id: u64,
    pub(crate) parts: BTreeMap<PartId, PartRecord>,
    pub(crate) articulation: ArticulationMap,
    pub(crate) catalogue: Catalogue,
    names: NameGenerator,
}

impl BuildContext {
    /// Start a build below `config.output_root`
    ///
    /// Without a build id, a random `random_<uuid>` id is used. Nothing is
    /// written until the first part is registered.
    pub fn create(config: ExportConfig, build_id: Option<&str>) -> Result<Self, BuildError> {
        config.validate()?;
        let build_id = match build_id {
            Some(id) => id.to_string(),
            None => random_build_id(),
        };
        let obj_name = default_object_name(&config.output_root);
        let build_dir = config.output_root.join(&build_id);
        let catalogue = Catalogue::open(Catalogue::file_path(&config.output_root, &build_id))?;

        tracing::info!("Starting build {} in {}", build_id, build_dir.display());
        let mut context = Self {
            config,
            build_id,
            obj_name,
            build_dir,
            next_id: 0,
            parts: BTreeMap::new(),
            articulation: ArticulationMap::new(),
            catalogue,
            names: NameGenerator::new(),
        };
        context.begin_case();
        Ok(context)
    }

    /// Name recorded for the asset in the catalogue
    pub fn with_object_name(mut self, obj_name: impl Into<String>) -> Result<Self, BuildError> {
        self.obj_name = obj_name.into();
        self.catalogue.set_object_name(&self.obj_name)?;
        Ok(self)
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn object_name(&self) -> &str {
        &self.obj_name
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn objs_dir(&self) -> PathBuf {
        self.build_dir.join(OBJS_DIR)
    }

    /// Id the next registered part will receive
    pub fn next_id(&self) -> PartId {
        PartId(self.next_id)
    }

    pub fn parts(&self) -> &BTreeMap<PartId, PartRecord> {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&PartRecord> {
        self.parts.get(&id)
    }

    pub fn articulation(&self) -> &ArticulationMap {
        &self.articulation
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Nothing registered since the last reset
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.articulation.is_empty() && self.next_id == 0
    }

    /// Create `<build>/objs/`; an existing directory is fine
    pub(crate) fn ensure_dirs(&self) -> Result<(), BuildError> {
        let objs = self.objs_dir();
        std::fs::create_dir_all(&objs)
            .map_err(|e| BuildError::Io(format!("{}: {}", objs.display(), e)))
    }

    /// Normalize, build the tree, write the description and clear the build
    ///
    /// Part files are rewritten in place, so a build whose finalize failed
    /// cannot be finalized again; [`abort`](Self::abort) it instead.
    pub fn finalize(&mut self, whole: &Mesh) -> Result<FinalizeReport, BuildError> {
        self.ensure_dirs()?;

        let (normalized, whole_transform) =
            normalize_whole(whole, self.config.canonical_extent, self.config.realign_up_axis)?;
        let whole_path = self.objs_dir().join(WHOLE_FILE);
        write_obj(&normalized, &whole_path)?;
        tracing::debug!(
            "Whole mesh centered at {:?}, scaled by {}",
            whole_transform.center,
            whole_transform.scale
        );

        recenter_parts(&mut self.parts)?;

        self.names.reset();
        let graph = build_tree(
            &self.config.robot_name,
            &self.articulation,
            &self.parts,
            &mut self.names,
        )?;

        let description_path = self.build_dir.join(DESCRIPTION_FILE);
        let mesh_paths = if self.config.absolute_mesh_paths {
            MeshPaths::Absolute
        } else {
            MeshPaths::RelativeTo(self.build_dir.clone())
        };
        write_description(&graph, &description_path, &mesh_paths)?;
        self.catalogue.save()?;

        tracing::info!(
            "Finalized build {}: {} parts, {} links, {} joints",
            self.build_id,
            self.parts.len(),
            graph.link_count(),
            graph.joint_count()
        );
        let report = FinalizeReport {
            build_id: self.build_id.clone(),
            description_path,
            whole_path,
            whole_transform,
            parts: std::mem::take(&mut self.parts),
            graph,
        };
        self.reset();
        Ok(report)
    }

    /// Drop all per-build state and move on to a fresh `random_<uuid>` build
    ///
    /// The next registration starts at id 0 in a new build directory and a new
    /// case of the same catalogue file, so files of a finalized build are
    /// never overwritten. Anything already written for the current build stays
    /// on disk.
    pub fn reset(&mut self) {
        self.build_id = random_build_id();
        self.build_dir = self.config.output_root.join(&self.build_id);
        tracing::debug!("Next build {} in {}", self.build_id, self.build_dir.display());
        self.next_id = 0;
        self.parts.clear();
        self.articulation.clear();
        self.names.reset();
        self.begin_case();
    }

    /// Discard a failed build and its output directory
    pub fn abort(self) -> Result<(), BuildError> {
        tracing::warn!("Aborting build {}", self.build_id);
        match std::fs::remove_dir_all(&self.build_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::Io(format!("{}: {}", self.build_dir.display(), e))),
        }
    }

    fn begin_case(&mut self) {
        let whole_path = self.objs_dir().join(WHOLE_FILE);
        self.catalogue.begin_case(&self.build_id, &self.obj_name, &whole_path);
    }
}

fn random_build_id() -> String {
    format!("random_{}", uuid::Uuid::new_v4().simple())
}

/// Asset name derived from the output directory, minus a `Factory` suffix
fn default_object_name(output_root: &Path) -> String {
    let name = output_root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    name.strip_suffix("Factory").unwrap_or(name).to_string()
}

/// Build pipeline errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),
    #[error("IO error: {0}")]
    Io(String),
}
