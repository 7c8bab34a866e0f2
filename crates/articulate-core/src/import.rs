//! Read an exported description back into a kinematic graph
//!
//! Used to check the on-disk tree: links are classified by name (`world`,
//! `abstract_*`, numeric part ids) and a joint whose child already has a
//! parent is read as a secondary degree of freedom.

use std::path::{Path, PathBuf};

use glam::DVec3;

use crate::assembly::{AssemblyError, Joint, KinematicGraph, Link};
use crate::types::{JointLimits, JointType, MaterialRef, PartId, Pose, WORLD_LINK};

/// Read-back options
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Base directory for relative mesh paths; defaults to the file's directory
    pub base_dir: Option<PathBuf>,
    /// Fail when a referenced mesh file does not exist
    pub require_meshes: bool,
}

/// Errors that can occur while reading a description
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to parse URDF: {0}")]
    UrdfParse(String),
    #[error("Unexpected link name: {0}")]
    UnexpectedLink(String),
    #[error("Unsupported joint type for joint {0}")]
    UnsupportedJointType(String),
    #[error("Unsupported geometry on link {0} (only meshes are written)")]
    UnsupportedGeometry(String),
    #[error("Mesh file not found: {0}")]
    MeshNotFound(String),
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),
}

/// Parse a URDF file into a kinematic graph
pub fn read_description(path: &Path, options: &ImportOptions) -> Result<KinematicGraph, ImportError> {
    let robot = urdf_rs::read_file(path).map_err(|e| ImportError::UrdfParse(e.to_string()))?;
    let base_dir = options
        .base_dir
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut graph = KinematicGraph::new(robot.name.clone());
    for urdf_link in &robot.links {
        if urdf_link.name == WORLD_LINK {
            continue;
        }
        graph.add_link(convert_link(urdf_link, &base_dir, options.require_meshes)?)?;
    }

    for urdf_joint in &robot.joints {
        let joint_type = JointType::from_urdf(&urdf_joint.joint_type)
            .ok_or_else(|| ImportError::UnsupportedJointType(urdf_joint.name.clone()))?;
        let axis = DVec3::from_array(urdf_joint.axis.xyz.0);
        let limit = &urdf_joint.limit;
        let limits = JointLimits {
            lower: limit.lower,
            upper: limit.upper,
            effort: limit.effort,
            velocity: limit.velocity,
        };
        let has_limits =
            joint_type.has_limits() || (limits.effort != 0.0 || limits.velocity != 0.0);

        let mut builder =
            Joint::builder(&urdf_joint.name, &urdf_joint.parent.link, &urdf_joint.child.link)
                .joint_type(joint_type)
                .origin(Pose::from(&urdf_joint.origin))
                .axis(Some(axis))
                .limits(has_limits.then_some(limits));
        if graph.parent_joint(&urdf_joint.child.link).is_some() {
            builder = builder.secondary();
        }
        graph.connect(builder.build())?;
    }

    tracing::info!(
        "Read {} ({} links, {} joints)",
        path.display(),
        graph.link_count(),
        graph.joint_count()
    );
    Ok(graph)
}

fn convert_link(
    urdf_link: &urdf_rs::Link,
    base_dir: &Path,
    require_meshes: bool,
) -> Result<Link, ImportError> {
    let name = &urdf_link.name;
    if name.starts_with("abstract_") {
        return Ok(Link::synthetic(name.clone()));
    }
    let id = name
        .parse::<u64>()
        .map(PartId)
        .map_err(|_| ImportError::UnexpectedLink(name.clone()))?;

    let resolve = |geometry: &urdf_rs::Geometry| -> Result<PathBuf, ImportError> {
        let urdf_rs::Geometry::Mesh { filename, .. } = geometry else {
            return Err(ImportError::UnsupportedGeometry(name.clone()));
        };
        let path_str = filename.strip_prefix("file://").unwrap_or(filename);
        let path = if Path::new(path_str).is_absolute() {
            PathBuf::from(path_str)
        } else {
            base_dir.join(path_str)
        };
        if require_meshes && !path.exists() {
            return Err(ImportError::MeshNotFound(path.to_string_lossy().to_string()));
        }
        Ok(path)
    };

    let visual = urdf_link.visual.first();
    let visual_mesh = visual.map(|v| resolve(&v.geometry)).transpose()?;
    let collision_mesh = urdf_link
        .collision
        .first()
        .map(|c| resolve(&c.geometry))
        .transpose()?;
    let material = visual
        .and_then(|v| v.material.as_ref())
        .filter(|m| !m.name.is_empty())
        .map(|m| MaterialRef::new(m.name.clone()));

    Ok(Link::part(id, visual_mesh, collision_mesh).with_material(material))
}
