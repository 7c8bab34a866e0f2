//! URDF serialization of a kinematic graph
//!
//! Links are kinematic placeholders: geometric links reference their mesh for
//! visual and collision, `world` and abstract links are empty, and no inertial
//! data is written.

use std::path::{Path, PathBuf};

use crate::assembly::{Joint, KinematicGraph, Link};
use crate::types::JointLimits;

/// How mesh file names are written into the description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshPaths {
    /// Absolute paths
    Absolute,
    /// Paths relative to the directory holding the description
    RelativeTo(PathBuf),
}

/// Render the graph as URDF XML
pub fn to_urdf_string(graph: &KinematicGraph, mesh_paths: &MeshPaths) -> String {
    let mut writer = DescriptionWriter::new(mesh_paths);
    writer.robot(graph);
    writer.output
}

/// Write the graph as a URDF file
pub fn write_description(
    graph: &KinematicGraph,
    path: impl AsRef<Path>,
    mesh_paths: &MeshPaths,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let content = to_urdf_string(graph, mesh_paths);
    std::fs::write(path, content).map_err(|e| ExportError::Io(format!("{}: {}", path.display(), e)))?;
    tracing::info!(
        "Wrote {} ({} links, {} joints)",
        path.display(),
        graph.link_count(),
        graph.joint_count()
    );
    Ok(())
}

struct DescriptionWriter<'a> {
    mesh_paths: &'a MeshPaths,
    output: String,
    indent: usize,
}

impl<'a> DescriptionWriter<'a> {
    fn new(mesh_paths: &'a MeshPaths) -> Self {
        Self {
            mesh_paths,
            output: String::with_capacity(4096),
            indent: 0,
        }
    }

    fn robot(&mut self, graph: &KinematicGraph) {
        self.write_line(r#"<?xml version="1.0"?>"#);
        self.write_line(&format!(r#"<robot name="{}">"#, escape(&graph.name)));
        self.indent += 1;
        for link in graph.links() {
            self.link(link);
        }
        for joint in graph.joints() {
            self.joint(joint);
        }
        self.indent -= 1;
        self.write_line("</robot>");
    }

    fn link(&mut self, link: &Link) {
        let name = escape(&link.name);
        if !link.has_geometry() {
            self.write_line(&format!(r#"<link name="{name}"/>"#));
            return;
        }

        self.write_line(&format!(r#"<link name="{name}">"#));
        self.indent += 1;
        if let Some(mesh) = &link.visual_mesh {
            self.write_line("<visual>");
            self.indent += 1;
            self.write_line(r#"<origin xyz="0 0 0" rpy="0 0 0"/>"#);
            self.geometry(mesh);
            if let Some(material) = &link.material {
                self.write_line(&format!(r#"<material name="{}"/>"#, escape(material.name())));
            }
            self.indent -= 1;
            self.write_line("</visual>");
        }
        if let Some(mesh) = &link.collision_mesh {
            self.write_line("<collision>");
            self.indent += 1;
            self.write_line(r#"<origin xyz="0 0 0" rpy="0 0 0"/>"#);
            self.geometry(mesh);
            self.indent -= 1;
            self.write_line("</collision>");
        }
        self.indent -= 1;
        self.write_line("</link>");
    }

    fn geometry(&mut self, mesh: &Path) {
        let filename = self.mesh_filename(mesh);
        self.write_line("<geometry>");
        self.indent += 1;
        self.write_line(&format!(r#"<mesh filename="{}"/>"#, escape(&filename)));
        self.indent -= 1;
        self.write_line("</geometry>");
    }

    fn joint(&mut self, joint: &Joint) {
        self.write_line(&format!(
            r#"<joint name="{}" type="{}">"#,
            escape(&joint.name),
            joint.joint_type.urdf_name()
        ));
        self.indent += 1;

        let [x, y, z] = joint.origin.xyz;
        let [roll, pitch, yaw] = joint.origin.rpy;
        self.write_line(&format!(
            r#"<origin xyz="{x} {y} {z}" rpy="{roll} {pitch} {yaw}"/>"#
        ));
        self.write_line(&format!(r#"<parent link="{}"/>"#, escape(&joint.parent_link)));
        self.write_line(&format!(r#"<child link="{}"/>"#, escape(&joint.child_link)));

        if joint.joint_type.has_axis() {
            let axis = joint.axis.unwrap_or(glam::DVec3::X);
            self.write_line(&format!(r#"<axis xyz="{} {} {}"/>"#, axis.x, axis.y, axis.z));
        }
        // Revolute and prismatic joints must carry limits
        let limits = match joint.limits {
            Some(limits) if joint.joint_type.has_axis() => Some(limits),
            None if joint.joint_type.has_limits() => Some(JointLimits::default()),
            _ => None,
        };
        if let Some(limits) = limits {
            self.write_line(&format!(
                r#"<limit lower="{}" upper="{}" effort="{}" velocity="{}"/>"#,
                limits.lower, limits.upper, limits.effort, limits.velocity
            ));
        }

        self.indent -= 1;
        self.write_line("</joint>");
    }

    fn mesh_filename(&self, mesh: &Path) -> String {
        let resolved = match self.mesh_paths {
            MeshPaths::Absolute => std::path::absolute(mesh).unwrap_or_else(|_| mesh.to_path_buf()),
            MeshPaths::RelativeTo(base) => mesh
                .strip_prefix(base)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| mesh.to_path_buf()),
        };
        resolved.to_string_lossy().replace('\\', "/")
    }

    fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

/// Escape a value for use inside a double-quoted XML attribute
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Description export errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),
}
