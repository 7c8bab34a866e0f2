//! Wavefront OBJ reading and writing

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::DVec3;

use super::{Mesh, MeshError};

/// Write a mesh as an OBJ file (positions and triangular faces only)
pub fn write_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), MeshError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| MeshError::Io(format!("{}: {}", path.display(), e)))?;
    let mut out = BufWriter::new(file);

    let io = |e: std::io::Error| MeshError::Io(format!("{}: {}", path.display(), e));

    if !mesh.name.is_empty() {
        writeln!(out, "o {}", mesh.name).map_err(io)?;
    }
    for v in &mesh.vertices {
        writeln!(out, "v {} {} {}", v[0], v[1], v[2]).map_err(io)?;
    }
    if let Some(material) = &mesh.material {
        writeln!(out, "usemtl {}", material.name()).map_err(io)?;
    }
    // OBJ indices are 1-based
    for tri in mesh.indices.chunks_exact(3) {
        writeln!(out, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1).map_err(io)?;
    }
    out.flush().map_err(io)?;
    Ok(())
}

/// Load an OBJ file into a single mesh, merging all of its objects
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, MeshError> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::Parse(format!("{}: {}", path.display(), e)))?;

    if models.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let mut mesh = Mesh::new(name);

    for model in &models {
        let offset = mesh.vertices.len() as u32;
        mesh.vertices.extend(model.mesh.positions.chunks_exact(3).map(|p| {
            [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])]
        }));
        mesh.indices
            .extend(model.mesh.indices.iter().map(|i| i + offset));
    }

    Ok(mesh)
}

/// Mesh exporter: write one part's geometry and report its world-space
/// bounding-box center
pub fn export_part(mesh: &Mesh, path: impl AsRef<Path>) -> Result<DVec3, MeshError> {
    let bbox = mesh.bounding_box().ok_or(MeshError::EmptyMesh)?;
    write_obj(mesh, path)?;
    Ok(bbox.center())
}
