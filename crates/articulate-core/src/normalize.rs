//! Mesh normalization at finalize
//!
//! The whole-asset mesh is centered, uniformly rescaled to a canonical extent
//! and realigned from Z-up to Y-up. Part files are only recentered on their
//! own bounding boxes; they keep the world scale the joints are computed in.

use std::collections::BTreeMap;
use std::path::Path;

use glam::DVec3;

use crate::mesh::{Mesh, MeshError, load_obj, write_obj};
use crate::part::PartRecord;
use crate::types::{MaterialRef, PartId};

/// Transform applied to the whole-asset mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WholeTransform {
    /// Bounding box center subtracted before scaling
    pub center: DVec3,
    /// Uniform scale factor
    pub scale: f64,
    pub realigned: bool,
}

/// Rotate -90 degrees about +X, taking a Z-up frame to a Y-up frame
pub fn z_up_to_y_up(v: DVec3) -> DVec3 {
    DVec3::new(v.x, v.z, -v.y)
}

/// Center, rescale and optionally realign the combined asset mesh
///
/// The longest bounding box side becomes `canonical_extent`. A mesh with no
/// extent is centered but not scaled.
pub fn normalize_whole(
    mesh: &Mesh,
    canonical_extent: f64,
    realign: bool,
) -> Result<(Mesh, WholeTransform), MeshError> {
    let bbox = mesh.bounding_box().ok_or(MeshError::EmptyMesh)?;
    let center = bbox.center();
    let longest = bbox.longest_side();
    let scale = if longest > 0.0 {
        canonical_extent / longest
    } else {
        1.0
    };

    let mut normalized = mesh.clone();
    normalized.map_vertices(|v| {
        let v = (v - center) * scale;
        if realign { z_up_to_y_up(v) } else { v }
    });

    Ok((
        normalized,
        WholeTransform {
            center,
            scale,
            realigned: realign,
        },
    ))
}

/// Move a part file onto its own local origin; returns the subtracted center
pub fn recenter_part_file(
    path: &Path,
    material: Option<&MaterialRef>,
) -> Result<DVec3, MeshError> {
    let mut mesh = load_obj(path)?;
    let center = mesh.bounding_box().ok_or(MeshError::EmptyMesh)?.center();
    mesh.translate(-center);
    mesh.material = material.cloned();
    write_obj(&mesh, path)?;
    Ok(center)
}

/// Recenter every part file and record the subtracted centers as origins
pub fn recenter_parts(parts: &mut BTreeMap<PartId, PartRecord>) -> Result<(), MeshError> {
    for part in parts.values_mut() {
        let center = recenter_part_file(&part.mesh_file, part.material.as_ref())?;
        tracing::debug!("Recentered part {} at {:?}", part.id, center);
        part.origin = center;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_whole_normalization_fits_extent() {
        let mesh = Mesh::cuboid("asset", DVec3::new(1.0, 1.0, 0.0), DVec3::new(3.0, 2.0, 4.0));
        let (normalized, transform) = normalize_whole(&mesh, 1.0, false).unwrap();

        assert_eq!(transform.center, DVec3::new(2.0, 1.5, 2.0));
        assert_abs_diff_eq!(transform.scale, 0.25);
        let bbox = normalized.bounding_box().unwrap();
        assert_abs_diff_eq!(bbox.longest_side(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.center().length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_realign_maps_z_up_to_y_up() {
        assert_eq!(z_up_to_y_up(DVec3::Z), DVec3::Y);
        assert_eq!(z_up_to_y_up(DVec3::Y), DVec3::NEG_Z);
        assert_eq!(z_up_to_y_up(DVec3::X), DVec3::X);

        // Tall along Z before, tall along Y after
        let mesh = Mesh::cuboid("tall", DVec3::ZERO, DVec3::new(0.5, 0.5, 2.0));
        let (normalized, _) = normalize_whole(&mesh, 2.0, true).unwrap();
        let size = normalized.bounding_box().unwrap().size();
        assert_abs_diff_eq!(size.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(size.z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_mesh_is_not_scaled() {
        let mesh = Mesh::from_triangles("point", vec![[1.0, 1.0, 1.0]; 3], vec![0, 1, 2]);
        let (normalized, transform) = normalize_whole(&mesh, 1.0, false).unwrap();
        assert_eq!(transform.scale, 1.0);
        assert_eq!(normalized.vertices[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_recentered_part_file_reads_back_centered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.obj");
        let mesh = Mesh::cuboid("door", DVec3::new(0.3, -1.7, 2.1), DVec3::new(0.9, 0.4, 3.35));
        write_obj(&mesh, &path).unwrap();

        let center = recenter_part_file(&path, None).unwrap();
        assert_abs_diff_eq!(center.x, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(center.y, -0.65, epsilon = 1e-12);
        assert_abs_diff_eq!(center.z, 2.725, epsilon = 1e-12);

        let reread = load_obj(&path).unwrap().bounding_box().unwrap();
        let c = reread.center();
        assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.z, 0.0, epsilon = 1e-6);
        // Parts are not rescaled
        assert_abs_diff_eq!(reread.size().y, 2.1, epsilon = 1e-9);
    }

    #[test]
    fn test_recenter_parts_updates_origins() {
        let dir = tempfile::tempdir().unwrap();
        let mut parts = BTreeMap::new();
        for (i, min) in [DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)].into_iter().enumerate() {
            let id = PartId(i as u64);
            let path = dir.path().join(id.file_name());
            write_obj(&Mesh::cuboid("p", min, min + DVec3::ONE), &path).unwrap();
            parts.insert(id, PartRecord::new(id, "p", path, DVec3::ZERO));
        }

        recenter_parts(&mut parts).unwrap();
        assert_eq!(parts[&PartId(0)].origin, DVec3::splat(0.5));
        assert_eq!(parts[&PartId(1)].origin, DVec3::new(2.5, 0.5, 0.5));
    }
}
