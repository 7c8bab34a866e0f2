//! Triangle meshes handed over by the geometry side, and their OBJ files

mod obj;

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;

use crate::types::MaterialRef;

pub use obj::{export_part, load_obj, write_obj};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Get the center of the bounding box
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) / 2.0
    }

    /// Get the size of the bounding box
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the longest side
    pub fn longest_side(&self) -> f64 {
        self.size().max_element()
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<[f64; 3]>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
    /// Named integer attributes, one value per vertex
    pub attributes: BTreeMap<String, Vec<i32>>,
    pub material: Option<MaterialRef>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_triangles(
        name: impl Into<String>,
        vertices: Vec<[f64; 3]>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            ..Self::default()
        }
    }

    /// Closed box spanning `min`..`max`
    pub fn cuboid(name: impl Into<String>, min: DVec3, max: DVec3) -> Self {
        let vertices = (0..8)
            .map(|i| {
                [
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                ]
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        Self::from_triangles(name, vertices, indices)
    }

    pub fn with_material(mut self, material: MaterialRef) -> Self {
        self.material = Some(material);
        self
    }

    /// Attach a per-vertex integer attribute
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<i32>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// A mesh with no exportable faces
    pub fn is_degenerate(&self) -> bool {
        self.face_count() == 0 || self.vertices.is_empty()
    }

    /// Calculate bounding box from vertices
    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = DVec3::from_array(*self.vertices.first()?);
        let (min, max) = self
            .vertices
            .iter()
            .map(|v| DVec3::from_array(*v))
            .fold((first, first), |(min, max), v| (min.min(v), max.max(v)));
        Some(Aabb { min, max })
    }

    pub fn translate(&mut self, offset: DVec3) {
        for v in &mut self.vertices {
            *v = (DVec3::from_array(*v) + offset).to_array();
        }
    }

    /// Apply a map to every vertex position
    pub fn map_vertices(&mut self, f: impl Fn(DVec3) -> DVec3) {
        for v in &mut self.vertices {
            *v = f(DVec3::from_array(*v)).to_array();
        }
    }

    /// Extract the sub-mesh whose vertices match every `(attribute, value)` pair
    ///
    /// Only faces with all three vertices selected are kept, and only vertices
    /// of kept faces. Missing attributes select nothing, so the result is
    /// degenerate rather than an error.
    pub fn select(&self, filters: &[(&str, i32)]) -> Mesh {
        let mut result = Mesh::new(self.name.clone());
        result.material = self.material.clone();

        let layers: Option<Vec<(&Vec<i32>, i32)>> = filters
            .iter()
            .map(|(name, value)| self.attributes.get(*name).map(|layer| (layer, *value)))
            .collect();
        let Some(layers) = layers else {
            return result;
        };
        let selected = |i: u32| {
            (i as usize) < self.vertices.len()
                && layers
                    .iter()
                    .all(|(layer, value)| layer.get(i as usize) == Some(value))
        };

        let mut remap: HashMap<u32, u32> = HashMap::new();
        for tri in self.indices.chunks_exact(3) {
            if !tri.iter().all(|&i| selected(i)) {
                continue;
            }
            for &i in tri {
                let index = *remap.entry(i).or_insert_with(|| {
                    result.vertices.push(self.vertices[i as usize]);
                    for (name, layer) in &self.attributes {
                        if let Some(v) = layer.get(i as usize) {
                            result.attributes.entry(name.clone()).or_default().push(*v);
                        }
                    }
                    (result.vertices.len() - 1) as u32
                });
                result.indices.push(index);
            }
        }
        result
    }

    /// Concatenate meshes into one, keeping the first material
    pub fn join<'a>(name: impl Into<String>, meshes: impl IntoIterator<Item = &'a Mesh>) -> Mesh {
        let mut result = Mesh::new(name);
        for mesh in meshes {
            let offset = result.vertices.len() as u32;
            result.vertices.extend_from_slice(&mesh.vertices);
            result
                .indices
                .extend(mesh.indices.iter().map(|i| i + offset));
            if result.material.is_none() {
                result.material = mesh.material.clone();
            }
        }
        result
    }
}

/// Mesh-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty mesh: no geometry found")]
    EmptyMesh,
}
