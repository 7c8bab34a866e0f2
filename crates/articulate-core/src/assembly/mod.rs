//! Kinematic graph of links and primitive joints
//!
//! The graph is built once per build from the articulation map and is what
//! the description serializer writes. It is rooted at the `world` link; every
//! other link hangs off exactly one primary joint.

mod decompose;
mod graph;
mod joint;
mod naming;
mod transforms;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::types::{MaterialRef, PartId, WORLD_LINK};

pub use decompose::{Decomposition, TreeError, abstract_link_name, build_tree, decompose};
pub use joint::{Joint, JointBuilder};
pub use naming::NameGenerator;

/// What a link stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    World,
    Part(PartId),
    /// Zero-geometry link inserted by pivot decomposition
    Abstract,
}

/// A link in the kinematic graph
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    pub kind: LinkKind,
    /// Mesh used for the visual element
    pub visual_mesh: Option<PathBuf>,
    /// Mesh used for the collision element
    pub collision_mesh: Option<PathBuf>,
    pub material: Option<MaterialRef>,
}

impl Link {
    /// The root link
    pub fn world() -> Self {
        Self::empty(WORLD_LINK, LinkKind::World)
    }

    /// Synthetic link between a pivoting joint and its child
    pub fn abstract_between(parent: &str, child: &str) -> Self {
        Self::synthetic(abstract_link_name(parent, child))
    }

    /// Geometry-less abstract link with an explicit name
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::empty(name, LinkKind::Abstract)
    }

    /// Link for a part, rendered with `visual_mesh` and colliding with `collision_mesh`
    pub fn part(id: PartId, visual_mesh: Option<PathBuf>, collision_mesh: Option<PathBuf>) -> Self {
        Self {
            name: id.link_name(),
            kind: LinkKind::Part(id),
            visual_mesh,
            collision_mesh,
            material: None,
        }
    }

    fn empty(name: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visual_mesh: None,
            collision_mesh: None,
            material: None,
        }
    }

    pub fn with_material(mut self, material: Option<MaterialRef>) -> Self {
        self.material = material;
        self
    }

    pub fn has_geometry(&self) -> bool {
        self.visual_mesh.is_some() || self.collision_mesh.is_some()
    }
}

/// Links and primitive joints, in insertion order
#[derive(Debug, Clone)]
pub struct KinematicGraph {
    pub name: String,
    links: Vec<Link>,
    joints: Vec<Joint>,
    link_index: HashMap<String, usize>,
    joint_index: HashMap<String, usize>,
    /// Primary joints by parent link name
    children: HashMap<String, Vec<usize>>,
    /// Primary joint by child link name
    parent: HashMap<String, usize>,
}

impl KinematicGraph {
    /// Create a graph holding only the world link
    pub fn new(name: impl Into<String>) -> Self {
        let mut graph = Self {
            name: name.into(),
            links: Vec::new(),
            joints: Vec::new(),
            link_index: HashMap::new(),
            joint_index: HashMap::new(),
            children: HashMap::new(),
            parent: HashMap::new(),
        };
        graph.link_index.insert(WORLD_LINK.to_string(), 0);
        graph.links.push(Link::world());
        graph
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.link_index.get(name).map(|&i| &self.links[i])
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_index.get(name).map(|&i| &self.joints[i])
    }

    pub fn contains_link(&self, name: &str) -> bool {
        self.link_index.contains_key(name)
    }

    /// Primary joint whose child is `link`
    pub fn parent_joint(&self, link: &str) -> Option<&Joint> {
        self.parent.get(link).map(|&i| &self.joints[i])
    }

    /// Primary joints leaving `link`
    pub fn child_joints(&self, link: &str) -> Vec<&Joint> {
        self.children
            .get(link)
            .map(|ids| ids.iter().map(|&i| &self.joints[i]).collect())
            .unwrap_or_default()
    }

    /// All joints (primary and secondary) between two links
    pub fn joints_between(&self, parent: &str, child: &str) -> Vec<&Joint> {
        self.joints
            .iter()
            .filter(|j| j.parent_link == parent && j.child_link == child)
            .collect()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Validate the tree invariant over primary joints
    pub fn validate(&self) -> Result<(), Vec<AssemblyError>> {
        let mut errors = Vec::new();

        if self.parent.contains_key(WORLD_LINK) {
            errors.push(AssemblyError::RootHasParent);
        }

        let mut reachable = HashSet::new();
        self.collect_reachable(WORLD_LINK, &mut reachable);
        for link in &self.links {
            if !reachable.contains(link.name.as_str()) {
                errors.push(AssemblyError::OrphanedLink(link.name.clone()));
            }
        }

        for joint in &self.joints {
            for name in [&joint.parent_link, &joint.child_link] {
                if !self.link_index.contains_key(name) {
                    errors.push(AssemblyError::InvalidJointReference {
                        joint: joint.name.clone(),
                        link: name.clone(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn collect_reachable<'a>(&'a self, link: &'a str, reachable: &mut HashSet<&'a str>) {
        if !reachable.insert(link) {
            return; // Already visited
        }
        if let Some(children) = self.children.get(link) {
            for &i in children {
                self.collect_reachable(&self.joints[i].child_link, reachable);
            }
        }
    }

    /// Get all link names in depth-first order from the root
    pub fn links_depth_first(&self) -> Vec<&str> {
        let mut result = Vec::new();
        self.collect_depth_first(WORLD_LINK, &mut result);
        result
    }

    fn collect_depth_first<'a>(&'a self, link: &'a str, result: &mut Vec<&'a str>) {
        result.push(link);
        if let Some(children) = self.children.get(link) {
            for &i in children {
                self.collect_depth_first(&self.joints[i].child_link, result);
            }
        }
    }
}

/// Assembly-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Link not found: {0}")]
    LinkNotFound(String),
    #[error("Duplicate link name: {0}")]
    DuplicateLink(String),
    #[error("Duplicate joint name: {0}")]
    DuplicateJoint(String),
    #[error("Connecting {parent} -> {child} would create a cycle")]
    WouldCreateCycle { parent: String, child: String },
    #[error("Link already has a parent: {0}")]
    AlreadyHasParent(String),
    #[error("The world link cannot have a parent")]
    RootHasParent,
    #[error("Orphaned link: {0}")]
    OrphanedLink(String),
    #[error("Invalid joint reference: joint {joint} references non-existent link {link}")]
    InvalidJointReference { joint: String, link: String },
}
