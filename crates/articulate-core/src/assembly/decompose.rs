//! Pivot decomposition and tree construction from the articulation map

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;

use super::{AssemblyError, Joint, KinematicGraph, Link, NameGenerator};
use crate::articulation::ArticulationMap;
use crate::part::PartRecord;
use crate::types::{JointSpec, JointType, ParentRef, PartId, WORLD_LINK};

const ROOT_FIXED_PREFIX: &str = "root_fixed";
const JOINT_FIXED_PREFIX: &str = "joint_fixed";
const ABSTRACT_FIXED_PREFIX: &str = "abstract_fixed";
const JOINT_PRISMATIC_PREFIX: &str = "joint_prismatic";

/// Name of the abstract link inserted between a pivoting joint and its child
pub fn abstract_link_name(parent: &str, child: &str) -> String {
    format!("abstract_{}_{}", parent, child)
}

/// Primitive joints (and optional abstract link) for one declared edge
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub abstract_link: Option<Link>,
    pub joints: Vec<Joint>,
}

/// Expand a declared joint into primitive joints
///
/// `delta` is the child origin minus the parent origin. Simple kinds map to a
/// single joint at `delta`. Pivoting kinds move the joint frame to the pivot
/// (`delta + origin_shift`) and hang the child back at `-origin_shift` below
/// an abstract link. Revolute/continuous-prismatic kinds add a prismatic joint
/// straight from parent to child.
pub fn decompose(
    parent: &str,
    child: &str,
    delta: DVec3,
    spec: &JointSpec,
    names: &mut NameGenerator,
) -> Decomposition {
    let common = spec.common();
    let joint_type = spec.kind().primary_type();

    let Some(pivot) = spec.pivot() else {
        let joint = Joint::builder(&common.name, parent, child)
            .joint_type(joint_type)
            .translation(delta)
            .axis(common.axis)
            .limits(common.limit)
            .build();
        return Decomposition {
            abstract_link: None,
            joints: vec![joint],
        };
    };

    let shift = pivot.origin_shift;
    let link = Link::abstract_between(parent, child);
    let mut joints = vec![
        Joint::builder(&common.name, parent, &link.name)
            .joint_type(joint_type)
            .translation(delta + shift)
            .axis(common.axis)
            .limits(common.limit)
            .build(),
        Joint::fixed(names.fresh(ABSTRACT_FIXED_PREFIX), &link.name, child, -shift),
    ];

    if let JointSpec::RevolutePrismatic(compound) | JointSpec::ContinuousPrismatic(compound) = spec {
        joints.push(
            Joint::builder(names.fresh(JOINT_PRISMATIC_PREFIX), parent, child)
                .joint_type(JointType::Prismatic)
                .translation(delta)
                .axis(compound.axis_1)
                .limits(compound.limit_1)
                .secondary()
                .build(),
        );
    }

    Decomposition {
        abstract_link: Some(link),
        joints,
    }
}

/// Tree construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("Cyclic parent reference through part {0}")]
    CyclicParent(PartId),
    #[error("Duplicate joint name: {0}")]
    DuplicateJointName(String),
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("Kinematic tree is invalid: {0}")]
    InvalidTree(AssemblyError),
}

/// Resolve the declared edges of a build into a kinematic graph rooted at `world`
///
/// Parts are linked in ascending id order and their joints are emitted in the
/// same order. A parent id that was never registered becomes a geometry-less
/// link at the origin, fixed to the world.
pub fn build_tree(
    robot_name: &str,
    map: &ArticulationMap,
    parts: &BTreeMap<PartId, PartRecord>,
    names: &mut NameGenerator,
) -> Result<KinematicGraph, TreeError> {
    if let Some(id) = map.find_cycle() {
        return Err(TreeError::CyclicParent(id));
    }
    for name in map.joint_names() {
        if !names.reserve(name) {
            return Err(TreeError::DuplicateJointName(name.to_string()));
        }
    }

    let mut ids: BTreeSet<PartId> = parts.keys().copied().collect();
    ids.extend(map.iter().map(|(child, _)| child));
    ids.extend(
        map.iter()
            .filter_map(|(_, edge)| edge.parent.and_then(|p| p.part())),
    );

    let mut graph = KinematicGraph::new(robot_name);
    for &id in &ids {
        graph.add_link(materialize_link(id, map, parts))?;
    }

    let origin_of = |parent: ParentRef| match parent {
        ParentRef::World => DVec3::ZERO,
        ParentRef::Part(id) => parts.get(&id).map_or(DVec3::ZERO, |p| p.origin),
    };

    for &id in &ids {
        let child = id.link_name();
        let origin = origin_of(ParentRef::Part(id));

        let (parent, spec) = match map.get(id) {
            Some(edge) => (edge.parent, edge.joint.as_ref()),
            None => {
                if !parts.contains_key(&id) {
                    tracing::warn!("Part {} is referenced as a parent but was never registered", id);
                }
                (None, None)
            }
        };

        let Some(parent) = parent else {
            let name = names.fresh(ROOT_FIXED_PREFIX);
            tracing::debug!("Fixing part {} to the world with {}", id, name);
            graph.connect(Joint::fixed(name, WORLD_LINK, &child, origin))?;
            continue;
        };

        let delta = origin - origin_of(parent);
        let parent_link = parent.link_name();
        let decomposition = match spec {
            Some(spec) => decompose(&parent_link, &child, delta, spec, names),
            None => Decomposition {
                abstract_link: None,
                joints: vec![Joint::fixed(
                    names.fresh(JOINT_FIXED_PREFIX),
                    &parent_link,
                    &child,
                    delta,
                )],
            },
        };
        tracing::debug!(
            "Edge {} -> {}: {} joint(s)",
            parent_link,
            child,
            decomposition.joints.len()
        );

        if let Some(link) = decomposition.abstract_link {
            graph.add_link(link)?;
        }
        for joint in decomposition.joints {
            graph.connect(joint)?;
        }
    }

    if let Err(errors) = graph.validate()
        && let Some(error) = errors.into_iter().next()
    {
        return Err(TreeError::InvalidTree(error));
    }
    Ok(graph)
}

fn materialize_link(id: PartId, map: &ArticulationMap, parts: &BTreeMap<PartId, PartRecord>) -> Link {
    let Some(part) = parts.get(&id) else {
        return Link::part(id, None, None);
    };
    let visual = map
        .get(id)
        .and_then(|edge| edge.joint.as_ref())
        .and_then(JointSpec::substitute_mesh_idx)
        .and_then(|other| parts.get(&other))
        .map_or_else(|| part.mesh_file.clone(), |other| other.mesh_file.clone());
    Link::part(id, Some(visual), Some(part.mesh_file.clone())).with_material(part.material.clone())
}
