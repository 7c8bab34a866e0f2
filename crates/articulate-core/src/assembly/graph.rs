//! Graph operations for KinematicGraph (add, connect)

use super::{AssemblyError, Joint, KinematicGraph, Link};

impl KinematicGraph {
    /// Add a link; names are unique
    pub fn add_link(&mut self, link: Link) -> Result<(), AssemblyError> {
        if self.link_index.contains_key(&link.name) {
            return Err(AssemblyError::DuplicateLink(link.name));
        }
        self.link_index.insert(link.name.clone(), self.links.len());
        self.links.push(link);
        Ok(())
    }

    /// Connect two existing links with a joint
    ///
    /// Primary joints must keep the graph a tree; secondary joints only need
    /// both ends to exist.
    pub fn connect(&mut self, joint: Joint) -> Result<(), AssemblyError> {
        if self.joint_index.contains_key(&joint.name) {
            return Err(AssemblyError::DuplicateJoint(joint.name));
        }
        for name in [&joint.parent_link, &joint.child_link] {
            if !self.link_index.contains_key(name) {
                return Err(AssemblyError::LinkNotFound(name.clone()));
            }
        }

        let index = self.joints.len();
        if !joint.secondary {
            if self.would_create_cycle(&joint.parent_link, &joint.child_link) {
                return Err(AssemblyError::WouldCreateCycle {
                    parent: joint.parent_link,
                    child: joint.child_link,
                });
            }
            if self.parent.contains_key(&joint.child_link) {
                return Err(AssemblyError::AlreadyHasParent(joint.child_link));
            }
            self.children
                .entry(joint.parent_link.clone())
                .or_default()
                .push(index);
            self.parent.insert(joint.child_link.clone(), index);
        }

        self.joint_index.insert(joint.name.clone(), index);
        self.joints.push(joint);
        Ok(())
    }

    /// Check if connecting parent to child would create a cycle
    pub(crate) fn would_create_cycle(&self, parent: &str, child: &str) -> bool {
        // Check if child is an ancestor of parent
        let mut current = Some(parent);
        while let Some(name) = current {
            if name == child {
                return true;
            }
            current = self
                .parent
                .get(name)
                .map(|&i| self.joints[i].parent_link.as_str());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::assembly::LinkKind;
    use crate::types::{JointType, PartId};

    fn part_link(id: u64) -> Link {
        Link::part(PartId(id), None, None)
    }

    #[test]
    fn test_new_graph_has_world_root() {
        let graph = KinematicGraph::new("scene");
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.links()[0].kind, LinkKind::World);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_connect_builds_tree() {
        let mut graph = KinematicGraph::new("scene");
        graph.add_link(part_link(0)).unwrap();
        graph.add_link(part_link(1)).unwrap();
        graph
            .connect(Joint::fixed("a", "world", "0", DVec3::ONE))
            .unwrap();
        graph.connect(Joint::fixed("b", "0", "1", DVec3::X)).unwrap();

        assert!(graph.validate().is_ok());
        assert_eq!(graph.links_depth_first(), vec!["world", "0", "1"]);
        assert_eq!(graph.parent_joint("1").unwrap().name, "b");
        assert_eq!(graph.child_joints("world").len(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut graph = KinematicGraph::new("scene");
        graph.add_link(part_link(0)).unwrap();
        graph.add_link(part_link(1)).unwrap();
        assert_eq!(
            graph.add_link(part_link(0)),
            Err(AssemblyError::DuplicateLink("0".into()))
        );

        graph.connect(Joint::fixed("j", "world", "0", DVec3::ZERO)).unwrap();
        assert_eq!(
            graph.connect(Joint::fixed("j", "0", "1", DVec3::ZERO)),
            Err(AssemblyError::DuplicateJoint("j".into()))
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let mut graph = KinematicGraph::new("scene");
        graph.add_link(part_link(0)).unwrap();
        graph.add_link(part_link(1)).unwrap();
        graph.connect(Joint::fixed("a", "0", "1", DVec3::ZERO)).unwrap();

        let result = graph.connect(Joint::fixed("b", "1", "0", DVec3::ZERO));
        assert!(matches!(result, Err(AssemblyError::WouldCreateCycle { .. })));
    }

    #[test]
    fn test_second_parent_rejected_unless_secondary() {
        let mut graph = KinematicGraph::new("scene");
        graph.add_link(part_link(0)).unwrap();
        graph.add_link(part_link(1)).unwrap();
        graph.connect(Joint::fixed("a", "world", "0", DVec3::ZERO)).unwrap();
        graph.connect(Joint::fixed("b", "0", "1", DVec3::ZERO)).unwrap();

        assert_eq!(
            graph.connect(Joint::fixed("c", "world", "1", DVec3::ZERO)),
            Err(AssemblyError::AlreadyHasParent("1".into()))
        );

        let slide = Joint::builder("d", "0", "1")
            .joint_type(JointType::Prismatic)
            .axis(Some(DVec3::Z))
            .secondary()
            .build();
        graph.connect(slide).unwrap();
        assert_eq!(graph.joints_between("0", "1").len(), 2);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_orphan_detected() {
        let mut graph = KinematicGraph::new("scene");
        graph.add_link(part_link(5)).unwrap();
        let errors = graph.validate().unwrap_err();
        assert_eq!(errors, vec![AssemblyError::OrphanedLink("5".into())]);
    }

    #[test]
    fn test_unknown_link_rejected() {
        let mut graph = KinematicGraph::new("scene");
        assert_eq!(
            graph.connect(Joint::fixed("a", "world", "3", DVec3::ZERO)),
            Err(AssemblyError::LinkNotFound("3".into()))
        );
    }
}
