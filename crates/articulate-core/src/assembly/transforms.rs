//! World placement of links along the primary chain

use glam::DVec3;

use super::KinematicGraph;

impl KinematicGraph {
    /// Link names from `link` up to the root, inclusive
    pub fn chain_to_root(&self, link: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.link(link).map(|l| l.name.as_str());
        while let Some(name) = current {
            chain.push(name);
            current = self.parent_joint(name).map(|j| j.parent_link.as_str());
        }
        chain
    }

    /// World position of a link's frame with every joint at zero
    ///
    /// Joint origins here are pure translations, so the placement is the sum of
    /// the translations along the primary chain.
    pub fn world_translation(&self, link: &str) -> Option<DVec3> {
        if !self.contains_link(link) {
            return None;
        }
        let mut translation = DVec3::ZERO;
        let mut current = link;
        while let Some(joint) = self.parent_joint(current) {
            translation += joint.translation();
            current = &joint.parent_link;
        }
        Some(translation)
    }

    /// Depth of a link below the root
    pub fn link_depth(&self, link: &str) -> usize {
        self.chain_to_root(link).len().saturating_sub(1)
    }
}
