//! Primitive joints and builder for the kinematic graph

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::{JointLimits, JointType, Pose};

/// A primitive joint connecting two links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub joint_type: JointType,
    /// Parent link name
    pub parent_link: String,
    /// Child link name
    pub child_link: String,
    /// Transform from parent link to joint origin
    pub origin: Pose,
    /// Joint axis (for revolute/continuous/prismatic)
    pub axis: Option<DVec3>,
    /// Joint limits
    pub limits: Option<JointLimits>,
    /// Extra degree of freedom between links already connected by a primary
    /// chain; not part of the spanning tree
    pub secondary: bool,
}

impl Joint {
    /// Create a new fixed joint at a translation
    pub fn fixed(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        translation: DVec3,
    ) -> Self {
        Self::builder(name, parent, child)
            .translation(translation)
            .build()
    }

    /// Create a builder for constructing joints with fluent API
    pub fn builder(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> JointBuilder {
        JointBuilder::new(name, parent, child)
    }

    pub fn translation(&self) -> DVec3 {
        self.origin.position()
    }
}

/// Builder for creating joints with fluent API
#[derive(Debug, Clone)]
pub struct JointBuilder {
    name: String,
    joint_type: JointType,
    parent_link: String,
    child_link: String,
    origin: Pose,
    axis: Option<DVec3>,
    limits: Option<JointLimits>,
    secondary: bool,
}

impl JointBuilder {
    /// Create a new joint builder
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type: JointType::Fixed,
            parent_link: parent.into(),
            child_link: child.into(),
            origin: Pose::default(),
            axis: None,
            limits: None,
            secondary: false,
        }
    }

    /// Set the joint type
    pub fn joint_type(mut self, joint_type: JointType) -> Self {
        self.joint_type = joint_type;
        self
    }

    /// Set the joint origin translation
    pub fn translation(mut self, translation: DVec3) -> Self {
        self.origin = Pose::from_translation(translation);
        self
    }

    /// Set the full joint origin
    pub fn origin(mut self, origin: Pose) -> Self {
        self.origin = origin;
        self
    }

    /// Set the joint axis
    pub fn axis(mut self, axis: Option<DVec3>) -> Self {
        self.axis = axis;
        self
    }

    /// Set the joint limits
    pub fn limits(mut self, limits: Option<JointLimits>) -> Self {
        self.limits = limits;
        self
    }

    /// Mark as a secondary degree of freedom
    pub fn secondary(mut self) -> Self {
        self.secondary = true;
        self
    }

    /// Build the joint; fixed joints never carry an axis or limits
    pub fn build(self) -> Joint {
        let movable = self.joint_type.has_axis();
        Joint {
            name: self.name,
            joint_type: self.joint_type,
            parent_link: self.parent_link,
            child_link: self.child_link,
            origin: self.origin,
            axis: if movable { self.axis } else { None },
            limits: if movable { self.limits } else { None },
            secondary: self.secondary,
        }
    }
}
