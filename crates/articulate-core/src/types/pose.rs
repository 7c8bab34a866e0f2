//! Pose type definition

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Pose (position and orientation) of a joint frame relative to its parent link
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub xyz: [f64; 3],
    pub rpy: [f64; 3], // roll, pitch, yaw in radians
}

impl Pose {
    pub fn new(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self { xyz, rpy }
    }

    /// Pure translation, no rotation
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            xyz: translation.to_array(),
            rpy: [0.0; 3],
        }
    }

    /// Get position as DVec3
    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.xyz)
    }

    /// Whether the pose carries any rotation
    pub fn has_rotation(&self) -> bool {
        self.rpy.iter().any(|a| *a != 0.0)
    }
}

impl From<&urdf_rs::Pose> for Pose {
    fn from(urdf_pose: &urdf_rs::Pose) -> Self {
        Self {
            xyz: [urdf_pose.xyz.0[0], urdf_pose.xyz.0[1], urdf_pose.xyz.0[2]],
            rpy: [urdf_pose.rpy.0[0], urdf_pose.rpy.0[1], urdf_pose.rpy.0[2]],
        }
    }
}
