//! Joint-related type definitions
//!
//! Two layers live here: the primitive [`JointType`] a robot description can
//! express, and the declared [`JointSpec`] the geometry side emits, which may be
//! a compound or pivoting kind that the tree builder later decomposes.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::PartId;

/// Default effort limit written for every limited joint
pub const DEFAULT_EFFORT: f64 = 2000.0;
/// Default velocity limit written for every limited joint
pub const DEFAULT_VELOCITY: f64 = 2.0;

/// Primitive joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    #[default]
    Fixed,
    Revolute,
    Continuous,
    Prismatic,
}

impl JointType {
    /// Check if this joint type has an axis
    pub fn has_axis(&self) -> bool {
        matches!(
            self,
            JointType::Revolute | JointType::Continuous | JointType::Prismatic
        )
    }

    /// Check if this joint type has limits
    pub fn has_limits(&self) -> bool {
        matches!(self, JointType::Revolute | JointType::Prismatic)
    }

    /// Name of the type in URDF
    pub fn urdf_name(&self) -> &'static str {
        match self {
            JointType::Fixed => "fixed",
            JointType::Revolute => "revolute",
            JointType::Continuous => "continuous",
            JointType::Prismatic => "prismatic",
        }
    }

    /// Convert from a parsed URDF joint type; floating, planar and spherical
    /// joints have no counterpart here
    pub fn from_urdf(urdf_type: &urdf_rs::JointType) -> Option<Self> {
        match urdf_type {
            urdf_rs::JointType::Fixed => Some(JointType::Fixed),
            urdf_rs::JointType::Revolute => Some(JointType::Revolute),
            urdf_rs::JointType::Continuous => Some(JointType::Continuous),
            urdf_rs::JointType::Prismatic => Some(JointType::Prismatic),
            _ => None,
        }
    }
}

/// Declared joint kind, as emitted by the geometry side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    #[default]
    Fixed,
    Prismatic,
    Revolute,
    Continuous,
    RevolutePrismatic,
    ContinuousPrismatic,
    FlipRevolute,
}

impl JointKind {
    /// Wire name of the kind
    pub fn wire_name(&self) -> &'static str {
        match self {
            JointKind::Fixed => "fixed",
            JointKind::Prismatic => "prismatic",
            JointKind::Revolute => "revolute",
            JointKind::Continuous => "continuous",
            JointKind::RevolutePrismatic => "revolute_prismatic",
            JointKind::ContinuousPrismatic => "continuous_prismatic",
            JointKind::FlipRevolute => "flip_revolute",
        }
    }

    /// Kinds that rotate about a pivot and need an abstract link
    pub fn is_pivoting(&self) -> bool {
        !matches!(self, JointKind::Fixed | JointKind::Prismatic)
    }

    /// Kinds carrying a second degree of freedom (`axis_1`/`limit_1`)
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            JointKind::RevolutePrismatic | JointKind::ContinuousPrismatic | JointKind::FlipRevolute
        )
    }

    /// Primitive type of the first (or only) emitted joint
    pub fn primary_type(&self) -> JointType {
        match self {
            JointKind::Fixed => JointType::Fixed,
            JointKind::Prismatic => JointType::Prismatic,
            JointKind::Revolute | JointKind::RevolutePrismatic | JointKind::FlipRevolute => {
                JointType::Revolute
            }
            JointKind::Continuous | JointKind::ContinuousPrismatic => JointType::Continuous,
        }
    }
}

/// Joint limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Lower position limit (rad or m)
    pub lower: f64,
    /// Upper position limit (rad or m)
    pub upper: f64,
    /// Maximum effort (N or Nm)
    pub effort: f64,
    /// Maximum velocity (rad/s or m/s)
    pub velocity: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            lower: -1.0,
            upper: 1.0,
            effort: DEFAULT_EFFORT,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

impl JointLimits {
    /// Create limits with specified range
    pub fn with_range(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            ..Self::default()
        }
    }
}

/// Fields shared by every joint kind
#[derive(Debug, Clone, PartialEq)]
pub struct JointCommon {
    pub name: String,
    pub axis: Option<DVec3>,
    pub limit: Option<JointLimits>,
    /// Render this link with another part's mesh
    pub substitute_mesh_idx: Option<PartId>,
}

/// A joint rotating about a point offset from the parent/child midpoint
#[derive(Debug, Clone, PartialEq)]
pub struct PivotJoint {
    pub common: JointCommon,
    pub origin_shift: DVec3,
}

/// A pivoting joint with a second, prismatic degree of freedom
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundJoint {
    pub pivot: PivotJoint,
    pub axis_1: Option<DVec3>,
    pub limit_1: Option<JointLimits>,
}

/// A declared joint between a part and its parent
#[derive(Debug, Clone, PartialEq)]
pub enum JointSpec {
    Fixed(JointCommon),
    Prismatic(JointCommon),
    Revolute(PivotJoint),
    Continuous(PivotJoint),
    RevolutePrismatic(CompoundJoint),
    ContinuousPrismatic(CompoundJoint),
    /// Only the rotational half is decomposed; `axis_1`/`limit_1` are carried but unused
    FlipRevolute(CompoundJoint),
}

impl JointSpec {
    /// Start building a joint spec
    pub fn builder(name: impl Into<String>) -> JointSpecBuilder {
        JointSpecBuilder::new(name)
    }

    /// A fixed joint with no axis or limits
    pub fn fixed(name: impl Into<String>) -> Self {
        JointSpec::Fixed(JointCommon {
            name: name.into(),
            axis: None,
            limit: None,
            substitute_mesh_idx: None,
        })
    }

    pub fn kind(&self) -> JointKind {
        match self {
            JointSpec::Fixed(_) => JointKind::Fixed,
            JointSpec::Prismatic(_) => JointKind::Prismatic,
            JointSpec::Revolute(_) => JointKind::Revolute,
            JointSpec::Continuous(_) => JointKind::Continuous,
            JointSpec::RevolutePrismatic(_) => JointKind::RevolutePrismatic,
            JointSpec::ContinuousPrismatic(_) => JointKind::ContinuousPrismatic,
            JointSpec::FlipRevolute(_) => JointKind::FlipRevolute,
        }
    }

    pub fn common(&self) -> &JointCommon {
        match self {
            JointSpec::Fixed(c) | JointSpec::Prismatic(c) => c,
            JointSpec::Revolute(p) | JointSpec::Continuous(p) => &p.common,
            JointSpec::RevolutePrismatic(c)
            | JointSpec::ContinuousPrismatic(c)
            | JointSpec::FlipRevolute(c) => &c.pivot.common,
        }
    }

    fn common_mut(&mut self) -> &mut JointCommon {
        match self {
            JointSpec::Fixed(c) | JointSpec::Prismatic(c) => c,
            JointSpec::Revolute(p) | JointSpec::Continuous(p) => &mut p.common,
            JointSpec::RevolutePrismatic(c)
            | JointSpec::ContinuousPrismatic(c)
            | JointSpec::FlipRevolute(c) => &mut c.pivot.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn substitute_mesh_idx(&self) -> Option<PartId> {
        self.common().substitute_mesh_idx
    }

    /// Pivot data for pivoting kinds
    pub fn pivot(&self) -> Option<&PivotJoint> {
        match self {
            JointSpec::Fixed(_) | JointSpec::Prismatic(_) => None,
            JointSpec::Revolute(p) | JointSpec::Continuous(p) => Some(p),
            JointSpec::RevolutePrismatic(c)
            | JointSpec::ContinuousPrismatic(c)
            | JointSpec::FlipRevolute(c) => Some(&c.pivot),
        }
    }

    /// Second degree of freedom for compound kinds
    pub fn compound(&self) -> Option<&CompoundJoint> {
        match self {
            JointSpec::RevolutePrismatic(c)
            | JointSpec::ContinuousPrismatic(c)
            | JointSpec::FlipRevolute(c) => Some(c),
            _ => None,
        }
    }

    /// Copy of this spec under another name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut spec = self.clone();
        spec.common_mut().name = name.into();
        spec
    }

    /// Check the invariants every constructed spec must hold
    pub fn validate(&self) -> Result<(), JointSpecError> {
        let common = self.common();
        let name = &common.name;
        if name.trim().is_empty() {
            return Err(JointSpecError::EmptyName);
        }
        if let Some(axis) = common.axis {
            check_axis(name, "axis", axis)?;
        }
        if let Some(limit) = common.limit {
            check_limits(name, limit)?;
        }
        if let Some(pivot) = self.pivot()
            && !pivot.origin_shift.is_finite()
        {
            return Err(JointSpecError::InvalidOriginShift { name: name.clone() });
        }
        if let Some(compound) = self.compound() {
            if let Some(axis) = compound.axis_1 {
                check_axis(name, "axis_1", axis)?;
            }
            if let Some(limit) = compound.limit_1 {
                check_limits(name, limit)?;
            }
        }
        Ok(())
    }
}

fn check_axis(name: &str, field: &'static str, axis: DVec3) -> Result<(), JointSpecError> {
    if !axis.is_finite() || axis.length_squared() == 0.0 {
        return Err(JointSpecError::InvalidAxis {
            name: name.to_string(),
            field,
        });
    }
    Ok(())
}

fn check_limits(name: &str, limit: JointLimits) -> Result<(), JointSpecError> {
    if limit.lower > limit.upper {
        return Err(JointSpecError::InvertedLimits {
            name: name.to_string(),
            lower: limit.lower,
            upper: limit.upper,
        });
    }
    Ok(())
}

/// Builder for creating joint specs with fluent API
#[derive(Debug, Clone)]
pub struct JointSpecBuilder {
    name: String,
    kind: JointKind,
    axis: Option<DVec3>,
    limit: Option<JointLimits>,
    axis_1: Option<DVec3>,
    limit_1: Option<JointLimits>,
    origin_shift: Option<DVec3>,
    substitute_mesh_idx: Option<PartId>,
}

impl JointSpecBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Fixed,
            axis: None,
            limit: None,
            axis_1: None,
            limit_1: None,
            origin_shift: None,
            substitute_mesh_idx: None,
        }
    }

    pub fn kind(mut self, kind: JointKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn fixed(self) -> Self {
        self.kind(JointKind::Fixed)
    }

    pub fn prismatic(self) -> Self {
        self.kind(JointKind::Prismatic)
    }

    pub fn revolute(self) -> Self {
        self.kind(JointKind::Revolute)
    }

    pub fn continuous(self) -> Self {
        self.kind(JointKind::Continuous)
    }

    pub fn revolute_prismatic(self) -> Self {
        self.kind(JointKind::RevolutePrismatic)
    }

    pub fn continuous_prismatic(self) -> Self {
        self.kind(JointKind::ContinuousPrismatic)
    }

    pub fn flip_revolute(self) -> Self {
        self.kind(JointKind::FlipRevolute)
    }

    pub fn axis(mut self, axis: DVec3) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn axis_xyz(self, x: f64, y: f64, z: f64) -> Self {
        self.axis(DVec3::new(x, y, z))
    }

    pub fn limits(mut self, limits: JointLimits) -> Self {
        self.limit = Some(limits);
        self
    }

    pub fn limits_range(self, lower: f64, upper: f64) -> Self {
        self.limits(JointLimits::with_range(lower, upper))
    }

    /// Axis of the second (prismatic) degree of freedom
    pub fn axis_1(mut self, axis: DVec3) -> Self {
        self.axis_1 = Some(axis);
        self
    }

    pub fn limits_1(mut self, limits: JointLimits) -> Self {
        self.limit_1 = Some(limits);
        self
    }

    pub fn limits_1_range(self, lower: f64, upper: f64) -> Self {
        self.limits_1(JointLimits::with_range(lower, upper))
    }

    /// Pivot point relative to the parent/child midpoint
    pub fn origin_shift(mut self, shift: DVec3) -> Self {
        self.origin_shift = Some(shift);
        self
    }

    pub fn substitute_mesh(mut self, part: PartId) -> Self {
        self.substitute_mesh_idx = Some(part);
        self
    }

    /// Build and validate the spec
    pub fn build(self) -> Result<JointSpec, JointSpecError> {
        let kind = self.kind;
        if !kind.is_pivoting() && self.origin_shift.is_some_and(|s| s != DVec3::ZERO) {
            return Err(JointSpecError::FieldNotApplicable {
                name: self.name,
                field: "origin_shift",
                kind: kind.wire_name(),
            });
        }
        if !kind.is_compound() && (self.axis_1.is_some() || self.limit_1.is_some()) {
            return Err(JointSpecError::FieldNotApplicable {
                name: self.name,
                field: "axis_1/limit_1",
                kind: kind.wire_name(),
            });
        }

        let common = JointCommon {
            name: self.name,
            axis: self.axis,
            limit: self.limit,
            substitute_mesh_idx: self.substitute_mesh_idx,
        };
        let pivot = || PivotJoint {
            common: common.clone(),
            origin_shift: self.origin_shift.unwrap_or(DVec3::ZERO),
        };
        let compound = || CompoundJoint {
            pivot: pivot(),
            axis_1: self.axis_1,
            limit_1: self.limit_1,
        };

        let spec = match kind {
            JointKind::Fixed => JointSpec::Fixed(common.clone()),
            JointKind::Prismatic => JointSpec::Prismatic(common.clone()),
            JointKind::Revolute => JointSpec::Revolute(pivot()),
            JointKind::Continuous => JointSpec::Continuous(pivot()),
            JointKind::RevolutePrismatic => JointSpec::RevolutePrismatic(compound()),
            JointKind::ContinuousPrismatic => JointSpec::ContinuousPrismatic(compound()),
            JointKind::FlipRevolute => JointSpec::FlipRevolute(compound()),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Joint spec validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JointSpecError {
    #[error("Joint name must not be empty")]
    EmptyName,
    #[error("Joint '{name}': {field} must be a finite non-zero vector")]
    InvalidAxis { name: String, field: &'static str },
    #[error("Joint '{name}': lower limit {lower} exceeds upper limit {upper}")]
    InvertedLimits { name: String, lower: f64, upper: f64 },
    #[error("Joint '{name}': origin shift must be finite")]
    InvalidOriginShift { name: String },
    #[error("Joint '{name}': {field} does not apply to {kind} joints")]
    FieldNotApplicable {
        name: String,
        field: &'static str,
        kind: &'static str,
    },
}

fn default_lower() -> f64 {
    -1.0
}

fn default_upper() -> f64 {
    1.0
}

fn default_effort() -> f64 {
    DEFAULT_EFFORT
}

fn default_velocity() -> f64 {
    DEFAULT_VELOCITY
}

/// Limit record as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitWire {
    #[serde(default = "default_lower")]
    pub lower: f64,
    #[serde(default = "default_upper")]
    pub upper: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_1: Option<f64>,
    #[serde(default = "default_effort")]
    pub effort: f64,
    #[serde(default = "default_velocity")]
    pub velocity: f64,
}

/// Loosely-typed joint record as emitted by script or JSON callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointWire {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: JointKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_1: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitWire>,
    #[serde(default)]
    pub origin_shift: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute_mesh_idx: Option<u64>,
}

impl TryFrom<JointWire> for JointSpec {
    type Error = JointSpecError;

    fn try_from(wire: JointWire) -> Result<Self, Self::Error> {
        let mut builder = JointSpec::builder(wire.name).kind(wire.kind);
        if let Some(axis) = wire.axis {
            builder = builder.axis(DVec3::from_array(axis));
        }
        if let Some(limit) = &wire.limit {
            builder = builder.limits(JointLimits {
                lower: limit.lower,
                upper: limit.upper,
                effort: limit.effort,
                velocity: limit.velocity,
            });
        }
        if wire.kind.is_compound() {
            if let Some(axis) = wire.axis_1 {
                builder = builder.axis_1(DVec3::from_array(axis));
            }
            if let Some(limit) = &wire.limit
                && (limit.lower_1.is_some() || limit.upper_1.is_some())
            {
                builder = builder.limits_1(JointLimits {
                    lower: limit.lower_1.unwrap_or(-1.0),
                    upper: limit.upper_1.unwrap_or(1.0),
                    effort: limit.effort,
                    velocity: limit.velocity,
                });
            }
        } else if let Some(axis) = wire.axis_1 {
            // rejected by build() for non-compound kinds
            builder = builder.axis_1(DVec3::from_array(axis));
        }
        if wire.kind.is_pivoting() || wire.origin_shift != [0.0; 3] {
            builder = builder.origin_shift(DVec3::from_array(wire.origin_shift));
        }
        if let Some(idx) = wire.substitute_mesh_idx {
            builder = builder.substitute_mesh(PartId(idx));
        }
        builder.build()
    }
}

impl From<&JointSpec> for JointWire {
    fn from(spec: &JointSpec) -> Self {
        let common = spec.common();
        let compound = spec.compound();
        let limit_1 = compound.and_then(|c| c.limit_1);
        let limit = match (common.limit, limit_1) {
            (None, None) => None,
            (limit, limit_1) => {
                let base = limit.or(limit_1).unwrap_or_default();
                Some(LimitWire {
                    lower: limit.map_or(-1.0, |l| l.lower),
                    upper: limit.map_or(1.0, |l| l.upper),
                    lower_1: limit_1.map(|l| l.lower),
                    upper_1: limit_1.map(|l| l.upper),
                    effort: base.effort,
                    velocity: base.velocity,
                })
            }
        };
        Self {
            name: common.name.clone(),
            kind: spec.kind(),
            axis: common.axis.map(|a| a.to_array()),
            axis_1: compound.and_then(|c| c.axis_1).map(|a| a.to_array()),
            limit,
            origin_shift: spec
                .pivot()
                .map_or([0.0; 3], |p| p.origin_shift.to_array()),
            substitute_mesh_idx: common.substitute_mesh_idx.map(|id| id.0),
        }
    }
}

impl Serialize for JointSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        JointWire::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JointSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = JointWire::deserialize(deserializer)?;
        JointSpec::try_from(wire).map_err(serde::de::Error::custom)
    }
}
