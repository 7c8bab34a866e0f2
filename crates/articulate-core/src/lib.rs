//! Articulated asset export
//!
//! This crate turns parts declared while a procedural asset is assembled into
//! an articulated robot description:
//! - Registry: sequential part ids, per-part OBJ export, declared edges
//! - Normalizer: canonical whole-asset mesh and per-part local origins
//! - Assembly: kinematic tree with pivot decomposition into primitive joints
//! - Export: URDF description, read back with `urdf-rs`
//!
//! All per-build state lives in a [`BuildContext`].

pub mod articulation;
pub mod assembly;
pub mod catalogue;
pub mod config;
pub mod context;
pub mod export;
pub mod import;
pub mod mesh;
pub mod normalize;
pub mod part;
pub mod registry;
pub mod types;

pub use articulation::*;
pub use assembly::*;
pub use catalogue::*;
pub use config::*;
pub use context::*;
pub use export::*;
pub use import::*;
pub use mesh::*;
pub use normalize::*;
pub use part::*;
pub use registry::*;
pub use types::*;
