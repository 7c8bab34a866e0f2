//! Core type definitions

mod id;
mod joint;
mod pose;

pub use id::*;
pub use joint::*;
pub use pose::*;
