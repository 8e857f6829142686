//! An arena-based, mutable SVG element tree, plus the structural
//! optimizer that runs over it before serialization.

pub mod node;
pub mod optimize;
pub mod serialize;
pub mod sets;

pub use node::{Document, NodeId, NodeKind};
pub use optimize::optimize;
pub use serialize::serialize;
