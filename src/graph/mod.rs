//! Structure report parsing and display-graph preparation.

pub mod augment;
pub mod builder;
pub mod model;
pub mod report;

pub use augment::{DisplayGraph, SeededNode, augment};
pub use builder::build_graph;
pub use model::{Graph, Link, LinkKind, Node, NodeKind};
