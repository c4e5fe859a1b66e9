//! Comment graph & up-pollination (spec §4.7).

pub mod graph;

pub use graph::CommentGraph;
