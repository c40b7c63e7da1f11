//! Static chemical lookup data shared by the graph and model layers.

pub mod elements;
