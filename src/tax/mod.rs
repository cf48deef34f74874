//! Tax authority registry and tax code classification

pub mod codes;

pub use codes::*;
