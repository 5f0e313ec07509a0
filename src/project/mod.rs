//! Solution and project files
//!
//! Loads the solution's project list, reads the packaging flag of each
//! project, and writes build versions back into project and record files.

pub mod descriptor;
pub mod solution;
pub mod writer;
pub mod xml;

pub use descriptor::ProjectDescriptor;
pub use solution::Solution;
