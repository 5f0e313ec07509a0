//! External tool execution

pub mod dotnet;
pub mod subprocess;

pub use dotnet::DotNet;
