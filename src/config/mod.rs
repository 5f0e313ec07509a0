//! Build configuration: the `build.toml` settings file, build configuration
//! selection and CI detection

pub mod build_toml;
pub mod environment;

use clap::ValueEnum;

pub use build_toml::{BuildSection, BuildToml};

/// Build configuration passed to the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Configuration {
    Debug,
    Release,
}

impl Configuration {
    /// `Debug` on a developer machine, `Release` on a build server
    pub fn default_for_environment() -> Self {
        if environment::is_server_build() {
            Configuration::Release
        } else {
            Configuration::Debug
        }
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Configuration::Debug => write!(f, "Debug"),
            Configuration::Release => write!(f, "Release"),
        }
    }
}
