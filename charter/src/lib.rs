//! Governance charter: usage policy and risk controls for the inference service

pub mod config;
pub mod policy;

pub use config::{load_from_file, ConfigError, GovernanceConfig};
pub use policy::{PolicyError, PolicyStore};
