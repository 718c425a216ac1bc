//! Human-readable CI status wording.

pub mod deployment;

pub use deployment::{DecoratedDeployment, Deployment, DeploymentStatus, Environment};
