mod core;
mod deployments;
mod notes;

pub use self::core::GitLabClient;
