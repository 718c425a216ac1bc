mod cache;
mod client;
pub mod links;
mod progress_bar;
mod provider;

pub use cache::FeedCache;
pub use provider::{FeedOptions, GitLabProvider};
