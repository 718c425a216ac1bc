pub mod gitlab;

pub use gitlab::{FeedCache, FeedOptions, GitLabProvider};
