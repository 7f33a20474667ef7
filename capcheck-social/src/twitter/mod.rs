//! Twitter/X API integration surface.
//!
//! Submodules provide the HTTP client wrapper, strongly typed response models, and
//! the resolver that picks the best attached image out of a lookup response.
pub mod client;
pub mod resolve;
pub mod types;

pub use client::TwitterApi;
pub use resolve::{ResolveError, ResolvedImage, TweetResolver};
