//! Forge abstraction: installation credentials and a typed REST client
//! over the subset of the GitHub API the core needs (refs, trees, blobs,
//! commits, contents, statuses, checks, pull requests, reviews).

pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

pub use client::ForgeClient;
pub use credentials::{CredentialBroker, SharedCredentialBroker};
pub use error::{ForgeError, ForgeResult};
