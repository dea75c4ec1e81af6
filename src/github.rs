pub mod api;
pub use api::ApiRequest;

mod client;
pub use client::{Auth, GitHubClient};

mod session;
pub use session::GitHubSession;

pub mod token;
pub use token::{InstallationTokens, StaticToken, TokenProvider};

pub mod types;
