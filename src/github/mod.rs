mod cache;
mod client;
mod collect;
mod curl_cmd;
mod endpoint;
mod error;
mod records;

pub use client::GithubClient;
pub use collect::{Portfolio, collect_portfolio};
pub use error::FetchError;
pub use records::{RepositoryRecord, language_shares, recent_repositories, summarize_events};
