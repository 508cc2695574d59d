//! `ghi2bz` copies the open issues of a GitHub repository, with their comment
//! threads, into Bugzilla as new bugs.

/// Bugzilla REST client and create-bug payload.
pub mod bugzilla;
/// Fetch-once storage for raw API responses.
pub mod cache;
/// Command-line definition.
pub mod cli;
/// Config file loading, CLI overrides and validation.
pub mod config;
/// Bugzilla login prompts.
pub mod credentials;
/// GitHub issue endpoints and the HTTP reader behind them.
pub mod github;
/// Logging setup.
pub mod logging;
/// The migration loop.
pub mod migrate;
/// Issue and comment records decoded from the GitHub API.
pub mod model;
/// Bug body and dry-run renderers.
pub mod render;
