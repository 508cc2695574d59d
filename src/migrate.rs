use std::io::{self, Write};

use tracing::{debug, info};

use crate::bugzilla::{BugFiler, BugzillaClient, BugzillaError, NewBug};
use crate::cache::ResponseCache;
use crate::config::MigrationConfig;
use crate::credentials::{CredentialError, CredentialProvider};
use crate::github::{self, GithubError};
use crate::render::{compose_body, render_preview};

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error("failed to file bug for issue #{number}: {source}")]
    Filing {
        number: u64,
        source: BugzillaError,
    },
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("failed to log in to bugzilla: {0}")]
    Login(#[source] BugzillaError),
    #[error("live run requires a bug filer")]
    NoFiler,
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSummary {
    pub seen: usize,
    pub skipped_closed: usize,
    pub comment_fetches: usize,
    pub filed: usize,
    pub previewed: usize,
}

/// Decides what happens to each composed bug.
pub enum Target<'a> {
    /// Print the would-be bug; nothing is created.
    Preview,
    File(&'a dyn BugFiler),
}

/// Walks the repository's issue list once, in API order, and previews or
/// files every open issue. The first error ends the run; bugs already filed stay filed.
pub fn run(
    config: &MigrationConfig,
    cache: &dyn ResponseCache,
    target: Target<'_>,
    out: &mut dyn Write,
) -> Result<MigrationSummary, MigrateError> {
    let mut summary = MigrationSummary::default();
    let issues = github::load_issues(cache, &config.github_url, &config.repo)?;
    info!(repo = %config.repo, count = issues.len(), "loaded issues");

    for issue in issues {
        summary.seen += 1;
        if !issue.is_open() {
            debug!(number = issue.number, state = %issue.state, "skipping issue");
            summary.skipped_closed += 1;
            continue;
        }

        let comments = if issue.comments > 0 {
            summary.comment_fetches += 1;
            github::load_comments(cache, &config.github_url, &config.repo, issue.number)?
        } else {
            Vec::new()
        };
        let body = compose_body(&issue, &comments);

        match &target {
            Target::Preview => {
                writeln!(out, "{}", render_preview(&issue, &body))?;
                summary.previewed += 1;
            }
            Target::File(filer) => {
                let bug =
                    NewBug::from_issue(&issue, &body, &config.bz_product, &config.bz_component);
                let bug_id = filer
                    .file_bug(&bug)
                    .map_err(|source| MigrateError::Filing {
                        number: issue.number,
                        source,
                    })?;
                info!(number = issue.number, bug_id, "filed bug");
                writeln!(out, "Created bug_id {bug_id}")?;
                summary.filed += 1;
            }
        }
    }

    info!(
        seen = summary.seen,
        skipped_closed = summary.skipped_closed,
        comment_fetches = summary.comment_fetches,
        filed = summary.filed,
        previewed = summary.previewed,
        "migration finished"
    );
    Ok(summary)
}

/// Logs in to Bugzilla for a live run. A dry run returns `None` without
/// asking for credentials or touching the network.
pub fn authenticate(
    config: &MigrationConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Option<BugzillaClient>, MigrateError> {
    if config.dry_run {
        return Ok(None);
    }

    let user = credentials.username(config.bz_user.as_deref())?;
    let password = credentials.password(&user)?;
    let mut client = BugzillaClient::new(&config.bz_url).map_err(MigrateError::Login)?;
    client.login(&user, &password).map_err(MigrateError::Login)?;
    Ok(Some(client))
}

/// Picks the target matching `config.dry_run`.
pub fn target_for<'a>(
    config: &MigrationConfig,
    filer: Option<&'a dyn BugFiler>,
) -> Result<Target<'a>, MigrateError> {
    if config.dry_run {
        return Ok(Target::Preview);
    }
    filer.map(Target::File).ok_or(MigrateError::NoFiler)
}
