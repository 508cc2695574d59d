use std::io::Write;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use tracing::warn;

use crate::cache::{FetchError, ResponseCache, Source};
use crate::model::{decode_comments, decode_issues, Comment, DecodeError, Issue};

pub const DEFAULT_API_URL: &str = "https://api.github.com/repos";
pub const ISSUES_FILE: &str = "issues.json";

const USER_AGENT: &str = concat!("ghi2bz/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub fn issues_url(api_url: &str, repo: &str) -> String {
    format!("{}/{}/issues", api_url.trim_end_matches('/'), repo)
}

pub fn comments_url(api_url: &str, repo: &str, number: u64) -> String {
    format!(
        "{}/{}/issues/{}/comments",
        api_url.trim_end_matches('/'),
        repo,
        number
    )
}

pub fn comments_file(number: u64) -> String {
    format!("{number}-comments.json")
}

/// Loads the repository's issue list, downloading it only when it is not cached yet.
pub fn load_issues(
    cache: &dyn ResponseCache,
    api_url: &str,
    repo: &str,
) -> Result<Vec<Issue>, GithubError> {
    let raw = cache.ensure_cached(&issues_url(api_url, repo), ISSUES_FILE)?;
    Ok(decode_issues(&raw, ISSUES_FILE)?)
}

pub fn load_comments(
    cache: &dyn ResponseCache,
    api_url: &str,
    repo: &str,
    number: u64,
) -> Result<Vec<Comment>, GithubError> {
    let name = comments_file(number);
    let raw = cache.ensure_cached(&comments_url(api_url, repo, number), &name)?;
    Ok(decode_comments(&raw, &name)?)
}

/// Unauthenticated reader for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http })
    }
}

impl Source for HttpSource {
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let request_err = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let mut response = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(request_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Http {
                url: url.to_string(),
                status,
                body,
            });
        }

        if has_next_page(response.headers()) {
            warn!(
                url,
                "response is paginated; only the first page is migrated"
            );
        }

        response.copy_to(sink).map_err(request_err)
    }
}

fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|link| link.contains("rel=\"next\""))
}
