use reqwest::blocking::{Client, Response};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::Issue;

pub type BugId = u64;

const DEFAULT_VERSION: &str = "unspecified";
const DEFAULT_OP_SYS: &str = "Linux";
const DEFAULT_PLATFORM: &str = "Other";

#[derive(Debug, thiserror::Error)]
pub enum BugzillaError {
    /// Carries no request URL: login and token query parameters must not reach logs.
    #[error("bugzilla request failed: {0}")]
    Request(reqwest::Error),
    #[error("bugzilla returned HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("bugzilla rejected the request (code {code:?}): {message}")]
    Api { code: Option<i64>, message: String },
    #[error("failed to decode bugzilla response: {source}; body: {body}")]
    Decode {
        source: serde_json::Error,
        body: String,
    },
    #[error("invalid bugzilla url '{0}': it must be absolute and end with '/'")]
    InvalidBaseUrl(String),
}

/// Payload for Bugzilla's create-bug call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBug {
    pub product: String,
    pub component: String,
    pub summary: String,
    pub version: String,
    pub description: String,
    pub op_sys: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_milestone: Option<String>,
}

impl NewBug {
    pub fn from_issue(issue: &Issue, body: &str, product: &str, component: &str) -> Self {
        Self {
            product: product.to_string(),
            component: component.to_string(),
            summary: issue.title.clone(),
            version: DEFAULT_VERSION.to_string(),
            description: body.to_string(),
            op_sys: DEFAULT_OP_SYS.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            target_milestone: issue.milestone.valid_title().map(ToString::to_string),
        }
    }
}

/// Creates bugs in a tracker. Each successful call is permanent.
pub trait BugFiler {
    fn file_bug(&self, bug: &NewBug) -> Result<BugId, BugzillaError>;
}

#[derive(Debug)]
pub struct BugzillaClient {
    base_url: Url,
    http: Client,
    token: Option<SecretString>,
}

impl BugzillaClient {
    pub fn new(base_url: &str) -> Result<Self, BugzillaError> {
        let base_url = parse_base_url(base_url)?;
        let http = Client::builder().build().map_err(request_failed)?;
        Ok(Self {
            base_url,
            http,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BugzillaError> {
        self.base_url
            .join(path)
            .map_err(|_| BugzillaError::InvalidBaseUrl(self.base_url.to_string()))
    }

    /// Exchanges a login and password for an API token used on later calls.
    pub fn login(&mut self, user: &str, password: &SecretString) -> Result<(), BugzillaError> {
        let url = self.endpoint("rest/login")?;
        debug!(user, url = %url, "logging in to bugzilla");
        let response = self
            .http
            .get(url)
            .query(&[("login", user), ("password", password.expose_secret())])
            .send()
            .map_err(request_failed)?;

        let reply: LoginReply = decode_reply(response)?;
        info!(user, bugzilla_user_id = ?reply.id, "authenticated with bugzilla");
        self.token = Some(SecretString::from(reply.token));
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl BugFiler for BugzillaClient {
    fn file_bug(&self, bug: &NewBug) -> Result<BugId, BugzillaError> {
        let url = self.endpoint("rest/bug")?;
        let mut request = self.http.post(url).json(bug);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.expose_secret())]);
        }

        let reply: CreatedBug = decode_reply(request.send().map_err(request_failed)?)?;
        Ok(reply.id)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BugzillaError> {
    let trimmed = raw.trim();
    if !trimmed.ends_with('/') {
        return Err(BugzillaError::InvalidBaseUrl(raw.to_string()));
    }
    Url::parse(trimmed).map_err(|_| BugzillaError::InvalidBaseUrl(raw.to_string()))
}

fn request_failed(err: reqwest::Error) -> BugzillaError {
    BugzillaError::Request(err.without_url())
}

fn decode_reply<T: DeserializeOwned>(response: Response) -> Result<T, BugzillaError> {
    let status = response.status();
    let body = response.text().map_err(request_failed)?;

    if let Ok(failure) = serde_json::from_str::<ApiFailure>(&body) {
        if failure.error {
            return Err(BugzillaError::Api {
                code: failure.code,
                message: failure.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
    }

    if !status.is_success() {
        return Err(BugzillaError::Http { status, body });
    }

    serde_json::from_str(&body).map_err(|source| BugzillaError::Decode { source, body })
}

#[derive(Debug, Deserialize)]
struct ApiFailure {
    #[serde(default)]
    error: bool,
    message: Option<String>,
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(default)]
    id: Option<u64>,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedBug {
    id: BugId,
}
