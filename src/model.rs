use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Timestamp layout used by the GitHub issues API.
pub const GITHUB_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub name: String,
}

/// An issue milestone. GitHub sends `null` (or nothing) for issues without one,
/// which decodes to a milestone with no title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Milestone {
    #[serde(default)]
    pub title: Option<String>,
}

impl Milestone {
    /// Presence test: a milestone with an empty title still counts as set.
    pub fn is_valid(&self) -> bool {
        self.title.is_some()
    }

    pub fn valid_title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(deserialize_with = "github_time")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "github_time")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_github_time")]
    pub closed_at: Option<DateTime<Utc>>,
    pub labels: Vec<Label>,
    pub user: User,
    pub comments: u64,
    #[serde(default, deserialize_with = "milestone_or_empty")]
    pub milestone: Milestone,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub user: User,
    #[serde(deserialize_with = "github_time")]
    pub updated_at: DateTime<Utc>,
    #[serde(deserialize_with = "null_as_empty")]
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to decode {source_name}: {source}")]
pub struct DecodeError {
    pub source_name: String,
    #[source]
    pub source: serde_json::Error,
}

pub fn decode_issues(raw: &[u8], source_name: &str) -> Result<Vec<Issue>, DecodeError> {
    decode_list(raw, source_name)
}

pub fn decode_comments(raw: &[u8], source_name: &str) -> Result<Vec<Comment>, DecodeError> {
    decode_list(raw, source_name)
}

fn decode_list<T>(raw: &[u8], source_name: &str) -> Result<Vec<T>, DecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_slice(raw).map_err(|source| DecodeError {
        source_name: source_name.to_string(),
        source,
    })
}

pub fn parse_github_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, GITHUB_TIME_FORMAT).map(|naive| naive.and_utc())
}

fn github_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_github_time(&raw).map_err(|err| {
        serde::de::Error::custom(format!(
            "invalid timestamp '{raw}' (expected {GITHUB_TIME_FORMAT}): {err}"
        ))
    })
}

fn optional_github_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_github_time(&raw).map(Some).map_err(|err| {
            serde::de::Error::custom(format!(
                "invalid timestamp '{raw}' (expected {GITHUB_TIME_FORMAT}): {err}"
            ))
        }),
        None => Ok(None),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn milestone_or_empty<'de, D>(deserializer: D) -> Result<Milestone, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Milestone>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn issue_json() -> serde_json::Value {
        json!({
            "number": 42,
            "title": "Fix crash",
            "state": "open",
            "body": "Steps: click X",
            "created_at": "2020-01-02T03:04:05Z",
            "updated_at": "2020-01-05T00:00:00Z",
            "closed_at": null,
            "labels": [{"name": "bug"}, {"name": "ui"}],
            "user": {"login": "bob", "id": 7},
            "comments": 1,
            "milestone": {"title": "v1.0", "number": 3},
            "html_url": "https://github.com/acme/widgets/issues/42"
        })
    }

    fn decode_one(value: serde_json::Value) -> Result<Issue, DecodeError> {
        let raw = serde_json::to_vec(&json!([value])).expect("serialize");
        decode_issues(&raw, "issues.json").map(|mut items| items.remove(0))
    }

    #[test]
    fn decodes_full_issue() {
        let issue = decode_one(issue_json()).expect("decode");

        assert_eq!(issue.number, 42);
        assert_eq!(issue.title, "Fix crash");
        assert!(issue.is_open());
        assert_eq!(
            issue.created_at,
            Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
        );
        assert_eq!(issue.closed_at, None);
        assert_eq!(
            issue.labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            vec!["bug", "ui"]
        );
        assert_eq!(issue.user.login, "bob");
        assert_eq!(issue.comments, 1);
        assert_eq!(issue.milestone.valid_title(), Some("v1.0"));
    }

    #[test]
    fn null_and_missing_milestone_decode_as_invalid() {
        let mut with_null = issue_json();
        with_null["milestone"] = serde_json::Value::Null;
        let issue = decode_one(with_null).expect("decode");
        assert!(!issue.milestone.is_valid());

        let mut without = issue_json();
        without
            .as_object_mut()
            .expect("object")
            .remove("milestone");
        let issue = decode_one(without).expect("decode");
        assert!(!issue.milestone.is_valid());
    }

    #[test]
    fn empty_milestone_title_is_still_present() {
        let mut value = issue_json();
        value["milestone"] = json!({"title": ""});
        let issue = decode_one(value).expect("decode");
        assert!(issue.milestone.is_valid());
        assert_eq!(issue.milestone.valid_title(), Some(""));
    }

    #[test]
    fn null_body_decodes_as_empty() {
        let mut value = issue_json();
        value["body"] = serde_json::Value::Null;
        let issue = decode_one(value).expect("decode");
        assert_eq!(issue.body, "");
    }

    #[test]
    fn rejects_missing_required_field() {
        let mut value = issue_json();
        value.as_object_mut().expect("object").remove("title");
        let err = decode_one(value).expect_err("title is required");
        assert_eq!(err.source_name, "issues.json");
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn rejects_missing_labels() {
        let mut value = issue_json();
        value.as_object_mut().expect("object").remove("labels");
        let err = decode_one(value).expect_err("labels are required");
        assert!(err.to_string().contains("labels"));
    }

    #[test]
    fn empty_labels_list_is_valid() {
        let mut value = issue_json();
        value["labels"] = json!([]);
        assert!(decode_one(value).expect("decode").labels.is_empty());
    }

    #[test]
    fn rejects_timestamp_in_other_format() {
        let mut value = issue_json();
        value["created_at"] = json!("2020-01-02 03:04:05");
        let err = decode_one(value).expect_err("format is fixed");
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn decodes_comment_list_in_order() {
        let raw = serde_json::to_vec(&json!([
            {"user": {"login": "alice"}, "updated_at": "2020-01-03T00:00:00Z", "body": "Confirmed"},
            {"user": {"login": "carol"}, "updated_at": "2020-01-04T10:00:00Z", "body": null}
        ]))
        .expect("serialize");

        let comments = decode_comments(&raw, "42-comments.json").expect("decode");
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].user.login, "alice");
        assert_eq!(comments[1].user.login, "carol");
        assert_eq!(comments[1].body, "");
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(decode_comments(b"[]", "1-comments.json")
            .expect("decode")
            .is_empty());
    }
}
