use chrono::{DateTime, Utc};

use crate::model::{Comment, Issue};

const COMMENT_SEPARATOR: &str = "........................................";
const PREVIEW_SEPARATOR: &str = "========================================";

pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Builds the Bugzilla description for an issue: a provenance line, the
/// original body, then every comment in the order given.
pub fn compose_body(issue: &Issue, comments: &[Comment]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(3 + comments.len() * 5);
    lines.push(format!(
        "[This bug has been imported. It was originally filed on {}]",
        format_time(&issue.created_at)
    ));
    lines.push(String::new());
    lines.push(issue.body.clone());

    for comment in comments {
        lines.push(String::new());
        lines.push(COMMENT_SEPARATOR.to_string());
        lines.push(String::new());
        lines.push(format!(
            "{} - {}",
            comment.user.login,
            format_time(&comment.updated_at)
        ));
        lines.push(comment.body.clone());
    }

    lines.join("\n")
}

/// Dry-run rendering of the bug that would be filed for `issue`.
pub fn render_preview(issue: &Issue, body: &str) -> String {
    let mut out = String::new();
    out.push_str(PREVIEW_SEPARATOR);
    out.push('\n');
    out.push_str(&format!("#{} {}\n", issue.number, issue.title));
    if let Some(title) = issue.milestone.valid_title() {
        out.push_str(&format!("Milestone: {}\n", title));
    }
    out.push('\n');
    out.push_str(body);
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::{Milestone, User};

    fn issue(milestone: Option<&str>) -> Issue {
        Issue {
            number: 42,
            title: "Fix crash".to_string(),
            state: "open".to_string(),
            body: "Steps: click X".to_string(),
            created_at: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
            closed_at: None,
            labels: vec![],
            user: User {
                login: "bob".to_string(),
            },
            comments: 0,
            milestone: Milestone {
                title: milestone.map(ToString::to_string),
            },
        }
    }

    fn comment(login: &str, day: u32, body: &str) -> Comment {
        Comment {
            user: User {
                login: login.to_string(),
            },
            updated_at: Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn composes_body_without_comments() {
        let body = compose_body(&issue(None), &[]);
        assert_eq!(
            body,
            "[This bug has been imported. It was originally filed on 2020-01-02 03:04:05]\n\nSteps: click X"
        );
        assert!(!body.contains(COMMENT_SEPARATOR));
    }

    #[test]
    fn composes_comment_sections_in_order() {
        let body = compose_body(
            &issue(None),
            &[comment("alice", 3, "Confirmed"), comment("carol", 4, "Fixed in main")],
        );

        let expected = "[This bug has been imported. It was originally filed on 2020-01-02 03:04:05]\n\
                        \n\
                        Steps: click X\n\
                        \n\
                        ........................................\n\
                        \n\
                        alice - 2020-01-03 00:00:00\n\
                        Confirmed\n\
                        \n\
                        ........................................\n\
                        \n\
                        carol - 2020-01-04 00:00:00\n\
                        Fixed in main";
        assert_eq!(body, expected);
        assert_eq!(body.matches(COMMENT_SEPARATOR).count(), 2);
    }

    #[test]
    fn keeps_bodies_verbatim() {
        let mut raw = issue(None);
        raw.body = "line <b>one</b>\n\nline two\n".to_string();
        let body = compose_body(&raw, &[]);
        assert!(body.ends_with("\n\nline <b>one</b>\n\nline two\n"));
    }

    #[test]
    fn separator_is_forty_characters() {
        assert_eq!(COMMENT_SEPARATOR.len(), 40);
        assert!(COMMENT_SEPARATOR.chars().all(|c| c == '.'));
        assert_eq!(PREVIEW_SEPARATOR.len(), 40);
        assert!(PREVIEW_SEPARATOR.chars().all(|c| c == '='));
    }

    #[test]
    fn renders_preview_with_milestone() {
        let issue = issue(Some("v1.0"));
        let body = compose_body(&issue, &[]);

        let expected = "========================================\n\
                        #42 Fix crash\n\
                        Milestone: v1.0\n\
                        \n\
                        [This bug has been imported. It was originally filed on 2020-01-02 03:04:05]\n\
                        \n\
                        Steps: click X";
        assert_eq!(render_preview(&issue, &body), expected);
    }

    #[test]
    fn renders_preview_without_milestone() {
        let issue = issue(None);
        let preview = render_preview(&issue, "body");
        assert_eq!(
            preview,
            "========================================\n#42 Fix crash\n\nbody"
        );
        assert!(!preview.contains("Milestone:"));
    }
}
