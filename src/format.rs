//! Rendering of webhook events into chat notifications. Pure and
//! deterministic: no I/O, no shared state.

use crate::types::{
    EventKind, Notification, NotificationAuthor, NotificationField, NotificationFooter,
    WebhookEvent, WebhookPayload,
};

/// Accent color for the base notification and unlisted PR actions.
pub const SUCCESS_GREEN: u32 = 0x28A745;

const PR_OPENED_COLOR: u32 = 0x2CBE4E;
const PR_CLOSED_COLOR: u32 = 0xCB2431;
const PR_MERGED_COLOR: u32 = 0x6F42C1;

const FOOTER_ICON_URL: &str = "https://github.githubassets.com/favicons/favicon.png";

const MAX_COMMIT_FIELDS: usize = 3;
const MAX_TOPIC_BADGES: usize = 3;
const COMMIT_MESSAGE_CHARS: usize = 50;
const PR_BODY_CHARS: usize = 200;

/// Render an event into a notification. Unknown event types yield the base
/// notification (author + footer only); the caller still delivers it.
pub fn render(event: &WebhookEvent) -> Notification {
    let mut notification = base_notification(&event.payload);
    match event.kind {
        EventKind::Push => render_push(&mut notification, &event.payload),
        EventKind::PullRequest => render_pull_request(&mut notification, &event.payload),
        EventKind::Unknown(_) => {}
    }
    notification
}

fn base_notification(payload: &WebhookPayload) -> Notification {
    Notification {
        color: SUCCESS_GREEN,
        title: None,
        url: None,
        description: None,
        author: NotificationAuthor {
            name: payload.sender.login.clone(),
            icon_url: payload.sender.avatar_url.clone(),
        },
        footer: NotificationFooter {
            text: payload.repository.full_name.clone(),
            icon_url: FOOTER_ICON_URL.to_string(),
        },
        fields: Vec::new(),
    }
}

fn render_push(notification: &mut Notification, payload: &WebhookPayload) {
    let repo = &payload.repository;
    let commits = &payload.commits;
    let branch = payload.git_ref.rsplit('/').next().unwrap_or_default();

    let plural = if commits.len() == 1 { "" } else { "s" };
    notification.title = Some(format!(
        "📌 {} new commit{} to {}",
        commits.len(),
        plural,
        repo.name
    ));
    notification.url = Some(payload.compare.clone());
    notification.description = Some(format!(
        "Branch: **{}**\n[View changes]({})",
        branch, payload.compare
    ));

    if let Some(stars) = repo.stargazers_count {
        let forks = repo.forks_count.unwrap_or(0);
        notification.fields.push(NotificationField {
            name: "Repository Stats".to_string(),
            value: format!("⭐ {stars} | 🍴 {forks}"),
            inline: true,
        });
    }

    for commit in commits.iter().take(MAX_COMMIT_FIELDS) {
        let short_sha: String = commit.id.chars().take(7).collect();
        notification.fields.push(NotificationField {
            name: format!(
                "{}: {}",
                short_sha,
                truncate(&commit.message, COMMIT_MESSAGE_CHARS)
            ),
            value: format!(
                "By {} on {}\n[View]({})",
                commit.author.name,
                commit_date(&commit.timestamp),
                commit.url
            ),
            inline: false,
        });
    }

    if commits.len() > MAX_COMMIT_FIELDS {
        notification.fields.push(NotificationField {
            name: "More commits".to_string(),
            value: format!(
                "+{} additional commits not shown",
                commits.len() - MAX_COMMIT_FIELDS
            ),
            inline: false,
        });
    }

    if let Some(language) = &repo.language {
        notification.fields.push(NotificationField {
            name: "Language".to_string(),
            value: language.clone(),
            inline: true,
        });
    }

    if !repo.topics.is_empty() {
        let badges: Vec<String> = repo
            .topics
            .iter()
            .take(MAX_TOPIC_BADGES)
            .map(|t| format!("`{t}`"))
            .collect();
        notification.fields.push(NotificationField {
            name: "Topics".to_string(),
            value: badges.join(", "),
            inline: true,
        });
    }
}

fn render_pull_request(notification: &mut Notification, payload: &WebhookPayload) {
    let Some(pr) = &payload.pull_request else {
        return;
    };
    let action = payload.action.as_deref().unwrap_or("");

    notification.color = match action {
        "opened" => PR_OPENED_COLOR,
        "closed" => PR_CLOSED_COLOR,
        "merged" => PR_MERGED_COLOR,
        _ => SUCCESS_GREEN,
    };
    notification.title = Some(format!("🔀 PR #{}: {} ({})", pr.number, pr.title, action));
    notification.url = Some(pr.html_url.clone());
    notification.description = Some(truncate(pr.body.as_deref().unwrap_or_default(), PR_BODY_CHARS));

    let target_state = if pr.merged { "merged" } else { &pr.mergeable_state };
    notification.fields.push(NotificationField {
        name: "Status".to_string(),
        value: format!("`{}` → `{}`", pr.state, target_state),
        inline: true,
    });

    notification.fields.push(NotificationField {
        name: "Changes".to_string(),
        value: format!(
            "➕ {} | ➖ {} | 📄 {}",
            pr.additions, pr.deletions, pr.changed_files
        ),
        inline: true,
    });

    if !pr.requested_reviewers.is_empty() {
        let reviewers: Vec<&str> = pr
            .requested_reviewers
            .iter()
            .map(|r| r.login.as_str())
            .collect();
        notification.fields.push(NotificationField {
            name: "Reviewers".to_string(),
            value: reviewers.join(", "),
            inline: false,
        });
    }
}

/// Calendar date of an ISO-8601 commit timestamp; falls back to everything
/// before the `T` if the timestamp does not parse.
fn commit_date(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| {
            timestamp
                .split('T')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WebhookPayload;
    use serde_json::json;

    fn push_payload(commit_count: usize) -> WebhookPayload {
        let commits: Vec<serde_json::Value> = (0..commit_count)
            .map(|i| {
                json!({
                    "id": format!("{i:040x}"),
                    "message": format!("commit {i}"),
                    "timestamp": "2024-03-01T12:34:56+01:00",
                    "url": format!("https://github.com/acme/demo/commit/{i:040x}"),
                    "author": {"name": "dev"}
                })
            })
            .collect();

        serde_json::from_value(json!({
            "ref": "refs/heads/main",
            "compare": "https://github.com/acme/demo/compare/abc...def",
            "commits": commits,
            "repository": {"name": "demo", "full_name": "acme/demo"},
            "sender": {"login": "octocat", "avatar_url": "https://example.com/a.png"}
        }))
        .unwrap()
    }

    fn pr_payload(action: &str, reviewers: &[&str]) -> WebhookPayload {
        let reviewers: Vec<serde_json::Value> =
            reviewers.iter().map(|r| json!({"login": r})).collect();

        serde_json::from_value(json!({
            "action": action,
            "pull_request": {
                "number": 42,
                "title": "Add feature",
                "html_url": "https://github.com/acme/demo/pull/42",
                "body": "Adds the feature.",
                "state": "open",
                "merged": false,
                "mergeable_state": "clean",
                "additions": 10,
                "deletions": 2,
                "changed_files": 3,
                "requested_reviewers": reviewers
            },
            "repository": {"name": "demo", "full_name": "acme/demo"},
            "sender": {"login": "octocat", "avatar_url": "https://example.com/a.png"}
        }))
        .unwrap()
    }

    fn event(kind: EventKind, payload: WebhookPayload) -> WebhookEvent {
        WebhookEvent { kind, payload }
    }

    #[test]
    fn push_with_five_commits_renders_three_plus_summary() {
        let n = render(&event(EventKind::Push, push_payload(5)));

        assert_eq!(n.title.as_deref(), Some("📌 5 new commits to demo"));
        let commit_fields: Vec<_> = n.fields.iter().filter(|f| f.name.contains(':')).collect();
        assert_eq!(commit_fields.len(), 3);

        let summary = n.fields.iter().find(|f| f.name == "More commits").unwrap();
        assert_eq!(summary.value, "+2 additional commits not shown");
    }

    #[test]
    fn push_with_single_commit_is_singular_and_has_no_summary() {
        let n = render(&event(EventKind::Push, push_payload(1)));

        assert_eq!(n.title.as_deref(), Some("📌 1 new commit to demo"));
        assert!(n.fields.iter().all(|f| f.name != "More commits"));
    }

    #[test]
    fn push_description_links_compare_view_with_branch() {
        let n = render(&event(EventKind::Push, push_payload(2)));

        let description = n.description.unwrap();
        assert!(description.starts_with("Branch: **main**"));
        assert!(description.contains("https://github.com/acme/demo/compare/abc...def"));
        assert_eq!(
            n.url.as_deref(),
            Some("https://github.com/acme/demo/compare/abc...def")
        );
    }

    #[test]
    fn push_commit_field_names_stay_bounded() {
        let mut payload = push_payload(1);
        payload.commits[0].message = "x".repeat(400);
        let n = render(&event(EventKind::Push, payload));

        let field = n.fields.iter().find(|f| f.name.contains(':')).unwrap();
        let message_part = field.name.split_once(": ").unwrap().1;
        assert_eq!(message_part.chars().count(), COMMIT_MESSAGE_CHARS + 3);
        assert!(message_part.ends_with("..."));
    }

    #[test]
    fn push_short_commit_message_is_not_truncated() {
        let n = render(&event(EventKind::Push, push_payload(1)));
        let field = n.fields.iter().find(|f| f.name.contains(':')).unwrap();
        assert!(field.name.ends_with("commit 0"));
    }

    #[test]
    fn push_commit_field_value_names_author_and_date() {
        let n = render(&event(EventKind::Push, push_payload(1)));
        let field = n.fields.iter().find(|f| f.name.contains(':')).unwrap();
        assert!(field.value.starts_with("By dev on 2024-03-01"));
        assert!(field.value.contains("[View]("));
    }

    #[test]
    fn push_stats_field_only_when_star_count_present() {
        let without = render(&event(EventKind::Push, push_payload(1)));
        assert!(without.fields.iter().all(|f| f.name != "Repository Stats"));

        let mut payload = push_payload(1);
        payload.repository.stargazers_count = Some(12);
        payload.repository.forks_count = Some(4);
        let with = render(&event(EventKind::Push, payload));
        let stats = with
            .fields
            .iter()
            .find(|f| f.name == "Repository Stats")
            .unwrap();
        assert_eq!(stats.value, "⭐ 12 | 🍴 4");
    }

    #[test]
    fn push_language_and_topics_are_optional_extras() {
        let mut payload = push_payload(1);
        payload.repository.language = Some("Rust".to_string());
        payload.repository.topics = vec!["ci".into(), "bots".into(), "infra".into(), "extra".into()];
        let n = render(&event(EventKind::Push, payload));

        assert!(n.fields.iter().any(|f| f.name == "Language" && f.value == "Rust"));
        let topics = n.fields.iter().find(|f| f.name == "Topics").unwrap();
        assert_eq!(topics.value, "`ci`, `bots`, `infra`");
    }

    #[test]
    fn pull_request_opened_uses_table_color_and_skips_reviewers() {
        let n = render(&event(EventKind::PullRequest, pr_payload("opened", &[])));

        assert_eq!(n.color, PR_OPENED_COLOR);
        assert_eq!(
            n.title.as_deref(),
            Some("🔀 PR #42: Add feature (opened)")
        );
        assert!(n.fields.iter().all(|f| f.name != "Reviewers"));
    }

    #[test]
    fn pull_request_color_table() {
        for (action, color) in [
            ("opened", PR_OPENED_COLOR),
            ("closed", PR_CLOSED_COLOR),
            ("merged", PR_MERGED_COLOR),
            ("synchronize", SUCCESS_GREEN),
        ] {
            let n = render(&event(EventKind::PullRequest, pr_payload(action, &[])));
            assert_eq!(n.color, color, "action {action}");
        }
    }

    #[test]
    fn pull_request_body_is_truncated_to_bound() {
        let mut payload = pr_payload("opened", &[]);
        if let Some(pr) = payload.pull_request.as_mut() {
            pr.body = Some("y".repeat(1000));
        }
        let n = render(&event(EventKind::PullRequest, payload));

        let description = n.description.unwrap();
        assert_eq!(description.chars().count(), PR_BODY_CHARS + 3);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn pull_request_null_body_renders_empty_description() {
        let mut payload = pr_payload("opened", &[]);
        if let Some(pr) = payload.pull_request.as_mut() {
            pr.body = None;
        }
        let n = render(&event(EventKind::PullRequest, payload));
        assert_eq!(n.description.as_deref(), Some(""));
    }

    #[test]
    fn pull_request_status_shows_merge_transition() {
        let mut payload = pr_payload("closed", &[]);
        if let Some(pr) = payload.pull_request.as_mut() {
            pr.merged = true;
            pr.state = "closed".to_string();
        }
        let n = render(&event(EventKind::PullRequest, payload));

        let status = n.fields.iter().find(|f| f.name == "Status").unwrap();
        assert_eq!(status.value, "`closed` → `merged`");
    }

    #[test]
    fn pull_request_lists_requested_reviewers() {
        let n = render(&event(
            EventKind::PullRequest,
            pr_payload("opened", &["alice", "bob"]),
        ));
        let reviewers = n.fields.iter().find(|f| f.name == "Reviewers").unwrap();
        assert_eq!(reviewers.value, "alice, bob");
        assert!(!reviewers.inline);
    }

    #[test]
    fn pull_request_changes_field_reports_counts() {
        let n = render(&event(EventKind::PullRequest, pr_payload("opened", &[])));
        let changes = n.fields.iter().find(|f| f.name == "Changes").unwrap();
        assert_eq!(changes.value, "➕ 10 | ➖ 2 | 📄 3");
    }

    #[test]
    fn unknown_event_yields_minimal_notification() {
        let n = render(&event(
            EventKind::Unknown("issues".to_string()),
            push_payload(0),
        ));

        assert_eq!(n.color, SUCCESS_GREEN);
        assert!(n.title.is_none());
        assert!(n.fields.is_empty());
        assert_eq!(n.author.name, "octocat");
        assert_eq!(n.footer.text, "acme/demo");
    }

    #[test]
    fn rendering_is_pure() {
        let payload = push_payload(4);
        let e = event(EventKind::Push, payload);
        assert_eq!(render(&e), render(&e));
    }
}
