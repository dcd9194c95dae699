use serde::{Deserialize, Serialize};

// ─── Rendered notification ──────────────────────────────────────────────────

/// Rendered, immutable chat notification. Serializes directly as a Discord
/// embed object, so field names follow the embed wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub author: NotificationAuthor,
    pub footer: NotificationFooter,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<NotificationField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAuthor {
    pub name: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationFooter {
    pub text: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

// ─── Inbound webhook event ──────────────────────────────────────────────────

/// Event type taken from the `X-GitHub-Event` request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Push,
    PullRequest,
    Unknown(String),
}

impl EventKind {
    pub fn from_header(value: &str) -> Self {
        match value {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed inbound event: one per request, dropped after formatting.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub kind: EventKind,
    pub payload: WebhookPayload,
}

/// The slice of GitHub's event schema this relay cares about. Push and
/// pull-request sections are optional so a single shape covers every event
/// type; `repository` and `sender` are the only hard requirements.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub repository: Repository,
    pub sender: Sender,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default, rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub compare: String,
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub url: String,
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub mergeable_state: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changed_files: u64,
    #[serde(default)]
    pub requested_reviewers: Vec<Reviewer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reviewer {
    pub login: String,
}
