//! Repository webhook payloads.
//!
//! Only the fields the trigger policy reads are modelled; everything else
//! in the provider's payload is ignored.

use crate::task::domain::PullRequestState;
use serde::Deserialize;

/// Repository the activity happened in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,
}

/// Account that performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Login name.
    pub login: String,
}

/// Commit author as reported in a push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitAuthor {
    /// Display name.
    pub name: String,
}

/// One commit of a push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushCommit {
    /// Commit hash.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Commit author.
    pub author: CommitAuthor,
    /// Web URL.
    pub url: String,
}

/// `push` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    /// Updated ref, for example `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Repository pushed to.
    pub repository: Repository,
    /// Pushed commits.
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

impl PushEvent {
    /// Returns the branch name with any `refs/heads/` prefix removed.
    #[must_use]
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
    }
}

/// Head ref of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeadRef {
    /// Source branch.
    #[serde(rename = "ref")]
    pub branch: String,
}

/// Pull request as embedded in pull-request events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Description, if any.
    #[serde(default)]
    pub body: Option<String>,
    /// Web URL.
    pub html_url: String,
    /// `open` or `closed`.
    pub state: String,
    /// Whether the pull request was merged.
    #[serde(default)]
    pub merged: bool,
    /// Source branch.
    pub head: HeadRef,
}

impl PullRequest {
    /// Returns the title and body joined for reference scanning.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body.as_deref().unwrap_or_default())
    }

    /// Returns the pull request state, treating merged as its own state.
    #[must_use]
    pub fn lifecycle_state(&self) -> PullRequestState {
        if self.merged {
            PullRequestState::Merged
        } else if self.state.eq_ignore_ascii_case("closed") {
            PullRequestState::Closed
        } else {
            PullRequestState::Open
        }
    }
}

/// `pull_request` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestEvent {
    /// Activity, for example `opened` or `closed`.
    pub action: String,
    /// The pull request.
    pub pull_request: PullRequest,
    /// Repository of the pull request.
    pub repository: Repository,
}

/// Review attached to a review event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    /// `approved`, `changes_requested`, or `commented`.
    pub state: String,
    /// Reviewer.
    pub user: Account,
}

/// `pull_request_review` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestReviewEvent {
    /// Activity, for example `submitted`.
    pub action: String,
    /// The review.
    pub review: Review,
    /// The reviewed pull request.
    pub pull_request: PullRequest,
}

/// A webhook event the trigger policy acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEvent {
    /// Commits were pushed.
    Push(PushEvent),
    /// A pull request changed.
    PullRequest(PullRequestEvent),
    /// A pull request review changed.
    PullRequestReview(PullRequestReviewEvent),
}

impl RepositoryEvent {
    /// Decodes a webhook body by its event name.
    ///
    /// Returns `Ok(None)` for event names the policy does not handle.
    ///
    /// # Errors
    ///
    /// Returns the decode error for malformed bodies of handled events.
    pub fn decode(event_name: &str, body: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let event = match event_name {
            "push" => Self::Push(serde_json::from_slice(body)?),
            "pull_request" => Self::PullRequest(serde_json::from_slice(body)?),
            "pull_request_review" => Self::PullRequestReview(serde_json::from_slice(body)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}
