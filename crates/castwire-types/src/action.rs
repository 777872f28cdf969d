//! The closed set of signed action variants and their validation rules.
//!
//! An action is a value object: the client serializes it once, signs those
//! exact bytes, and the server treats the string as opaque for signature
//! purposes. Only after the signature checks out is the string parsed back
//! into an [`Action`] for the business-rule validation below. The server
//! must never re-serialize a parsed action and verify over that — the
//! signature covers the client's canonical bytes and nothing else.

use serde::{Deserialize, Serialize};

/// A typed, signable request to change social state.
///
/// Wire form is a JSON object tagged by `type`, e.g.
/// `{"type":"post","content":"hello","parentID":1}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum Action {
    /// Publish a post, optionally as a reply to an existing post.
    Post {
        content: String,
        #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
        parent_id: Option<i64>,
    },
    /// Like a post.
    Like {
        #[serde(rename = "postID")]
        post_id: i64,
    },
    /// Retract a previous like. Corrections are new actions, never log edits.
    Unlike {
        #[serde(rename = "postID")]
        post_id: i64,
    },
    /// Follow a user.
    Follow { uid: i64 },
    /// Unfollow a user.
    Unfollow { uid: i64 },
}

/// Per-variant validation limits, sourced from daemon configuration.
#[derive(Clone, Debug)]
pub struct FeedLimits {
    /// Maximum post length in Unicode scalar values.
    pub max_post_length: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            max_post_length: crate::DEFAULT_MAX_POST_LENGTH,
        }
    }
}

/// Validation failure for a parsed action.
///
/// The detail string names the offending field or limit so the client can
/// fix its input; it never leaks server-internal state.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("malformed action: {0}")]
    Malformed(String),
}

impl Action {
    /// Validate this action against the configured limits.
    ///
    /// Referential checks (does `parentID` exist?) are deliberately not done
    /// here: a reply may legally reference a post the validator has not seen.
    /// Dangling parents are resolved at materialization time instead.
    pub fn validate(&self, limits: &FeedLimits) -> Result<(), ActionError> {
        match self {
            Action::Post { content, parent_id } => {
                if content.trim().is_empty() {
                    return Err(ActionError::Malformed(
                        "post content must be non-empty".to_string(),
                    ));
                }
                let len = content.chars().count();
                if len > limits.max_post_length {
                    return Err(ActionError::Malformed(format!(
                        "post content is {len} chars, limit is {}",
                        limits.max_post_length
                    )));
                }
                if let Some(parent) = parent_id {
                    if *parent <= 0 {
                        return Err(ActionError::Malformed(
                            "parentID must be a positive post id".to_string(),
                        ));
                    }
                }
                Ok(())
            }
            Action::Like { post_id } | Action::Unlike { post_id } => {
                if *post_id <= 0 {
                    return Err(ActionError::Malformed(
                        "postID must be a positive post id".to_string(),
                    ));
                }
                Ok(())
            }
            Action::Follow { uid } | Action::Unfollow { uid } => {
                if *uid <= 0 {
                    return Err(ActionError::Malformed(
                        "uid must be a positive user id".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Canonical serialization: the exact string a client signs.
    pub fn to_canonical_json(&self) -> Result<String, ActionError> {
        serde_json::to_string(self).map_err(|e| ActionError::Malformed(e.to_string()))
    }
}
