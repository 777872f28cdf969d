//! Materialized read models: posts, threads, feed discriminators.
//!
//! These are caches derived from the ledger, never sources of truth; they
//! can be rebuilt from the log at any time without loss.

use serde::{Deserialize, Serialize};

use crate::user::User;

/// A materialized post. `id` is the seq of the originating `post` action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user: User,
    pub content: String,
    #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    pub likes: u64,
    pub replies: u64,
}

/// An ancestor chain from a thread root down to a requested post.
///
/// Invariant: `posts[0].id == root_id`, and ids are strictly ascending
/// (ancestors always have smaller seq than their children).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(rename = "rootID")]
    pub root_id: i64,
    pub posts: Vec<Post>,
}

/// Profile feed tab discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedTab {
    /// Posts authored by the profile user.
    Posts,
    /// Posts the profile user has liked.
    Likes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_tab_wire_form() {
        assert_eq!(
            serde_json::to_string(&FeedTab::Posts).expect("serialize"),
            r#""posts""#
        );
        let tab: FeedTab = serde_json::from_str(r#""likes""#).expect("parse");
        assert_eq!(tab, FeedTab::Likes);
    }

    #[test]
    fn test_post_omits_absent_parent() {
        let post = Post {
            id: 1,
            user: User {
                uid: 7,
                pub_key_hex: "ab".repeat(32),
                display_name: "u7".to_string(),
                registered_at: 0,
            },
            content: "hello".to_string(),
            parent_id: None,
            created_at: 0,
            likes: 0,
            replies: 0,
        };
        let json = serde_json::to_value(&post).expect("serialize");
        assert!(json.get("parentID").is_none());
    }
}
