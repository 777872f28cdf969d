//! Feed read commands and share-token issuance.
//!
//! Every read resolves a viewer first: a valid session token gives the
//! session's uid; failing that, a share token valid for the requested post
//! gives the anonymous viewer. Requests with neither are rejected before
//! any feed state is touched.

use serde::Deserialize;
use serde_json::json;

use castwire_auth::share;
use castwire_feed::FeedError;
use castwire_types::FeedTab;

use crate::commands::{parse_params, session_user, ANONYMOUS_UID};
use crate::rpc::RpcError;
use crate::DaemonState;

#[derive(Debug, Deserialize)]
struct PostReadParams {
    #[serde(rename = "sessionToken", default)]
    session_token: Option<String>,
    #[serde(rename = "shareToken", default)]
    share_token: Option<String>,
    #[serde(rename = "postID")]
    post_id: i64,
}

/// Resolve the viewer for a post-scoped read.
///
/// Session wins over share token; the share token is only consulted for
/// the exact post it was issued for.
fn resolve_post_viewer(state: &DaemonState, params: &PostReadParams) -> Result<i64, RpcError> {
    if let Some(user) = session_user(state, params.session_token.as_deref())? {
        return Ok(user.uid);
    }
    if let Some(token) = params.share_token.as_deref() {
        if share::auth_post_share_token(&state.share_secret, token, params.post_id) {
            return Ok(ANONYMOUS_UID);
        }
    }
    Err(RpcError::unauthorized())
}

/// Load a single post.
pub async fn load_post(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: PostReadParams = parse_params(params)?;
    let viewer = resolve_post_viewer(state, &params)?;

    let feed = state.feed.read().await;
    match feed.load_post(viewer, params.post_id) {
        Some(post) => Ok(json!({ "post": post })),
        None => Err(RpcError::not_found()),
    }
}

/// Load the ancestor thread for a post, root first.
pub async fn load_thread(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: PostReadParams = parse_params(params)?;
    let viewer = resolve_post_viewer(state, &params)?;

    let feed = state.feed.read().await;
    if feed.load_post(viewer, params.post_id).is_none() {
        return Err(RpcError::not_found());
    }
    match feed.load_thread(viewer, params.post_id) {
        Ok(thread) => Ok(json!({ "thread": thread })),
        Err(FeedError::CorruptThread { post_id, partial }) => {
            let partial = serde_json::to_value(partial)
                .map_err(|e| RpcError::internal_error(&e.to_string()))?;
            Err(RpcError::corrupt_thread(post_id, partial))
        }
    }
}

#[derive(Debug, Deserialize)]
struct HomeFeedParams {
    #[serde(rename = "sessionToken")]
    session_token: String,
}

/// Load the home feed, newest first. Sessions only; share tokens never
/// reach beyond their single post.
pub async fn home_feed(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: HomeFeedParams = parse_params(params)?;
    let user = session_user(state, Some(&params.session_token))?.ok_or_else(RpcError::unauthorized)?;

    let feed = state.feed.read().await;
    Ok(json!({ "posts": feed.home_feed(user.uid) }))
}

#[derive(Debug, Deserialize)]
struct ProfileFeedParams {
    #[serde(rename = "sessionToken")]
    session_token: String,
    #[serde(rename = "profileUid")]
    profile_uid: i64,
    tab: FeedTab,
}

/// Load one user's profile feed under the selected tab, with follow
/// counts for the profile header.
pub async fn profile_feed(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: ProfileFeedParams = parse_params(params)?;
    let user = session_user(state, Some(&params.session_token))?.ok_or_else(RpcError::unauthorized)?;

    let feed = state.feed.read().await;
    let posts = feed.profile_feed(user.uid, params.profile_uid, params.tab);
    Ok(json!({
        "posts": posts,
        "followerCount": feed.follower_count(params.profile_uid),
        "followingCount": feed.following_count(params.profile_uid),
        "isFollowing": feed.is_following(user.uid, params.profile_uid),
    }))
}

#[derive(Debug, Deserialize)]
struct IssueShareTokenParams {
    #[serde(rename = "sessionToken")]
    session_token: String,
    #[serde(rename = "postID")]
    post_id: i64,
}

/// Issue a share token for a post the caller can see.
pub async fn issue_share_token(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: IssueShareTokenParams = parse_params(params)?;
    let user = session_user(state, Some(&params.session_token))?.ok_or_else(RpcError::unauthorized)?;

    let feed = state.feed.read().await;
    if feed.load_post(user.uid, params.post_id).is_none() {
        return Err(RpcError::not_found());
    }
    drop(feed);

    let token = share::issue_share_token(&state.share_secret, params.post_id);
    Ok(json!({ "shareToken": token }))
}
