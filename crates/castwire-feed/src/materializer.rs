//! Derived read models over the action ledger.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use castwire_types::{Action, FeedTab, LedgerEntry, Post, Thread, User};

use crate::{FeedError, Result};

/// Internal record for one materialized post.
#[derive(Clone, Debug)]
struct PostRecord {
    id: i64,
    uid: i64,
    content: String,
    /// Parent as submitted. Existence is resolved at read time: a missing
    /// parent terminates the thread walk and the post renders as root.
    parent_id: Option<i64>,
    created_at: u64,
    likes: HashSet<i64>,
    replies: u64,
}

/// Materialized state derived from the ledger.
///
/// Applies entries strictly in seq order. Like/unlike and follow/unfollow
/// are idempotent at this layer: a duplicate like or an unlike without a
/// prior like is a no-op, so replaying the log always converges to the same
/// state.
#[derive(Default)]
pub struct Materializer {
    users: HashMap<i64, User>,
    posts: BTreeMap<i64, PostRecord>,
    /// Per-uid log of (like seq, post id), newest last. Drives the profile
    /// "likes" tab ordering.
    liked_log: HashMap<i64, Vec<(i64, i64)>>,
    /// follower uid -> followee uids.
    follows: HashMap<i64, HashSet<i64>>,
    /// Highest seq applied so far.
    applied_seq: i64,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild all derived state from scratch.
    ///
    /// `users` must contain every uid appearing in `entries`; `entries`
    /// must be in ascending seq order (as returned by a ledger snapshot).
    pub fn rebuild(users: Vec<User>, entries: &[LedgerEntry]) -> Self {
        let mut m = Self::new();
        for user in users {
            m.upsert_user(user);
        }
        for entry in entries {
            m.apply(entry);
        }
        debug!(
            posts = m.posts.len(),
            applied_seq = m.applied_seq,
            "materializer rebuilt"
        );
        m
    }

    /// Register or refresh a user record used when assembling posts.
    pub fn upsert_user(&mut self, user: User) {
        self.users.insert(user.uid, user);
    }

    /// Apply one accepted ledger entry to the derived state.
    pub fn apply(&mut self, entry: &LedgerEntry) {
        if entry.seq <= self.applied_seq {
            // Replay of an already-applied entry; applies are idempotent by
            // construction but skipping keeps reply counts exact.
            return;
        }
        self.applied_seq = entry.seq;

        match &entry.action {
            Action::Post { content, parent_id } => {
                if let Some(parent) = parent_id {
                    if let Some(parent_rec) = self.posts.get_mut(parent) {
                        parent_rec.replies += 1;
                    }
                }
                self.posts.insert(
                    entry.seq,
                    PostRecord {
                        id: entry.seq,
                        uid: entry.uid,
                        content: content.clone(),
                        parent_id: *parent_id,
                        created_at: entry.accepted_at,
                        likes: HashSet::new(),
                        replies: 0,
                    },
                );
            }
            Action::Like { post_id } => {
                if let Some(post) = self.posts.get_mut(post_id) {
                    if post.likes.insert(entry.uid) {
                        self.liked_log
                            .entry(entry.uid)
                            .or_default()
                            .push((entry.seq, *post_id));
                    }
                }
                // Like of a nonexistent post is a no-op.
            }
            Action::Unlike { post_id } => {
                if let Some(post) = self.posts.get_mut(post_id) {
                    if post.likes.remove(&entry.uid) {
                        if let Some(log) = self.liked_log.get_mut(&entry.uid) {
                            log.retain(|(_, p)| p != post_id);
                        }
                    }
                }
            }
            Action::Follow { uid } => {
                self.follows.entry(entry.uid).or_default().insert(*uid);
            }
            Action::Unfollow { uid } => {
                if let Some(set) = self.follows.get_mut(&entry.uid) {
                    set.remove(uid);
                }
            }
        }
    }

    /// Load a single post visible to `viewer_uid`. Absent is a normal
    /// outcome — callers render an empty view, they do not treat it as an
    /// error.
    pub fn load_post(&self, viewer_uid: i64, post_id: i64) -> Option<Post> {
        let record = self.posts.get(&post_id)?;
        if !self.is_visible(viewer_uid, record) {
            return None;
        }
        self.assemble(record)
    }

    /// Load the ancestor chain for `post_id`, root first, ending at the
    /// requested post.
    ///
    /// A missing parent terminates the walk: that post becomes the effective
    /// root. A cycle in the ancestry (possible only through a reply chain
    /// that references forward ids, or a corrupted store) is detected with a
    /// visited set and reported as [`FeedError::CorruptThread`] carrying the
    /// longest valid prefix.
    pub fn load_thread(&self, viewer_uid: i64, post_id: i64) -> Result<Thread> {
        let mut chain: Vec<&PostRecord> = Vec::new();
        let mut visited: HashSet<i64> = HashSet::new();
        let mut cursor = self.posts.get(&post_id);

        let mut corrupt = false;
        while let Some(record) = cursor {
            if !visited.insert(record.id) {
                warn!(post_id, cycle_at = record.id, "cyclic thread ancestry");
                corrupt = true;
                break;
            }
            chain.push(record);
            cursor = match record.parent_id {
                Some(parent) => self.posts.get(&parent),
                None => None,
            };
        }

        // Collected leaf-to-root; emit root-first, ascending seq.
        chain.reverse();
        let posts: Vec<Post> = chain
            .iter()
            .filter(|r| self.is_visible(viewer_uid, r))
            .filter_map(|r| self.assemble(r))
            .collect();
        let thread = Thread {
            root_id: posts.first().map(|p| p.id).unwrap_or(post_id),
            posts,
        };

        if corrupt {
            return Err(FeedError::CorruptThread {
                post_id,
                partial: thread,
            });
        }
        Ok(thread)
    }

    /// All posts visible to the viewer, reverse-chronological.
    pub fn home_feed(&self, viewer_uid: i64) -> Vec<Post> {
        self.posts
            .values()
            .rev()
            .filter(|r| self.is_visible(viewer_uid, r))
            .filter_map(|r| self.assemble(r))
            .collect()
    }

    /// One user's profile feed: their posts, or the posts they have liked,
    /// reverse-chronological.
    pub fn profile_feed(&self, viewer_uid: i64, profile_uid: i64, tab: FeedTab) -> Vec<Post> {
        match tab {
            FeedTab::Posts => self
                .posts
                .values()
                .rev()
                .filter(|r| r.uid == profile_uid)
                .filter(|r| self.is_visible(viewer_uid, r))
                .filter_map(|r| self.assemble(r))
                .collect(),
            FeedTab::Likes => {
                let log = match self.liked_log.get(&profile_uid) {
                    Some(log) => log,
                    None => return Vec::new(),
                };
                log.iter()
                    .rev()
                    .filter_map(|(_, post_id)| self.posts.get(post_id))
                    .filter(|r| self.is_visible(viewer_uid, r))
                    .filter_map(|r| self.assemble(r))
                    .collect()
            }
        }
    }

    /// Whether `follower` currently follows `followee`.
    pub fn is_following(&self, follower: i64, followee: i64) -> bool {
        self.follows
            .get(&follower)
            .is_some_and(|set| set.contains(&followee))
    }

    /// Number of users `uid` follows.
    pub fn following_count(&self, uid: i64) -> usize {
        self.follows.get(&uid).map_or(0, |set| set.len())
    }

    /// Number of users following `uid`.
    pub fn follower_count(&self, uid: i64) -> usize {
        self.follows
            .values()
            .filter(|set| set.contains(&uid))
            .count()
    }

    /// Highest seq applied so far.
    pub fn applied_seq(&self) -> i64 {
        self.applied_seq
    }

    /// Content-visibility policy seam.
    ///
    /// Moderation state and viewer-specific filtering (blocked authors,
    /// tombstoned posts) plug in here; the base policy is that every
    /// materialized post is visible to every viewer, including anonymous
    /// viewers (uid -1) holding a share token.
    fn is_visible(&self, _viewer_uid: i64, _record: &PostRecord) -> bool {
        true
    }

    fn assemble(&self, record: &PostRecord) -> Option<Post> {
        let user = match self.users.get(&record.uid) {
            Some(user) => user.clone(),
            None => {
                // Ledger rows always reference a registered uid; hitting this
                // means the user cache was not primed after a rebuild.
                warn!(uid = record.uid, post = record.id, "missing user record");
                return None;
            }
        };
        Some(Post {
            id: record.id,
            user,
            content: record.content.clone(),
            parent_id: record.parent_id,
            created_at: record.created_at,
            likes: record.likes.len() as u64,
            replies: record.replies,
        })
    }
}
