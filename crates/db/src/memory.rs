//! In-process [`Store`] for tests.
//!
//! Each commit applies its batch to a copy of the state and swaps the copy in
//! only when every change succeeded, so failed batches leave nothing behind.
//! Unique keys are enforced the same way the schema enforces them.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::entities::{
    blocking, comment, conversation, express_interest, following, investor_profile,
    investor_verification, message, message_limit, notification, profile_reveal, subscription,
    user, user_profile, video, video_like,
};
use crate::store::{Account, Change, QuotaReservation, Store, VideoQuery, VideoStats};

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<String, user::Model>,
    profiles: BTreeMap<String, user_profile::Model>,
    subscriptions: BTreeMap<String, subscription::Model>,
    verifications: BTreeMap<String, investor_verification::Model>,
    investor_profiles: BTreeMap<String, investor_profile::Model>,
    follows: Vec<following::Model>,
    blocks: Vec<blocking::Model>,
    videos: Vec<video::Model>,
    likes: Vec<video_like::Model>,
    comments: Vec<comment::Model>,
    reveals: Vec<profile_reveal::Model>,
    interests: Vec<express_interest::Model>,
    conversations: Vec<conversation::Model>,
    messages: Vec<message::Model>,
    limits: Vec<message_limit::Model>,
    notifications: Vec<notification::Model>,
}

/// Memory-backed store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(what: &str) -> AppError {
    AppError::Conflict(format!("duplicate key value violates unique constraint on {what}"))
}

/// Items of a newest-first listing that come after `until_id`.
fn page_after<T: Clone>(
    items: Vec<&T>,
    id_of: impl Fn(&T) -> &str,
    until_id: Option<&str>,
    limit: u64,
) -> Vec<T> {
    let start = until_id
        .and_then(|until| items.iter().position(|item| id_of(item) == until))
        .map_or(0, |pos| pos + 1);
    items
        .into_iter()
        .skip(start)
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

impl State {
    fn apply(&mut self, change: Change) -> AppResult<()> {
        match change {
            Change::InsertUser(model) => {
                if self.users.contains_key(&model.id)
                    || self.users.values().any(|u| u.username == model.username)
                {
                    return Err(conflict("user"));
                }
                self.users.insert(model.id.clone(), model);
            }
            Change::SetAccountType {
                user_id,
                account_type,
                at,
            } => {
                let user = self
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| AppError::UserNotFound(user_id.clone()))?;
                user.account_type = account_type;
                user.updated_at = Some(at);
            }
            Change::SaveUserProfile(model) => {
                self.profiles.insert(model.user_id.clone(), model);
            }
            Change::SaveSubscription(model) => {
                let row = match self.subscriptions.get(&model.user_id) {
                    Some(existing) => subscription::Model {
                        id: existing.id.clone(),
                        created_at: existing.created_at,
                        ..model
                    },
                    None => model,
                };
                self.subscriptions.insert(row.user_id.clone(), row);
            }
            Change::SaveVerification(model) => {
                self.verifications.insert(model.user_id.clone(), model);
            }
            Change::SaveInvestorProfile(model) => {
                self.investor_profiles.insert(model.user_id.clone(), model);
            }
            Change::InsertFollow(model) => {
                if self.follows.iter().any(|f| {
                    f.follower_id == model.follower_id && f.following_id == model.following_id
                }) {
                    return Err(conflict("following"));
                }
                self.follows.push(model);
            }
            Change::DeleteFollow {
                follower_id,
                following_id,
            } => {
                self.follows
                    .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
            }
            Change::DeleteFollowsBetween { user_a, user_b } => {
                self.follows.retain(|f| {
                    !((f.follower_id == user_a && f.following_id == user_b)
                        || (f.follower_id == user_b && f.following_id == user_a))
                });
            }
            Change::InsertBlock(model) => {
                if self
                    .blocks
                    .iter()
                    .any(|b| b.blocker_id == model.blocker_id && b.blocked_id == model.blocked_id)
                {
                    return Err(conflict("blocking"));
                }
                self.blocks.push(model);
            }
            Change::DeleteBlock {
                blocker_id,
                blocked_id,
            } => {
                self.blocks
                    .retain(|b| !(b.blocker_id == blocker_id && b.blocked_id == blocked_id));
            }
            Change::InsertVideo(model) => self.videos.push(model),
            Change::InsertLike(model) => {
                if self
                    .likes
                    .iter()
                    .any(|l| l.video_id == model.video_id && l.user_id == model.user_id)
                {
                    return Err(conflict("video_like"));
                }
                self.likes.push(model);
            }
            Change::DeleteLike { video_id, user_id } => {
                self.likes
                    .retain(|l| !(l.video_id == video_id && l.user_id == user_id));
            }
            Change::InsertComment(model) => self.comments.push(model),
            Change::UpsertReveal(model) => {
                let exists = self.reveals.iter().any(|r| {
                    r.investor_id == model.investor_id && r.founder_id == model.founder_id
                });
                if !exists {
                    self.reveals.push(model);
                }
            }
            Change::InsertInterest(model) => {
                if self.interests.iter().any(|i| {
                    i.investor_id == model.investor_id
                        && i.founder_id == model.founder_id
                        && i.video_id == model.video_id
                }) {
                    return Err(conflict("express_interest"));
                }
                self.interests.push(model);
            }
            Change::SetInterestStatus { id, from, to, at } => {
                let interest = self
                    .interests
                    .iter_mut()
                    .find(|i| i.id == id && i.status == from)
                    .ok_or_else(|| AppError::Conflict(format!("interest {id} is no longer {from:?}")))?;
                interest.status = to;
                interest.updated_at = Some(at);
            }
            Change::CreateConversation(model) => {
                if self.conversations.iter().any(|c| c.pair_key == model.pair_key) {
                    return Err(conflict("conversation"));
                }
                self.conversations.push(model);
            }
            Change::TransitionConversation {
                id,
                from,
                to,
                is_revealed,
            } => {
                let conversation = self
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == id && c.status == from)
                    .ok_or_else(|| {
                        AppError::Conflict(format!("conversation {id} is no longer {from:?}"))
                    })?;
                conversation.status = to;
                if let Some(revealed) = is_revealed {
                    conversation.is_revealed = revealed;
                }
            }
            Change::DeleteConversation { id, expected } => {
                let before = self.conversations.len();
                self.conversations
                    .retain(|c| !(c.id == id && c.status == expected));
                if self.conversations.len() == before {
                    return Err(AppError::Conflict(format!(
                        "conversation {id} is no longer {expected:?}"
                    )));
                }
                self.messages.retain(|m| m.conversation_id != id);
            }
            Change::InsertMessage(model) => {
                let conversation = self
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == model.conversation_id)
                    .ok_or_else(|| {
                        AppError::Database(format!(
                            "message references missing conversation {}",
                            model.conversation_id
                        ))
                    })?;
                conversation.last_message_at = Some(model.created_at);
                self.messages.push(model);
            }
            Change::MarkRead {
                conversation_id,
                reader_id,
                at,
            } => {
                for message in self.messages.iter_mut().filter(|m| {
                    m.conversation_id == conversation_id
                        && m.sender_id != reader_id
                        && m.read_at.is_none()
                }) {
                    message.read_at = Some(at);
                }
            }
            Change::ReserveQuota(reservation) => self.reserve(&reservation)?,
            Change::Notify(model) => self.notifications.push(model),
        }
        Ok(())
    }

    fn reserve(&mut self, reservation: &QuotaReservation) -> AppResult<()> {
        let position = self
            .limits
            .iter()
            .position(|l| l.user_id == reservation.user_id && l.period == reservation.period);
        let index = position.unwrap_or_else(|| {
            self.limits.push(message_limit::Model {
                id: reservation.id.clone(),
                user_id: reservation.user_id.clone(),
                period: reservation.period.clone(),
                count: 0,
                resets_at: reservation.next_reset,
            });
            self.limits.len() - 1
        });

        let row = &mut self.limits[index];
        if row.resets_at <= reservation.now {
            row.count = 0;
            row.resets_at = reservation.next_reset;
        }
        if i64::from(row.count) >= i64::from(reservation.cap) {
            return Err(AppError::QuotaExceeded {
                message: format!("Monthly limit of {} investor messages reached", reservation.cap),
                resets_at: row.resets_at,
            });
        }
        row.count += 1;
        Ok(())
    }

    fn is_participant_conversation(&self, conversation_id: &str, user_id: &str) -> bool {
        self.conversations
            .iter()
            .any(|c| c.id == conversation_id && c.has_participant(user_id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_account(&self, user_id: &str) -> AppResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).map(|user| Account {
            user: user.clone(),
            profile: state.profiles.get(user_id).cloned(),
            subscription: state.subscriptions.get(user_id).cloned(),
            verification: state.verifications.get(user_id).cloned(),
            investor_profile: state.investor_profiles.get(user_id).cloned(),
        }))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_video(&self, id: &str) -> AppResult<Option<video::Model>> {
        let state = self.state.read().await;
        Ok(state.videos.iter().find(|v| v.id == id).cloned())
    }

    async fn list_videos(&self, query: &VideoQuery) -> AppResult<Vec<video::Model>> {
        let state = self.state.read().await;
        let matching: Vec<&video::Model> = state
            .videos
            .iter()
            .rev()
            .filter(|v| {
                query.visibility.contains(&v.visibility)
                    || query.include_owned_by.as_deref() == Some(v.user_id.as_str())
            })
            .filter(|v| query.owner_id.as_deref().is_none_or(|owner| v.user_id == owner))
            .filter(|v| query.kind.is_none_or(|kind| v.kind == kind))
            .collect();
        Ok(page_after(
            matching,
            |v| v.id.as_str(),
            query.until_id.as_deref(),
            query.limit,
        ))
    }

    async fn count_videos_since(&self, user_id: &str, since: DateTime<Utc>) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .videos
            .iter()
            .filter(|v| v.user_id == user_id && v.created_at >= since)
            .count() as u64)
    }

    async fn video_stats(&self, video_id: &str) -> AppResult<VideoStats> {
        let state = self.state.read().await;
        Ok(VideoStats {
            likes: state.likes.iter().filter(|l| l.video_id == video_id).count() as u64,
            comments: state
                .comments
                .iter()
                .filter(|c| c.video_id == video_id)
                .count() as u64,
            interests: state
                .interests
                .iter()
                .filter(|i| i.video_id == video_id)
                .count() as u64,
        })
    }

    async fn find_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<Option<video_like::Model>> {
        let state = self.state.read().await;
        Ok(state
            .likes
            .iter()
            .find(|l| l.video_id == video_id && l.user_id == user_id)
            .cloned())
    }

    async fn list_comments(
        &self,
        video_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        let state = self.state.read().await;
        let matching: Vec<&comment::Model> = state
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .collect();
        Ok(page_after(matching, |c| c.id.as_str(), since_id, limit))
    }

    async fn find_block(
        &self,
        blocker_id: &str,
        blocked_id: &str,
    ) -> AppResult<Option<blocking::Model>> {
        let state = self.state.read().await;
        Ok(state
            .blocks
            .iter()
            .find(|b| b.blocker_id == blocker_id && b.blocked_id == blocked_id)
            .cloned())
    }

    async fn is_blocked_between(&self, user_a: &str, user_b: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.blocks.iter().any(|b| {
            (b.blocker_id == user_a && b.blocked_id == user_b)
                || (b.blocker_id == user_b && b.blocked_id == user_a)
        }))
    }

    async fn list_blocking(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blocking::Model>> {
        let state = self.state.read().await;
        let matching: Vec<&blocking::Model> = state
            .blocks
            .iter()
            .rev()
            .filter(|b| b.blocker_id == user_id)
            .collect();
        Ok(page_after(matching, |b| b.id.as_str(), until_id, limit))
    }

    async fn find_follow(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<Option<following::Model>> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .find(|f| f.follower_id == follower_id && f.following_id == following_id)
            .cloned())
    }

    async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|f| f.following_id == user_id)
            .count() as u64)
    }

    async fn is_revealed(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .reveals
            .iter()
            .any(|r| r.investor_id == investor_id && r.founder_id == founder_id))
    }

    async fn find_interest(&self, id: &str) -> AppResult<Option<express_interest::Model>> {
        let state = self.state.read().await;
        Ok(state.interests.iter().find(|i| i.id == id).cloned())
    }

    async fn find_interest_by_triple(
        &self,
        investor_id: &str,
        founder_id: &str,
        video_id: &str,
    ) -> AppResult<Option<express_interest::Model>> {
        let state = self.state.read().await;
        Ok(state
            .interests
            .iter()
            .find(|i| {
                i.investor_id == investor_id && i.founder_id == founder_id && i.video_id == video_id
            })
            .cloned())
    }

    async fn has_accepted_interest(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.interests.iter().any(|i| {
            i.investor_id == investor_id
                && i.founder_id == founder_id
                && i.status == express_interest::InterestStatus::Accepted
        }))
    }

    async fn list_interests_for_founder(
        &self,
        founder_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        let state = self.state.read().await;
        let matching: Vec<&express_interest::Model> = state
            .interests
            .iter()
            .rev()
            .filter(|i| i.founder_id == founder_id)
            .collect();
        Ok(page_after(matching, |i| i.id.as_str(), None, limit))
    }

    async fn list_interests_for_investor(
        &self,
        investor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        let state = self.state.read().await;
        let matching: Vec<&express_interest::Model> = state
            .interests
            .iter()
            .rev()
            .filter(|i| i.investor_id == investor_id)
            .collect();
        Ok(page_after(matching, |i| i.id.as_str(), None, limit))
    }

    async fn find_conversation(&self, id: &str) -> AppResult<Option<conversation::Model>> {
        let state = self.state.read().await;
        Ok(state.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn find_conversation_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<conversation::Model>> {
        let pair_key = conversation::Model::pair_key_for(user_a, user_b);
        let state = self.state.read().await;
        Ok(state
            .conversations
            .iter()
            .find(|c| c.pair_key == pair_key)
            .cloned())
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<conversation::Model>> {
        let state = self.state.read().await;
        let mut matching: Vec<&conversation::Model> = state
            .conversations
            .iter()
            .rev()
            .filter(|c| c.has_participant(user_id))
            .collect();
        // Stable sort keeps newer conversations first among equal timestamps.
        matching.sort_by_key(|c| Reverse(c.last_message_at));
        Ok(page_after(matching, |c| c.id.as_str(), None, limit))
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let state = self.state.read().await;
        let mut matching: Vec<&message::Model> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();
        matching.sort_by_key(|m| m.created_at);
        matching.reverse();
        let mut page = page_after(matching, |m| m.id.as_str(), until_id, limit);
        page.reverse();
        Ok(page)
    }

    async fn count_unread(&self, conversation_id: &str, reader_id: &str) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| {
                m.conversation_id == conversation_id
                    && m.sender_id != reader_id
                    && m.read_at.is_none()
            })
            .count() as u64)
    }

    async fn count_unread_total(&self, user_id: &str) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| {
                m.sender_id != user_id
                    && m.read_at.is_none()
                    && state.is_participant_conversation(&m.conversation_id, user_id)
            })
            .count() as u64)
    }

    async fn find_message_limit(
        &self,
        user_id: &str,
        period: &str,
    ) -> AppResult<Option<message_limit::Model>> {
        let state = self.state.read().await;
        Ok(state
            .limits
            .iter()
            .find(|l| l.user_id == user_id && l.period == period)
            .cloned())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        let state = self.state.read().await;
        let matching: Vec<&notification::Model> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .collect();
        Ok(page_after(matching, |n| n.id.as_str(), until_id, limit))
    }

    async fn commit(&self, changes: Vec<Change>) -> AppResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        for change in changes {
            next.apply(change)?;
        }
        *state = next;
        Ok(())
    }
}
