//! Pure aggregations over audit events.
//!
//! Everything here is recomputed from the event set on each call; nothing is
//! cached or materialized.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use campus_core::UserId;

use crate::event::{AuditEvent, ScopedEvent};

/// Trailing window counted as recent activity.
pub const RECENT_ACTIVITY_DAYS: i64 = 30;

/// Upper bound on [`AuditStatistics::top_active_users`].
pub const TOP_ACTIVE_USERS: usize = 10;

/// Role bucket for actors no longer present in the directory.
pub const UNKNOWN_ROLE: &str = "UNKNOWN";

/// Breakdown key of an action: the text before the first `_`, or the whole
/// action when it has no `_` (`"USER_LOGIN"` → `"USER"`, `"LOGOUT"` → `"LOGOUT"`).
pub fn action_prefix(action: &str) -> &str {
    action.split_once('_').map_or(action, |(prefix, _)| prefix)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: UserId,
    pub total_actions: u64,
    pub action_breakdown: BTreeMap<String, u64>,
    pub recent_activity: u64,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl UserSummary {
    /// Summarize one user's events. Order of `events` does not matter.
    pub fn from_events<'a, I>(user_id: UserId, events: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a AuditEvent>,
    {
        let cutoff = now - Duration::days(RECENT_ACTIVITY_DAYS);
        let mut summary = Self {
            user_id,
            total_actions: 0,
            action_breakdown: BTreeMap::new(),
            recent_activity: 0,
            first_activity: None,
            last_activity: None,
        };

        for event in events {
            summary.total_actions += 1;
            *summary
                .action_breakdown
                .entry(action_prefix(&event.action).to_string())
                .or_default() += 1;
            if event.created_at >= cutoff {
                summary.recent_activity += 1;
            }
            summary.first_activity = Some(
                summary
                    .first_activity
                    .map_or(event.created_at, |t| t.min(event.created_at)),
            );
            summary.last_activity = Some(
                summary
                    .last_activity
                    .map_or(event.created_at, |t| t.max(event.created_at)),
            );
        }

        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    pub by_action: BTreeMap<String, u64>,
    pub by_role: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD` (UTC).
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorActivity {
    pub actor_id: UserId,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatistics {
    pub total_actions: u64,
    pub unique_users: u64,
    pub breakdowns: Breakdowns,
    /// Ascending by date.
    pub daily_activity: Vec<DailyCount>,
    /// At most [`TOP_ACTIVE_USERS`], count descending; ties keep first-seen order.
    pub top_active_users: Vec<ActorActivity>,
}

impl AuditStatistics {
    /// Aggregate `events` in the order given. Callers pass a chronological
    /// ascending scan so that top-user ties resolve to the earliest actor.
    pub fn from_scan<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a ScopedEvent>,
    {
        let mut stats = Self::default();
        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        let mut actors: Vec<ActorActivity> = Vec::new();
        let mut actor_index: HashMap<UserId, usize> = HashMap::new();

        for scoped in events {
            let event = &scoped.event;
            stats.total_actions += 1;

            *stats
                .breakdowns
                .by_action
                .entry(action_prefix(&event.action).to_string())
                .or_default() += 1;

            let role = scoped.actor.map_or(UNKNOWN_ROLE, |a| a.role.as_str());
            *stats.breakdowns.by_role.entry(role.to_string()).or_default() += 1;

            *daily.entry(event.created_at.date_naive()).or_default() += 1;

            match actor_index.entry(event.actor_id) {
                Entry::Occupied(slot) => actors[*slot.get()].count += 1,
                Entry::Vacant(slot) => {
                    slot.insert(actors.len());
                    actors.push(ActorActivity {
                        actor_id: event.actor_id,
                        count: 1,
                    });
                }
            }
        }

        stats.unique_users = actors.len() as u64;
        stats.daily_activity = daily
            .into_iter()
            .map(|(date, count)| DailyCount {
                date: date.format("%Y-%m-%d").to_string(),
                count,
            })
            .collect();

        // Stable sort: equal counts keep first-appearance order.
        actors.sort_by(|a, b| b.count.cmp(&a.count));
        actors.truncate(TOP_ACTIVE_USERS);
        stats.top_active_users = actors;

        stats
    }
}
