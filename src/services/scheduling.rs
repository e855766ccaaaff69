//! Calendar scheduling collaborator. The real scheduler is external (and
//! fallible); when it errors or returns nothing we fall back to a
//! deterministic rule-based placement so the user always gets a plan.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::services::error::FocusdeckError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulableTask {
    pub card_id: Uuid,
    pub title: String,
    /// Seconds; zero means "use the profile default".
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BusySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusySlot {
    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledSlot {
    pub card_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// User preferences the scheduler honors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulingProfile {
    /// Preferred working window, hours of day in UTC.
    pub preferred_start_hour: u32,
    pub preferred_end_hour: u32,
    /// Minutes between consecutive placed tasks.
    pub gap_minutes: u32,
    /// Default task length when a task carries no duration.
    pub default_duration_minutes: u32,
}

impl Default for SchedulingProfile {
    fn default() -> Self {
        Self {
            preferred_start_hour: 9,
            preferred_end_hour: 18,
            gap_minutes: 10,
            default_duration_minutes: 30,
        }
    }
}

#[automock]
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn schedule_tasks(
        &self,
        tasks: Vec<SchedulableTask>,
        window_start: DateTime<Utc>,
        busy: Vec<BusySlot>,
        profile: SchedulingProfile,
    ) -> Result<Vec<ScheduledSlot>, FocusdeckError>;
}

/// Asks the external scheduler first; on error or an empty plan, places the
/// tasks deterministically instead. "Merge & reorder" callers pass an empty
/// busy list so existing slots are re-planned from scratch.
pub async fn schedule_with_fallback(
    scheduler: &dyn TaskScheduler,
    tasks: Vec<SchedulableTask>,
    window_start: DateTime<Utc>,
    busy: Vec<BusySlot>,
    profile: SchedulingProfile,
) -> Vec<ScheduledSlot> {
    if tasks.is_empty() {
        return Vec::new();
    }
    match scheduler
        .schedule_tasks(tasks.clone(), window_start, busy.clone(), profile.clone())
        .await
    {
        Ok(slots) if !slots.is_empty() => slots,
        Ok(_) => {
            warn!("scheduler returned an empty plan, using fallback placement");
            fallback_schedule(&tasks, window_start, &busy, &profile)
        }
        Err(err) => {
            warn!(error = %err, "scheduler failed, using fallback placement");
            fallback_schedule(&tasks, window_start, &busy, &profile)
        }
    }
}

/// Sequential placement inside the preferred daily window, skipping busy
/// slots, rolling to the next day's window start when the current day runs
/// out. Deterministic for a given input.
pub fn fallback_schedule(
    tasks: &[SchedulableTask],
    window_start: DateTime<Utc>,
    busy: &[BusySlot],
    profile: &SchedulingProfile,
) -> Vec<ScheduledSlot> {
    let gap = Duration::minutes(profile.gap_minutes as i64);
    let mut cursor = clamp_to_window(window_start, profile);
    let mut slots = Vec::with_capacity(tasks.len());

    for task in tasks {
        let duration = if task.duration_seconds > 0 {
            Duration::seconds(task.duration_seconds as i64)
        } else {
            Duration::minutes(profile.default_duration_minutes as i64)
        };

        // Inverted or degenerate windows collapse to zero hours rather
        // than underflowing.
        let window_hours = Duration::hours(
            profile
                .preferred_end_hour
                .saturating_sub(profile.preferred_start_hour) as i64,
        );
        loop {
            let end = cursor + duration;
            // A task longer than the whole window goes at a window start
            // regardless; it can never fit "inside" a day.
            if duration >= window_hours {
                slots.push(ScheduledSlot {
                    card_id: task.card_id,
                    start: cursor,
                    end,
                });
                cursor = clamp_to_window(next_day_start(cursor, profile), profile);
                break;
            }
            if end.hour() >= profile.preferred_end_hour
                || end.date_naive() != cursor.date_naive()
            {
                cursor = clamp_to_window(next_day_start(cursor, profile), profile);
                continue;
            }
            if let Some(slot) = busy.iter().find(|b| b.overlaps(cursor, end)) {
                cursor = slot.end;
                cursor = clamp_to_window(cursor, profile);
                continue;
            }
            slots.push(ScheduledSlot {
                card_id: task.card_id,
                start: cursor,
                end,
            });
            cursor = end + gap;
            break;
        }
    }
    slots
}

/// Pushes a timestamp forward into the profile's daily window.
fn clamp_to_window(at: DateTime<Utc>, profile: &SchedulingProfile) -> DateTime<Utc> {
    let hour = at.hour();
    if hour < profile.preferred_start_hour {
        at.date_naive()
            .and_hms_opt(profile.preferred_start_hour, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(at)
    } else if hour >= profile.preferred_end_hour {
        next_day_start(at, profile)
    } else {
        at
    }
}

fn next_day_start(at: DateTime<Utc>, profile: &SchedulingProfile) -> DateTime<Utc> {
    (at.date_naive() + Duration::days(1))
        .and_hms_opt(profile.preferred_start_hour, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(at + Duration::days(1))
}
