//! Periodic reminder sweep over scheduled cards. The sweep itself is pure;
//! the engine runs it on an interval and plays the returned events.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::domain::card::{Card, CardStatus};
use crate::store::CardStore;

/// How often the host should sweep.
pub const ALARM_SWEEP_SECONDS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvent {
    pub card_id: Uuid,
    pub title: String,
    pub scheduled_start: DateTime<Utc>,
}

/// A card is due when `now` has passed `scheduled_start - reminder_hours`
/// and the alarm has not played yet. Completed and skipped cards never ring.
fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    if card.alarm_played
        || matches!(card.status, CardStatus::Completed | CardStatus::Skipped)
    {
        return false;
    }
    let Some(start) = card.scheduled_start else {
        return false;
    };
    match card.reminder_hours {
        Some(hours) => now >= start - Duration::seconds((hours * 3600.0) as i64),
        None => now >= start,
    }
}

/// Collects due reminders and marks them played so the next sweep stays
/// quiet. One event per card, ever, until the flag is reset by a reschedule.
pub fn sweep(store: &mut CardStore, now: DateTime<Utc>) -> Vec<AlarmEvent> {
    let due: Vec<Uuid> = store
        .cards()
        .iter()
        .filter(|card| is_due(card, now))
        .map(|card| card.id)
        .collect();

    let mut events = Vec::with_capacity(due.len());
    for id in due {
        if let Some(card) = store.get_mut(id) {
            card.alarm_played = true;
            if let Some(start) = card.scheduled_start {
                debug!(card_id = %id, %start, "reminder due");
                events.push(AlarmEvent {
                    card_id: id,
                    title: card.title.clone(),
                    scheduled_start: start,
                });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CardDraft, SpawnContext};

    fn scheduled_card(store: &mut CardStore, start_in_hours: i64, reminder_hours: f64) -> Uuid {
        let id = store.create_card(CardDraft::default(), None, &SpawnContext::default());
        let card = store.get_mut(id).unwrap();
        card.scheduled_start = Some(Utc::now() + Duration::hours(start_in_hours));
        card.reminder_hours = Some(reminder_hours);
        id
    }

    #[test]
    fn test_sweep_fires_inside_reminder_window() {
        let mut store = CardStore::new();
        let soon = scheduled_card(&mut store, 1, 2.0); // window opened an hour ago
        let later = scheduled_card(&mut store, 5, 1.0); // window opens in 4h

        let events = sweep(&mut store, Utc::now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].card_id, soon);
        assert!(store.get(soon).unwrap().alarm_played);
        assert!(!store.get(later).unwrap().alarm_played);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut store = CardStore::new();
        scheduled_card(&mut store, 0, 1.0);

        assert_eq!(sweep(&mut store, Utc::now()).len(), 1);
        assert!(sweep(&mut store, Utc::now()).is_empty());
    }

    #[test]
    fn test_completed_and_skipped_cards_stay_silent() {
        let mut store = CardStore::new();
        let done = scheduled_card(&mut store, 0, 1.0);
        let skipped = scheduled_card(&mut store, 0, 1.0);
        store.set_status(done, CardStatus::Completed);
        store.set_status(skipped, CardStatus::Skipped);

        assert!(sweep(&mut store, Utc::now()).is_empty());
    }

    #[test]
    fn test_unscheduled_cards_never_ring() {
        let mut store = CardStore::new();
        let id = store.create_card(CardDraft::default(), None, &SpawnContext::default());
        store.get_mut(id).unwrap().reminder_hours = Some(1.0);

        assert!(sweep(&mut store, Utc::now()).is_empty());
    }

    #[test]
    fn test_no_reminder_window_rings_at_start() {
        let mut store = CardStore::new();
        let id = store.create_card(CardDraft::default(), None, &SpawnContext::default());
        let now = Utc::now();
        store.get_mut(id).unwrap().scheduled_start = Some(now - Duration::minutes(1));

        let events = sweep(&mut store, now);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].card_id, id);
    }

    #[test]
    fn test_fractional_reminder_hours() {
        let mut store = CardStore::new();
        let id = store.create_card(CardDraft::default(), None, &SpawnContext::default());
        let now = Utc::now();
        {
            let card = store.get_mut(id).unwrap();
            card.scheduled_start = Some(now + Duration::minutes(20));
            card.reminder_hours = Some(0.5);
        }

        let events = sweep(&mut store, now);
        // 30-minute lead on a start 20 minutes out: due now.
        assert_eq!(events.len(), 1);
    }
}
