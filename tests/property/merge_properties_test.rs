//! Property-based tests for the bookmark merge rule.
//!
//! `apply_event` is the single funnel for every mutation source (own writes,
//! remote feed, cross-tab broadcast), so duplicated and reordered deliveries
//! must never corrupt the list.

use chrono::{TimeZone, Utc};
use marksync::managers::sync_list::apply_event;
use marksync::types::bookmark::Bookmark;
use marksync::types::event::BookmarkEvent;
use proptest::prelude::*;

/// Strategy for short hex-ish record identifiers.
fn arb_id() -> impl Strategy<Value = String> {
    "[a-f0-9]{6}"
}

/// Strategy for a full bookmark record with a bounded timestamp.
fn arb_bookmark() -> impl Strategy<Value = Bookmark> {
    (
        arb_id(),
        "[a-z][a-z0-9]{2,10}",
        "[A-Za-z][A-Za-z0-9 ]{0,20}",
        0i64..2_000_000_000,
    )
        .prop_map(|(id, host, title, ts)| Bookmark {
            id,
            url: format!("https://{}.com", host),
            title,
            created_at: Utc.timestamp_opt(ts, 0).single().unwrap_or_else(Utc::now),
            user_id: "owner".to_string(),
        })
}

/// Strategy for a starting list with unique identifiers.
fn arb_list() -> impl Strategy<Value = Vec<Bookmark>> {
    prop::collection::vec(arb_bookmark(), 0..8).prop_map(|mut items| {
        let mut seen = std::collections::HashSet::new();
        items.retain(|bm| seen.insert(bm.id.clone()));
        items
    })
}

/// Strategy for an arbitrary event about an arbitrary record.
fn arb_event() -> impl Strategy<Value = BookmarkEvent> {
    prop_oneof![
        arb_bookmark().prop_map(|bookmark| BookmarkEvent::Added { bookmark }),
        arb_id().prop_map(|id| BookmarkEvent::Deleted { id }),
    ]
}

fn ids(list: &[Bookmark]) -> Vec<&str> {
    list.iter().map(|bm| bm.id.as_str()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // For any list and record, applying the same add twice leaves exactly the
    // state one application produced: the merge is idempotent.
    #[test]
    fn adding_twice_equals_adding_once(list in arb_list(), bm in arb_bookmark()) {
        let event = BookmarkEvent::Added { bookmark: bm };

        let mut once = list.clone();
        apply_event(&mut once, &event);

        let mut twice = list;
        apply_event(&mut twice, &event);
        apply_event(&mut twice, &event);

        prop_assert_eq!(once, twice);
    }

    // For any record, the broadcast copy and the feed copy of the same add
    // may arrive in either order; both orders produce exactly one entry.
    #[test]
    fn duplicate_delivery_across_channels_keeps_one_copy(
        list in arb_list(),
        bm in arb_bookmark(),
    ) {
        let event = BookmarkEvent::Added { bookmark: bm.clone() };
        let mut merged = list;
        apply_event(&mut merged, &event);
        apply_event(&mut merged, &event);

        let copies = merged.iter().filter(|existing| existing.id == bm.id).count();
        prop_assert_eq!(copies, 1);
    }

    // For any list, deleting an identifier twice equals deleting it once,
    // and deleting an absent identifier changes nothing.
    #[test]
    fn deleting_is_idempotent(list in arb_list(), id in arb_id()) {
        let event = BookmarkEvent::Deleted { id: id.clone() };

        let mut once = list.clone();
        apply_event(&mut once, &event);

        let mut twice = list.clone();
        apply_event(&mut twice, &event);
        apply_event(&mut twice, &event);

        prop_assert_eq!(&once, &twice);
        if !list.iter().any(|bm| bm.id == id) {
            prop_assert_eq!(once, list);
        }
    }

    // For any list and record not in it, add then delete returns to the
    // original list.
    #[test]
    fn add_then_delete_round_trips(list in arb_list(), bm in arb_bookmark()) {
        let mut without: Vec<Bookmark> = list;
        without.retain(|existing| existing.id != bm.id);

        let mut merged = without.clone();
        apply_event(&mut merged, &BookmarkEvent::Added { bookmark: bm.clone() });
        apply_event(&mut merged, &BookmarkEvent::Deleted { id: bm.id });

        prop_assert_eq!(merged, without);
    }

    // For any two distinct records, the later add sits in front: newest first.
    #[test]
    fn later_adds_are_prepended(list in arb_list(), a in arb_bookmark(), b in arb_bookmark()) {
        prop_assume!(a.id != b.id);
        let mut merged = list;
        merged.retain(|existing| existing.id != a.id && existing.id != b.id);

        apply_event(&mut merged, &BookmarkEvent::Added { bookmark: a.clone() });
        apply_event(&mut merged, &BookmarkEvent::Added { bookmark: b.clone() });

        prop_assert_eq!(merged[0].id.as_str(), b.id.as_str());
        prop_assert_eq!(merged[1].id.as_str(), a.id.as_str());
    }

    // For any event sequence applied to an empty list, identifiers stay
    // unique and entries that survive an event keep their relative order.
    #[test]
    fn any_event_sequence_keeps_ids_unique(
        events in prop::collection::vec(arb_event(), 0..24),
    ) {
        let mut merged: Vec<Bookmark> = Vec::new();

        for event in &events {
            let before: Vec<String> = merged.iter().map(|bm| bm.id.clone()).collect();
            apply_event(&mut merged, event);

            let mut seen = std::collections::HashSet::new();
            prop_assert!(
                merged.iter().all(|bm| seen.insert(bm.id.as_str())),
                "duplicate id after {:?}",
                event
            );

            let kept: Vec<&str> = ids(&merged)
                .into_iter()
                .filter(|id| before.iter().any(|b| b == id))
                .collect();
            let expected: Vec<&str> = before
                .iter()
                .map(|id| id.as_str())
                .filter(|id| merged.iter().any(|bm| bm.id == *id))
                .collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
