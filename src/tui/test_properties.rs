//! Property-based tests for key decoding, focus locking, description tags
//! and pull reconciliation.
//!
//! Uses `proptest` to drive arbitrary byte chunks, lock states, key
//! sequences and out-of-order pull replies through the pure layers and
//! checks the invariants the runtime relies on.

use proptest::prelude::*;

use super::focus::{FocusLock, LockState, Row};
use super::keys::{KeyEvent, decode, split_chunk};
use super::model::{AppModel, Cmd, ModelSettings, Msg, TogglePurpose};
use super::picker::SearchTarget;
use super::update;
use crate::tracking::reconcile::{PullOutcome, ReconcileState};
use crate::tracking::session::fixtures::{running, session};
use crate::tracking::session::{SessionId, SessionList, TrackingSession};
use crate::tracking::timecode::{decode_offset, encode_offset, parse_timestamp};

// ──────────────────── strategies ────────────────────

fn arb_flag() -> impl Strategy<Value = Option<bool>> {
    prop_oneof![Just(None), Just(Some(false)), Just(Some(true))]
}

fn arb_lock_state() -> impl Strategy<Value = LockState> {
    (
        arb_flag(),
        arb_flag(),
        arb_flag(),
        arb_flag(),
        arb_flag(),
        arb_flag(),
        arb_flag(),
    )
        .prop_map(|(all, x, y, left_arrow, right_arrow, up_arrow, down_arrow)| LockState {
            all,
            x,
            y,
            left_arrow,
            right_arrow,
            up_arrow,
            down_arrow,
        })
}

/// Key chunks a user can produce in the tracker list, minus ctrl+c.
fn arb_key_chunk() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(b"\x1b[A".to_vec()),
        Just(b"\x1b[B".to_vec()),
        Just(b"\x1b[C".to_vec()),
        Just(b"\x1b[D".to_vec()),
        Just(b"\r".to_vec()),
        Just(b" ".to_vec()),
        Just(b"\x1b".to_vec()),
        Just(b"\x7f".to_vec()),
        Just(b"1".to_vec()),
        Just(b"m".to_vec()),
        Just(b"a".to_vec()),
        Just(b"-".to_vec()),
    ]
}

fn arb_created() -> impl Strategy<Value = String> {
    prop_oneof![
        (0_u32..24, 0_u32..60).prop_map(|(h, m)| format!("2024-03-01T{h:02}:{m:02}:00.000")),
        Just("garbage".to_string()),
        Just(String::new()),
    ]
}

fn arb_sessions() -> impl Strategy<Value = Vec<TrackingSession>> {
    prop::collection::vec((0_u8..8, arb_created(), any::<bool>()), 0..8).prop_map(|rows| {
        rows.into_iter()
            .map(|(id, created, playing)| {
                if playing {
                    running(&format!("s{id}"), &created, Some("ABC-1"))
                } else {
                    session(&format!("s{id}"), &created)
                }
            })
            .collect()
    })
}

// ──────────────────── helpers ────────────────────

fn loaded(sessions: Vec<TrackingSession>) -> AppModel {
    let mut model = AppModel::new(ModelSettings::default(), 0);
    let cmd = update::init(&mut model);
    let generation = cmd
        .into_vec()
        .into_iter()
        .find_map(|cmd| match cmd {
            Cmd::Pull { generation } => Some(generation),
            _ => None,
        })
        .unwrap();
    update::update(
        &mut model,
        Msg::Pulled {
            generation,
            result: Ok(sessions),
        },
    );
    model
}

fn assert_model_invariants(model: &AppModel) -> Result<(), TestCaseError> {
    let sessions = model.sessions();
    prop_assert!(model.tracking.selected() <= sessions.len());
    for id in model.busy.keys() {
        prop_assert!(sessions.contains(id), "busy marker for missing {id}");
    }

    let mut refreshed = model.clone();
    refreshed.refresh_lock();
    prop_assert_eq!(refreshed.lock, model.lock);

    if let Some(picker) = model.picker.as_ref() {
        match picker.target() {
            SearchTarget::NewTimer => prop_assert!(model.tracking.is_new_row_selected()),
            SearchTarget::Session(id) => {
                let selected = model.tracking.selected_id();
                prop_assert_eq!(selected.as_ref(), Some(id));
                prop_assert_eq!(model.row, Row::ChangeIssue);
            }
        }
    }
    Ok(())
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Decoding never panics and control sequences carry no text.
    #[test]
    fn decode_is_total(bytes in prop::collection::vec(any::<u8>(), 0..16)) {
        let event = decode(&bytes);
        let flags = [
            event.up_arrow,
            event.down_arrow,
            event.left_arrow,
            event.right_arrow,
            event.enter,
            event.escape,
        ];
        let set = flags.iter().filter(|flag| **flag).count();
        prop_assert!(set <= 1);
        if set == 1 {
            prop_assert!(event.character.is_empty());
            prop_assert!(!event.ctrl && !event.meta);
        }
    }

    /// Splitting never loses or reorders bytes.
    #[test]
    fn split_chunk_preserves_bytes(bytes in prop::collection::vec(any::<u8>(), 0..24)) {
        let joined: Vec<u8> = split_chunk(&bytes).concat();
        prop_assert_eq!(joined, bytes);
    }

    /// Coalesced arrows split into one event per press.
    #[test]
    fn coalesced_arrows_split_per_press(presses in prop::collection::vec(0_usize..4, 2..10)) {
        const ARROWS: [&[u8]; 4] = [b"\x1b[A", b"\x1b[B", b"\x1b[C", b"\x1b[D"];
        let chunk: Vec<u8> = presses.iter().flat_map(|i| ARROWS[*i].to_vec()).collect();
        let parts = split_chunk(&chunk);
        prop_assert_eq!(parts.len(), presses.len());
        for (part, index) in parts.iter().zip(&presses) {
            prop_assert_eq!(*part, ARROWS[*index]);
        }
    }

    /// `set_lock` replaces the whole state; nothing from the previous one leaks.
    #[test]
    fn set_lock_replaces(first in arb_lock_state(), second in arb_lock_state()) {
        let mut lock = FocusLock::default();
        lock.set_lock(first);
        lock.set_lock(second);
        prop_assert_eq!(lock.state(), second);

        let mut fresh = FocusLock::default();
        fresh.set_lock(second);
        for bytes in [b"\x1b[A", b"\x1b[B", b"\x1b[C", b"\x1b[D"] {
            let event = decode(bytes);
            prop_assert_eq!(lock.blocks_event(&event), fresh.blocks_event(&event));
        }
    }

    /// Encoding an offset into free text decodes back to that offset.
    #[test]
    fn offset_tag_round_trips(text in "[a-zA-Z0-9 .,\n]{0,40}", offset in -1_000_000_000_i64..1_000_000_000) {
        let encoded = encode_offset(Some(text.as_str()), offset);
        prop_assert_eq!(decode_offset(encoded.as_deref()), offset);
        if let Some(encoded) = encoded.as_deref() {
            prop_assert!(encoded.matches("cleevio-tempo-cli:").count() <= 1);
        }
    }

    /// Rebuilt lists are sorted by creation time with unique ids.
    #[test]
    fn session_list_sorted_and_unique(sessions in arb_sessions()) {
        let list = SessionList::from_unsorted(sessions);
        let created: Vec<i64> = list.iter().map(TrackingSession::created_at_ms).collect();
        prop_assert!(created.windows(2).all(|pair| pair[0] <= pair[1]));
        let mut ids: Vec<&SessionId> = list.iter().map(|s| &s.id).collect();
        let total = ids.len();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
        for session in list.iter() {
            if parse_timestamp(&session.created_date).is_none() {
                prop_assert_eq!(session.created_at_ms(), 0);
            }
        }
    }

    /// Replies arriving in any order leave the newest generation's list.
    #[test]
    fn pulls_apply_in_generation_order(
        order in Just((0_usize..5).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let mut state = ReconcileState::new();
        let mut generations = vec![state.start().generation];
        for _ in 1..5 {
            generations.push(state.begin_pull());
        }

        let mut applied_max = 0;
        for index in order {
            let generation = generations[index];
            let reply = vec![session(&format!("g{generation}"), "2024-03-01T08:00:00.000")];
            let outcome = state.apply_pull(generation, Ok(reply));
            if generation > applied_max {
                prop_assert_eq!(outcome, PullOutcome::Applied(1));
                applied_max = generation;
            } else {
                prop_assert_eq!(outcome, PullOutcome::Stale);
            }
        }
        let newest = format!("g{}", generations[4]);
        prop_assert_eq!(state.sessions().as_slice().first().map(|s| s.id.as_str()), Some(newest.as_str()));
    }

    /// Arbitrary key sequences keep selection, busy markers, lock and picker
    /// consistent with the list.
    #[test]
    fn key_sequences_preserve_invariants(
        sessions in arb_sessions(),
        keys in prop::collection::vec(arb_key_chunk(), 1..60)
    ) {
        let mut model = loaded(sessions);
        assert_model_invariants(&model)?;
        for chunk in keys {
            update::update(&mut model, Msg::Key(decode(&chunk)));
            assert_model_invariants(&model)?;
            prop_assert!(!model.quit);
        }
    }

    /// A busy tracker never issues a second toggle, whatever is pressed.
    #[test]
    fn busy_tracker_ignores_reactivation(keys in prop::collection::vec(
        prop_oneof![Just(b"\r".to_vec()), Just(b" ".to_vec()), Just(b"x".to_vec())],
        1..20,
    )) {
        let mut model = loaded(vec![running("a", "2024-03-01T08:00:00.000", Some("ABC-1"))]);
        let first = update::update(&mut model, Msg::Key(decode(b"\r"))).into_vec();
        prop_assert_eq!(first.len(), 1);
        for chunk in keys {
            let cmds = update::update(&mut model, Msg::Key(KeyEvent::text(&String::from_utf8_lossy(&chunk))));
            let plays = cmds.into_vec().iter().any(|cmd| matches!(
                cmd,
                Cmd::Toggle { purpose: TogglePurpose::Play, .. }
            ));
            prop_assert!(!plays);
        }
    }
}
