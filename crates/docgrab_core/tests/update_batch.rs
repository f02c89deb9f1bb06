use std::collections::VecDeque;
use std::sync::Once;

use docgrab_core::{update, DocumentRef, Effect, Event, Msg, QueuePhase, QueueState};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn docs(names: &[(&str, &str)]) -> Vec<DocumentRef> {
    names
        .iter()
        .map(|(id, name)| DocumentRef::new(*id, *name))
        .collect()
}

fn start(items: Vec<DocumentRef>, total_count: Option<usize>) -> Msg {
    Msg::StartBatch {
        items,
        total_count,
        started_at: 1_000,
    }
}

/// Feeds every effect back into `update` the way the engine driver would,
/// answering fetches with `outcome(id)`, until nothing is left to do.
fn run_to_idle(
    mut state: QueueState,
    first: Msg,
    outcome: impl Fn(&str) -> bool,
) -> (QueueState, Vec<Event>, Vec<String>) {
    let mut events = Vec::new();
    let mut fetched = Vec::new();
    let mut inbox = VecDeque::from([first]);
    while let Some(msg) = inbox.pop_front() {
        let (next, effects) = update(state, msg);
        state = next;
        for effect in effects {
            match effect {
                Effect::Notify(event) => events.push(event),
                Effect::FetchItem {
                    batch, document, ..
                } => {
                    let success = outcome(&document.id);
                    fetched.push(document.id);
                    inbox.push_back(Msg::ItemFinished { batch, success });
                }
                Effect::ScheduleStep { batch, .. } => inbox.push_back(Msg::StepDue { batch }),
            }
        }
    }
    (state, events, fetched)
}

#[test]
fn two_item_batch_reports_progress_and_completes() {
    init_logging();
    let items = docs(&[("a", "Doc A"), ("b", "Doc/B")]);

    let (state, events, fetched) = run_to_idle(QueueState::new(), start(items, Some(2)), |_| true);

    assert_eq!(fetched, vec!["a", "b"]);
    assert_eq!(
        events,
        vec![
            Event::progress(0, 2, 3000),
            Event::progress(1, 2, 500),
            Event::progress(1, 2, 500),
            Event::progress(2, 2, 0),
            Event::batch_complete(2),
        ]
    );
    assert_eq!(state.phase(), QueuePhase::Idle);
    assert_eq!(state.cursor(), 0);
    assert!(state.items().is_empty());
}

#[test]
fn every_item_is_fetched_once_in_order() {
    init_logging();
    let ids: Vec<String> = (0..25).map(|n| format!("doc-{n}")).collect();
    let items = ids
        .iter()
        .map(|id| DocumentRef::new(id.clone(), format!("Name {id}")))
        .collect();

    let (_, events, fetched) = run_to_idle(QueueState::new(), start(items, None), |_| true);

    assert_eq!(fetched, ids);
    assert_eq!(events.last(), Some(&Event::batch_complete(25)));
}

#[test]
fn failed_item_still_advances_without_error_event() {
    init_logging();
    let items = docs(&[("a", "Doc A"), ("b", "Doc B")]);

    let (_, events, fetched) = run_to_idle(QueueState::new(), start(items, Some(2)), |id| id != "b");

    assert_eq!(fetched, vec!["a", "b"]);
    assert_eq!(events.last(), Some(&Event::batch_complete(2)));
    assert!(events
        .iter()
        .all(|event| !matches!(event, Event::Error { .. })));
}

#[test]
fn empty_batch_completes_immediately() {
    init_logging();
    let (state, effects) = update(QueueState::new(), start(Vec::new(), None));

    assert_eq!(effects, vec![Effect::Notify(Event::batch_complete(0))]);
    assert_eq!(state.phase(), QueuePhase::Idle);
}

#[test]
fn zero_total_falls_back_to_item_count() {
    init_logging();
    let (state, effects) = update(
        QueueState::new(),
        start(docs(&[("a", "A"), ("b", "B"), ("c", "C")]), Some(0)),
    );

    assert_eq!(state.total_count(), 3);
    assert_eq!(effects[0], Effect::Notify(Event::progress(0, 3, 4500)));
}

#[test]
fn overstated_total_is_reported_as_given() {
    init_logging();
    let (_, events, _) = run_to_idle(
        QueueState::new(),
        start(docs(&[("a", "A")]), Some(4)),
        |_| true,
    );

    assert_eq!(
        events,
        vec![
            Event::progress(0, 4, 6000),
            Event::progress(1, 4, 1500),
            Event::batch_complete(1),
        ]
    );
}

#[test]
fn inter_item_delay_is_carried_on_schedule_effect() {
    init_logging();
    let state = QueueState::with_inter_item_delay(40);
    let (state, effects) = update(state, start(docs(&[("a", "A"), ("b", "B")]), None));
    let batch = state.batch();
    assert!(matches!(effects.last(), Some(Effect::FetchItem { index: 0, .. })));

    let (_, effects) = update(
        state,
        Msg::ItemFinished {
            batch,
            success: true,
        },
    );
    assert_eq!(
        effects.last(),
        Some(&Effect::ScheduleStep { batch, delay_ms: 40 })
    );
}

#[test]
fn restart_discards_previous_batch() {
    init_logging();
    let (state, _) = update(
        QueueState::new(),
        start(docs(&[("a", "A"), ("b", "B"), ("c", "C")]), None),
    );
    let old_batch = state.batch();

    let (state, effects) = update(state, start(docs(&[("x", "X")]), None));
    assert_ne!(state.batch(), old_batch);
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.items(), docs(&[("x", "X")]).as_slice());
    assert!(matches!(
        effects.last(),
        Some(Effect::FetchItem { document, .. }) if document.id == "x"
    ));

    // The late result of the old batch's in-flight fetch changes nothing.
    let (after, effects) = update(
        state.clone(),
        Msg::ItemFinished {
            batch: old_batch,
            success: true,
        },
    );
    assert_eq!(after, state);
    assert!(effects.is_empty());
}

#[test]
fn huge_reported_total_saturates_estimate() {
    init_logging();
    let (state, events, fetched) = run_to_idle(
        QueueState::new(),
        start(docs(&[("a", "A")]), Some(usize::MAX)),
        |_| true,
    );

    assert_eq!(fetched, vec!["a"]);
    assert_eq!(
        events,
        vec![
            Event::progress(0, usize::MAX, u64::MAX),
            Event::progress(1, usize::MAX, u64::MAX),
            Event::batch_complete(1),
        ]
    );
    assert_eq!(state.phase(), QueuePhase::Idle);
}
