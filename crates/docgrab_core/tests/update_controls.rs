use docgrab_core::{update, DocumentRef, Effect, Event, Msg, QueuePhase, QueueState};
use pretty_assertions::assert_eq;

fn three_docs() -> Vec<DocumentRef> {
    vec![
        DocumentRef::new("a", "A"),
        DocumentRef::new("b", "B"),
        DocumentRef::new("c", "C"),
    ]
}

fn started(items: Vec<DocumentRef>) -> QueueState {
    let (state, _) = update(
        QueueState::new(),
        Msg::StartBatch {
            items,
            total_count: None,
            started_at: 1_000,
        },
    );
    state
}

fn fetch_ids(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::FetchItem { document, .. } => Some(document.id.clone()),
            _ => None,
        })
        .collect()
}

fn finish(state: QueueState) -> (QueueState, Vec<Effect>) {
    let batch = state.batch();
    update(
        state,
        Msg::ItemFinished {
            batch,
            success: true,
        },
    )
}

#[test]
fn pause_while_in_flight_lets_item_finish_then_stops() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());

    let (state, effects) = update(state, Msg::Pause { at: 1_100 });
    assert_eq!(effects, vec![Effect::Notify(Event::PauseDownloadUi)]);
    assert_eq!(state.phase(), QueuePhase::Paused);

    // Item 0 still completes and reports, but nothing new is started.
    let (state, effects) = finish(state);
    assert_eq!(effects, vec![Effect::Notify(Event::progress(1, 3, 1000))]);
    assert_eq!(state.cursor(), 1);
    assert_eq!(state.phase(), QueuePhase::Paused);
}

#[test]
fn resume_continues_at_next_item() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());
    let (state, _) = update(state, Msg::Pause { at: 1_100 });
    let (state, _) = finish(state);

    let (state, effects) = update(state, Msg::Resume { at: 1_600 });
    assert_eq!(
        effects[..2],
        [
            Effect::Notify(Event::ResumeDownloadUi),
            Effect::Notify(Event::progress(1, 3, 1000)),
        ]
    );
    assert_eq!(fetch_ids(&effects), vec!["b"]);
    assert_eq!(state.phase(), QueuePhase::Running);
}

#[test]
fn resume_while_in_flight_does_not_start_second_fetch() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());
    let (state, _) = update(state, Msg::Pause { at: 1_100 });

    let (state, effects) = update(state, Msg::Resume { at: 1_200 });
    assert_eq!(effects, vec![Effect::Notify(Event::ResumeDownloadUi)]);

    // The in-flight item drives the loop on.
    let (_, effects) = finish(state);
    assert!(matches!(effects.last(), Some(Effect::ScheduleStep { .. })));
}

#[test]
fn pause_and_resume_during_delay_keep_single_loop() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());
    let (state, effects) = finish(state);
    let batch = state.batch();
    assert!(matches!(effects.last(), Some(Effect::ScheduleStep { .. })));

    let (state, _) = update(state, Msg::Pause { at: 1_300 });
    let (state, effects) = update(state, Msg::Resume { at: 1_350 });
    assert_eq!(fetch_ids(&effects), Vec::<String>::new());

    let (state, effects) = update(state, Msg::StepDue { batch });
    assert_eq!(fetch_ids(&effects), vec!["b"]);

    // A duplicate timer firing is ignored.
    let (_, effects) = update(state, Msg::StepDue { batch });
    assert!(effects.is_empty());
}

#[test]
fn step_due_while_paused_waits_for_resume() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());
    let (state, _) = finish(state);
    let batch = state.batch();
    let (state, _) = update(state, Msg::Pause { at: 1_300 });

    let (state, effects) = update(state, Msg::StepDue { batch });
    assert!(effects.is_empty());

    let (_, effects) = update(state, Msg::Resume { at: 2_000 });
    assert_eq!(fetch_ids(&effects), vec!["b"]);
}

#[test]
fn last_item_finishing_while_paused_completes_batch() {
    engine_logging::initialize_for_tests();
    let state = started(vec![DocumentRef::new("a", "A")]);
    let (state, _) = update(state, Msg::Pause { at: 1_100 });

    let (state, effects) = finish(state);
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Event::progress(1, 1, 0)),
            Effect::Notify(Event::batch_complete(1)),
        ]
    );
    assert_eq!(state.phase(), QueuePhase::Idle);
}

#[test]
fn pause_and_resume_require_matching_phase() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());

    let (state, effects) = update(state, Msg::Resume { at: 1_050 });
    assert!(effects.is_empty());
    assert_eq!(state.phase(), QueuePhase::Running);

    let (state, _) = update(state, Msg::Pause { at: 1_100 });
    let (state, effects) = update(state, Msg::Pause { at: 1_200 });
    assert!(effects.is_empty());
    assert_eq!(state.phase(), QueuePhase::Paused);
}

#[test]
fn cancel_mid_batch_resets_everything_silently() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());
    let (state, _) = finish(state);
    let old_batch = state.batch();

    let (state, effects) = update(state, Msg::Cancel);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), QueuePhase::Idle);
    assert_eq!(state.cursor(), 0);
    assert!(state.items().is_empty());

    // The pending timer of the cancelled batch is stale.
    let (state, effects) = update(state, Msg::StepDue { batch: old_batch });
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::StartBatch {
            items: vec![DocumentRef::new("z", "Z")],
            total_count: None,
            started_at: 5_000,
        },
    );
    assert_eq!(state.cursor(), 0);
    assert_eq!(fetch_ids(&effects), vec!["z"]);
}

#[test]
fn active_elapsed_excludes_pauses() {
    engine_logging::initialize_for_tests();
    let state = started(three_docs());
    assert_eq!(state.active_elapsed_ms(1_400), 400);

    let (state, _) = update(state, Msg::Pause { at: 1_500 });
    assert_eq!(state.active_elapsed_ms(9_000), 500);

    let (state, _) = update(state, Msg::Resume { at: 2_500 });
    let view = state.view(3_000);
    assert_eq!(view.active_elapsed_ms, 1_000);
    assert_eq!(view.items.get(view.cursor), Some(&DocumentRef::new("a", "A")));
    assert_eq!(view.remaining_time_ms, 4_500);
}
