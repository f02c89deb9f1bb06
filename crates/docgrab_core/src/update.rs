use crate::{Effect, Event, Msg, QueuePhase, QueueState};

/// Pure update function: applies a message to state and returns any effects.
///
/// At most one `FetchItem` is outstanding at any time, and messages tagged
/// with a batch other than the current one are ignored.
pub fn update(mut state: QueueState, msg: Msg) -> (QueueState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::StartBatch {
            items,
            total_count,
            started_at,
        } => {
            state.begin_batch(items, total_count, started_at);
            step(&mut state, &mut effects);
        }
        Msg::Pause { at } => {
            if state.phase() == QueuePhase::Running {
                state.pause(at);
                effects.push(Effect::Notify(Event::PauseDownloadUi));
            }
        }
        Msg::Resume { at } => {
            if state.phase() == QueuePhase::Paused {
                state.resume(at);
                effects.push(Effect::Notify(Event::ResumeDownloadUi));
                // An in-flight item or a pending timer will continue the loop itself.
                if !state.in_flight() && !state.step_scheduled() {
                    step(&mut state, &mut effects);
                }
            }
        }
        Msg::Cancel => state.reset(),
        Msg::StepDue { batch } => {
            if state.is_current(batch) && state.step_scheduled() {
                state.set_step_scheduled(false);
                step(&mut state, &mut effects);
            }
        }
        Msg::ItemFinished { batch, success: _ } => {
            // A failed item advances like a successful one.
            if state.is_current(batch) && state.in_flight() {
                state.set_in_flight(false);
                state.advance();
                effects.push(progress(&state));
                if state.is_exhausted() {
                    complete(&mut state, &mut effects);
                } else if !state.is_paused() {
                    state.set_step_scheduled(true);
                    effects.push(Effect::ScheduleStep {
                        batch,
                        delay_ms: state.inter_item_delay_ms(),
                    });
                }
            }
        }
    }

    (state, effects)
}

fn step(state: &mut QueueState, effects: &mut Vec<Effect>) {
    if state.is_exhausted() {
        complete(state, effects);
        return;
    }
    if state.is_paused() {
        return;
    }
    let Some(document) = state.current_item().cloned() else {
        return;
    };
    effects.push(progress(state));
    state.set_in_flight(true);
    effects.push(Effect::FetchItem {
        batch: state.batch(),
        index: state.cursor(),
        document,
    });
}

fn complete(state: &mut QueueState, effects: &mut Vec<Effect>) {
    effects.push(Effect::Notify(Event::batch_complete(state.cursor())));
    state.reset();
}

fn progress(state: &QueueState) -> Effect {
    Effect::Notify(Event::progress(
        state.cursor(),
        state.total_count(),
        state.remaining_time_ms(),
    ))
}
