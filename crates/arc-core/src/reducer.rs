use tracing::debug;
use tracing::info;
use tracing::warn;

use super::actions::filtered_suggestion_indices;
use super::actions::ArcAction;
use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::actions::MOCK_VOICE_COMMAND;
use super::actions::SUGGESTIONS;
use super::classifier::classify;
use super::classifier::Classification;
use super::sequencer::SequencerEvent;
use super::state::ApprovalDecisionKind;
use super::state::ApprovalDecisionRecord;
use super::state::ApprovalRequest;
use super::state::ApprovedAction;
use super::state::ArcState;
use super::state::Notice;
use super::state::View;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArcEffect {
    RequestFrame,
    Notify(Notice),
    StartExecution { run_id: u64, command: String },
    CopyToClipboard(String),
    Quit,
}

pub fn reduce(state: &mut ArcState, action: ArcAction) -> Vec<ArcEffect> {
    match action {
        ArcAction::User(user) => reduce_user(state, user),
        ArcAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut ArcState, action: UserAction) -> Vec<ArcEffect> {
    match action {
        UserAction::InputChar(ch) => {
            state.input.text.push(ch);
            state.input.reset_suggestions();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::InputBackspace => {
            state.input.text.pop();
            state.input.reset_suggestions();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::InputPaste(text) => {
            state.input.text.push_str(&text);
            state.input.reset_suggestions();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::ClearInput => {
            state.input.clear();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::SubmitInput => submit_input(state),
        UserAction::NextSuggestion => cycle_suggestion(state, true),
        UserAction::PrevSuggestion => cycle_suggestion(state, false),
        UserAction::ToggleVoice => toggle_voice(state),
        UserAction::SelectView(view) => {
            state.view = view;
            vec![ArcEffect::RequestFrame]
        }
        UserAction::NextView => {
            state.view = state.view.next();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::PrevView => {
            state.view = state.view.prev();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::ReturnToDashboard => {
            state.view = View::Dashboard;
            vec![ArcEffect::RequestFrame]
        }
        UserAction::StartScan => {
            if state.approval.start_scan() {
                debug!(session = state.approval.session(), "biometric scan started");
                return vec![ArcEffect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::CloseApproval => {
            let Some(request) = state.approval.close() else {
                return Vec::new();
            };
            info!(request_id = %request.request_id, "governance request cancelled");
            record_decision(state, &request, ApprovalDecisionKind::Cancelled);
            vec![ArcEffect::RequestFrame]
        }
        UserAction::DismissNotices => {
            state.notices.clear();
            vec![ArcEffect::RequestFrame]
        }
        UserAction::CopyExecutionLog => {
            let log = state.execution.log();
            if log.is_empty() {
                return vec![
                    notify(state, Notice::info("No execution log to copy")),
                    ArcEffect::RequestFrame,
                ];
            }
            vec![
                ArcEffect::CopyToClipboard(log.to_text()),
                ArcEffect::RequestFrame,
            ]
        }
        UserAction::Quit => vec![ArcEffect::Quit],
    }
}

fn submit_input(state: &mut ArcState) -> Vec<ArcEffect> {
    if state.approval.is_open() {
        debug!("ignoring submit while the approval gate is open");
        return Vec::new();
    }
    if state.execution.is_busy() {
        debug!("ignoring submit while a command is executing");
        return Vec::new();
    }

    let Some(classification) = classify(&state.input.text) else {
        return Vec::new();
    };
    debug!(?classification, "command classified");

    match classification {
        Classification::Navigate { view } => {
            state.view = view;
            state.input.clear();
            vec![ArcEffect::RequestFrame]
        }
        Classification::Notice { level, message } => {
            state.input.clear();
            vec![
                notify(state, Notice::new(level, message)),
                ArcEffect::RequestFrame,
            ]
        }
        Classification::Governance { command, impact } => {
            let request = state.approval.open(command, impact);
            info!(
                request_id = %request.request_id,
                category = request.impact.category,
                value = request.impact.value,
                risk = request.impact.risk.label(),
                "governance approval required"
            );
            state.input.clear();
            vec![ArcEffect::RequestFrame]
        }
        Classification::Execute { command } => {
            let mut effects = start_execution(state, command);
            effects.push(ArcEffect::RequestFrame);
            effects
        }
    }
}

fn start_execution(state: &mut ArcState, command: String) -> Vec<ArcEffect> {
    match state.execution.queue(command.clone()) {
        Some(run_id) => {
            info!(run_id, command = %command, "execution queued");
            vec![ArcEffect::StartExecution { run_id, command }]
        }
        None => {
            warn!(command = %command, "execution already in progress; dropping command");
            Vec::new()
        }
    }
}

fn cycle_suggestion(state: &mut ArcState, forward: bool) -> Vec<ArcEffect> {
    let query = state
        .input
        .suggestion_query
        .get_or_insert_with(|| state.input.text.clone())
        .clone();
    let filtered = filtered_suggestion_indices(&query);
    if filtered.is_empty() {
        return Vec::new();
    }

    let len = filtered.len();
    let cursor = match (state.input.suggestion_cursor, forward) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(current), true) => (current + 1) % len,
        (Some(current), false) => (current + len - 1) % len,
    };
    state.input.suggestion_cursor = Some(cursor);
    state.input.text = SUGGESTIONS[filtered[cursor]].to_string();
    vec![ArcEffect::RequestFrame]
}

fn toggle_voice(state: &mut ArcState) -> Vec<ArcEffect> {
    if !state.voice.available {
        return vec![
            notify(
                state,
                Notice::error("Speech recognition not supported in this terminal."),
            ),
            ArcEffect::RequestFrame,
        ];
    }

    if state.voice.listening {
        state.voice.listening = false;
        state.voice.elapsed_ms = 0;
        return vec![ArcEffect::RequestFrame];
    }

    state.voice.listening = true;
    state.voice.elapsed_ms = 0;
    let ttl = state.config.voice.listening_notice_ms;
    vec![
        notify(state, Notice::info("ARC listening...").with_ttl(ttl)),
        ArcEffect::RequestFrame,
    ]
}

fn reduce_runtime(state: &mut ArcState, action: RuntimeAction) -> Vec<ArcEffect> {
    match action {
        RuntimeAction::Tick { elapsed_ms } => tick(state, elapsed_ms),
        RuntimeAction::SetSpeechAvailable(available) => {
            state.voice.available = available;
            if !available {
                state.voice.listening = false;
                state.voice.elapsed_ms = 0;
            }
            Vec::new()
        }
        RuntimeAction::BeginExecution(run) => {
            let events = state.execution.begin(run);
            let mut effects = apply_sequencer_events(state, events);
            effects.push(ArcEffect::RequestFrame);
            effects
        }
        RuntimeAction::RejectBiometric { reason } => {
            if !state.approval.reject() {
                return Vec::new();
            }
            if let Some(request) = state.approval.request().cloned() {
                warn!(request_id = %request.request_id, %reason, "biometric verification rejected");
                record_decision(state, &request, ApprovalDecisionKind::Rejected);
            }
            vec![
                notify(state, Notice::error("Biometric verification failed").with_description(reason)),
                ArcEffect::RequestFrame,
            ]
        }
        RuntimeAction::Notify(notice) => vec![notify(state, notice)],
    }
}

fn tick(state: &mut ArcState, elapsed_ms: u64) -> Vec<ArcEffect> {
    if elapsed_ms == 0 {
        return Vec::new();
    }
    state.clock_ms = state.clock_ms.saturating_add(elapsed_ms);
    state.notices.expire(elapsed_ms);

    let mut effects = Vec::new();

    if state.voice.listening {
        state.voice.elapsed_ms = state.voice.elapsed_ms.saturating_add(elapsed_ms);
        if state.voice.elapsed_ms >= state.config.voice.mock_delay_ms {
            state.voice.listening = false;
            state.voice.elapsed_ms = 0;
            state.input.text = MOCK_VOICE_COMMAND.to_string();
            state.input.reset_suggestions();
            effects.push(notify(
                state,
                Notice::success(format!("Command recognized: {MOCK_VOICE_COMMAND}")),
            ));
        }
    }

    let gate_timing = state.config.gate.clone();
    if let Some(request) = state.approval.advance(elapsed_ms, &gate_timing) {
        effects.extend(approve(state, request));
    }

    let execution_timing = state.config.execution.clone();
    let events = state.execution.advance(elapsed_ms, &execution_timing);
    effects.extend(apply_sequencer_events(state, events));

    if !effects.is_empty() || state.has_pending_timers() {
        effects.push(ArcEffect::RequestFrame);
    }
    effects
}

fn approve(state: &mut ArcState, request: ApprovalRequest) -> Vec<ArcEffect> {
    info!(request_id = %request.request_id, "governance request approved");
    record_decision(state, &request, ApprovalDecisionKind::Approved);
    match request.on_approve {
        ApprovedAction::Execute { command } => start_execution(state, command),
    }
}

fn apply_sequencer_events(state: &mut ArcState, events: Vec<SequencerEvent>) -> Vec<ArcEffect> {
    let mut effects = Vec::new();
    for event in events {
        match event {
            SequencerEvent::LineAppended(line) => {
                debug!(%line, "execution step");
            }
            SequencerEvent::Completed(notice) => {
                effects.push(notify(state, notice));
            }
            SequencerEvent::Reset => {
                state.input.clear();
            }
        }
    }
    effects
}

fn record_decision(state: &mut ArcState, request: &ApprovalRequest, decision: ApprovalDecisionKind) {
    state.last_decision = Some(ApprovalDecisionRecord {
        request_id: request.request_id.clone(),
        command: request.command.clone(),
        decision,
        at_ms: state.clock_ms,
    });
}

fn notify(state: &mut ArcState, notice: Notice) -> ArcEffect {
    state.notices.post(notice.clone());
    ArcEffect::Notify(notice)
}

#[cfg(test)]
mod tests;
