use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::ArcEffect;
pub(super) use crate::actions::ArcAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::Config;
pub(super) use crate::sequencer::ExecutionPhase;
pub(super) use crate::sequencer::ExecutionRun;
pub(super) use crate::state::ApprovalDecisionKind;
pub(super) use crate::state::ArcState;
pub(super) use crate::state::GateStatus;
pub(super) use crate::state::Notice;
pub(super) use crate::state::NoticeLevel;
pub(super) use crate::state::RiskLevel;
pub(super) use crate::state::View;

mod governance_gate;

const PREAMBLE: [&str; 3] = [
    "Initializing ARC Nexus...",
    "Authenticating with Odoo ERP...",
    "Analyzing command parameters...",
];

const STEPS: [&str; 5] = [
    "Accessing database records...",
    "Cross-referencing departmental dependencies...",
    "Applying autonomous business-as-code logic...",
    "Updating system state in real-time...",
    "Command Executed Successfully.",
];

fn state() -> ArcState {
    ArcState::new(Config::default())
}

fn user(state: &mut ArcState, action: UserAction) -> Vec<ArcEffect> {
    reduce(state, ArcAction::User(action))
}

fn runtime(state: &mut ArcState, action: RuntimeAction) -> Vec<ArcEffect> {
    reduce(state, ArcAction::Runtime(action))
}

fn submit(state: &mut ArcState, text: &str) -> Vec<ArcEffect> {
    user(state, UserAction::InputPaste(text.to_string()));
    user(state, UserAction::SubmitInput)
}

fn tick(state: &mut ArcState, elapsed_ms: u64) -> Vec<ArcEffect> {
    runtime(state, RuntimeAction::Tick { elapsed_ms })
}

fn narrative_run(run_id: u64, command: &str) -> ExecutionRun {
    ExecutionRun {
        run_id,
        command: command.to_string(),
        preamble: PREAMBLE.iter().map(|line| line.to_string()).collect(),
        steps: STEPS.iter().map(|line| line.to_string()).collect(),
        completion: Notice::success(format!("ARC executed command: {command}"))
            .with_description("Autonomous ledger updates completed."),
    }
}

fn started_execution(effects: &[ArcEffect]) -> Option<(u64, String)> {
    effects.iter().find_map(|effect| match effect {
        ArcEffect::StartExecution { run_id, command } => Some((*run_id, command.clone())),
        _ => None,
    })
}

/// Plays the host side of `StartExecution`, as the CLI driver does.
fn host_begin(state: &mut ArcState, effects: &[ArcEffect]) -> Option<u64> {
    let (run_id, command) = started_execution(effects)?;
    runtime(
        state,
        RuntimeAction::BeginExecution(narrative_run(run_id, &command)),
    );
    Some(run_id)
}

fn notices(effects: &[ArcEffect]) -> Vec<Notice> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            ArcEffect::Notify(notice) => Some(notice.clone()),
            _ => None,
        })
        .collect()
}

fn log_lines(state: &ArcState) -> Vec<String> {
    state
        .execution
        .log()
        .iter()
        .map(|line| line.text.clone())
        .collect()
}

#[test]
fn fresh_state_is_input_ready_on_dashboard() {
    let state = state();
    assert_eq!(state.view, View::Dashboard);
    assert_eq!(state.approval.status(), GateStatus::Idle);
    assert!(!state.approval.is_open());
    assert_eq!(state.execution.phase(), &ExecutionPhase::Ready);
    assert!(!state.has_pending_timers());
}
