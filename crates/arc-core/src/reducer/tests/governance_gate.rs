use super::*;
use pretty_assertions::assert_eq;

const FEE_COMMAND: &str = "Have Collections offer Raffoul 6 months, waive fees";

fn opened_state() -> ArcState {
    let mut state = state();
    submit(&mut state, FEE_COMMAND);
    assert!(state.approval.is_open());
    state
}

fn count_starts(state: &mut ArcState, ticks: usize, step_ms: u64) -> usize {
    (0..ticks)
        .map(|_| tick(state, step_ms))
        .filter(|effects| started_execution(effects).is_some())
        .count()
}

#[test]
fn scan_without_open_gate_is_ignored() {
    let mut state = state();
    assert!(user(&mut state, UserAction::StartScan).is_empty());
    assert_eq!(state.approval.status(), GateStatus::Idle);
}

#[test]
fn open_gate_without_scan_never_approves() {
    let mut state = opened_state();
    assert_eq!(count_starts(&mut state, 1_000, 10), 0);
    assert_eq!(state.approval.status(), GateStatus::Idle);
    assert!(!state.has_pending_timers());
}

#[test]
fn scan_approves_within_bounded_time_and_executes_once() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);
    assert_eq!(state.approval.status(), GateStatus::Scanning);

    let mut approved_at = None;
    for index in 0..1_000 {
        let effects = tick(&mut state, 10);
        if let Some((run_id, command)) = started_execution(&effects) {
            assert!(approved_at.is_none(), "execution started twice");
            assert_eq!(run_id, 1);
            assert_eq!(command, FEE_COMMAND);
            approved_at = Some((index + 1) as u64 * 10);
        }
    }

    // 51 scan intervals of 30ms, 1500ms verify, 1000ms hold.
    assert_eq!(approved_at, Some(4_030));
    assert!(!state.approval.is_open());
    let decision = state.last_decision.as_ref().expect("decision recorded");
    assert_eq!(decision.decision, ApprovalDecisionKind::Approved);
    assert_eq!(decision.request_id, "gov-1");
    assert_eq!(decision.at_ms, 4_030);
}

#[test]
fn gate_walks_scanning_verifying_success() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);

    tick(&mut state, 600);
    assert_eq!(state.approval.status(), GateStatus::Scanning);
    assert_eq!(state.approval.progress(), 40);

    tick(&mut state, 51 * 30 - 600);
    assert_eq!(state.approval.status(), GateStatus::Verifying);

    tick(&mut state, 1_500);
    assert_eq!(state.approval.status(), GateStatus::Success);
    assert!(state.execution.log().is_empty());
}

#[test]
fn no_execution_output_before_approval() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);

    for _ in 0..402 {
        let effects = tick(&mut state, 10);
        assert_eq!(started_execution(&effects), None);
        assert!(state.execution.log().is_empty());
        assert!(!state.execution.is_busy());
    }
}

#[test]
fn closing_while_scanning_drops_the_request() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);
    tick(&mut state, 300);

    assert_eq!(
        user(&mut state, UserAction::CloseApproval),
        vec![ArcEffect::RequestFrame]
    );
    assert_eq!(count_starts(&mut state, 100, 100), 0);
    assert!(state.execution.log().is_empty());
    assert_eq!(
        state.last_decision.as_ref().map(|record| record.decision),
        Some(ApprovalDecisionKind::Cancelled)
    );

    submit(&mut state, FEE_COMMAND);
    assert_eq!(state.approval.status(), GateStatus::Idle);
    assert_eq!(state.approval.progress(), 0);
    assert_eq!(state.approval.session(), 2);
}

#[test]
fn closing_while_verifying_drops_the_request() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);
    tick(&mut state, 51 * 30 + 700);
    assert_eq!(state.approval.status(), GateStatus::Verifying);

    user(&mut state, UserAction::CloseApproval);
    assert_eq!(count_starts(&mut state, 100, 100), 0);
    assert!(!state.execution.is_busy());
}

#[test]
fn closing_during_success_hold_cancels() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);
    tick(&mut state, 51 * 30 + 1_500);
    assert_eq!(state.approval.status(), GateStatus::Success);

    user(&mut state, UserAction::CloseApproval);
    assert_eq!(count_starts(&mut state, 100, 100), 0);
}

#[test]
fn close_without_open_gate_is_a_no_op() {
    let mut state = state();
    assert!(user(&mut state, UserAction::CloseApproval).is_empty());
    assert_eq!(state.last_decision, None);
}

#[test]
fn rejected_scan_fails_and_can_be_retried() {
    let mut state = opened_state();
    user(&mut state, UserAction::StartScan);
    tick(&mut state, 300);

    let effects = runtime(
        &mut state,
        RuntimeAction::RejectBiometric {
            reason: "sensor mismatch".to_string(),
        },
    );
    let posted = notices(&effects);
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].level, NoticeLevel::Error);
    assert_eq!(posted[0].title, "Biometric verification failed");
    assert_eq!(posted[0].description.as_deref(), Some("sensor mismatch"));
    assert_eq!(state.approval.status(), GateStatus::Failed);
    assert_eq!(
        state.last_decision.as_ref().map(|record| record.decision),
        Some(ApprovalDecisionKind::Rejected)
    );
    assert_eq!(count_starts(&mut state, 100, 100), 0);

    user(&mut state, UserAction::StartScan);
    assert_eq!(state.approval.status(), GateStatus::Scanning);
    assert_eq!(count_starts(&mut state, 100, 100), 1);
}

#[test]
fn reject_outside_a_scan_is_ignored() {
    let mut state = opened_state();
    let effects = runtime(
        &mut state,
        RuntimeAction::RejectBiometric {
            reason: "late".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.approval.status(), GateStatus::Idle);
}
