use arc_core::actions::ArcAction;
use arc_core::actions::RuntimeAction;
use arc_core::actions::UserAction;
use arc_core::reducer::reduce;
use arc_core::reducer::ArcEffect;
use arc_core::sequencer::ExecutionRun;
use arc_core::state::ArcState;
use arc_core::state::Notice;
use arc_core::state::View;
use arc_core::Config;
use arc_exec::CommandExecutor;
use arc_exec::ExecutionRequest;
use arc_exec::ExecutionScript;
use arc_exec::SpeechCapability;
use tracing::debug;
use tracing::info;

/// Simulated time a headless run may spend before it is abandoned.
const HEADLESS_BUDGET_MS: u64 = 120_000;

pub fn execution_run(script: ExecutionScript) -> ExecutionRun {
    ExecutionRun {
        run_id: script.run_id,
        command: script.command,
        preamble: script.preamble,
        steps: script.steps,
        completion: Notice::success(script.completion_title)
            .with_description(script.completion_detail),
    }
}

/// Owns the state and resolves `StartExecution` against an executor, so
/// callers only see the effects a UI has to act on.
pub struct Session<E: CommandExecutor> {
    state: ArcState,
    executor: E,
}

impl<E: CommandExecutor> Session<E> {
    pub fn new(config: Config, executor: E) -> Self {
        Self {
            state: ArcState::new(config),
            executor,
        }
    }

    pub fn state(&self) -> &ArcState {
        &self.state
    }

    pub fn apply_speech_capability(&mut self, capability: &SpeechCapability) {
        if let SpeechCapability::Unavailable { reason } = capability {
            debug!(%reason, "voice input disabled");
        }
        self.dispatch(ArcAction::Runtime(RuntimeAction::SetSpeechAvailable(
            capability.is_available(),
        )));
    }

    pub fn user(&mut self, action: UserAction) -> Vec<ArcEffect> {
        self.dispatch(ArcAction::User(action))
    }

    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<ArcEffect> {
        self.dispatch(ArcAction::Runtime(RuntimeAction::Tick { elapsed_ms }))
    }

    pub fn dispatch(&mut self, action: ArcAction) -> Vec<ArcEffect> {
        let mut pending = reduce(&mut self.state, action);
        let mut effects = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let mut follow_up = Vec::new();
            for effect in pending {
                match effect {
                    ArcEffect::StartExecution { run_id, command } => {
                        info!(run_id, command = %command, "starting execution");
                        let script = self.executor.script(ExecutionRequest { run_id, command });
                        follow_up.extend(reduce(
                            &mut self.state,
                            ArcAction::Runtime(RuntimeAction::BeginExecution(execution_run(
                                script,
                            ))),
                        ));
                    }
                    other => effects.push(other),
                }
            }
            pending = follow_up;
        }
        effects
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessEvent {
    Navigated(View),
    Notice(Notice),
    ApprovalRequired {
        request_id: String,
        category: &'static str,
        value: &'static str,
        risk: &'static str,
    },
    ApprovalCancelled,
    Line(String),
}

/// Submits `command` and drives the simulated clock until every timer has
/// settled. Governance requests are scanned when `approve` is set and closed
/// otherwise.
pub fn run_headless<E: CommandExecutor>(
    session: &mut Session<E>,
    command: &str,
    approve: bool,
    tick_ms: u64,
) -> Vec<HeadlessEvent> {
    let mut recorder = Recorder::default();
    let before = session.state().view;

    session.user(UserAction::ClearInput);
    session.user(UserAction::InputPaste(command.to_string()));
    let effects = session.user(UserAction::SubmitInput);
    recorder.collect(session.state(), &effects);

    if session.state().view != before {
        recorder.events.push(HeadlessEvent::Navigated(session.state().view));
    }

    if let Some(request) = session.state().approval.request().cloned() {
        recorder.events.push(HeadlessEvent::ApprovalRequired {
            request_id: request.request_id.clone(),
            category: request.impact.category,
            value: request.impact.value,
            risk: request.impact.risk.label(),
        });
        if approve {
            session.user(UserAction::StartScan);
        } else {
            session.user(UserAction::CloseApproval);
            recorder.events.push(HeadlessEvent::ApprovalCancelled);
        }
    }

    let tick_ms = tick_ms.max(1);
    let mut elapsed = 0;
    while session.state().has_pending_timers() && elapsed < HEADLESS_BUDGET_MS {
        let effects = session.tick(tick_ms);
        elapsed += tick_ms;
        recorder.collect(session.state(), &effects);
    }
    debug!(elapsed_ms = elapsed, "headless run settled");
    recorder.events
}

#[derive(Default)]
struct Recorder {
    events: Vec<HeadlessEvent>,
    last_seq: u64,
}

impl Recorder {
    fn collect(&mut self, state: &ArcState, effects: &[ArcEffect]) {
        let log = state.execution.log();
        if log.is_empty() {
            self.last_seq = 0;
        }
        let since = self.last_seq;
        for line in log.iter().filter(|line| line.seq > since) {
            self.events.push(HeadlessEvent::Line(line.text.clone()));
            self.last_seq = line.seq;
        }
        for effect in effects {
            if let ArcEffect::Notify(notice) = effect {
                self.events.push(HeadlessEvent::Notice(notice.clone()));
            }
        }
    }
}
