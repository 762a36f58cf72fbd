use std::collections::VecDeque;

use serde::Serialize;

use crate::config::Config;
use crate::gate::ApprovalGate;
use crate::sequencer::ExecutionSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Dashboard,
    Collections,
    Support,
    Sales,
    Finance,
    Field,
    Strategy,
    Memory,
    Policy,
    GlobalInfra,
    Ledger,
    Resilience,
    Invasion,
}

impl View {
    pub const ALL: [View; 13] = [
        View::Dashboard,
        View::Collections,
        View::Support,
        View::Sales,
        View::Finance,
        View::Field,
        View::Strategy,
        View::Memory,
        View::Policy,
        View::GlobalInfra,
        View::Ledger,
        View::Resilience,
        View::Invasion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Collections => "Collections",
            Self::Support => "Support",
            Self::Sales => "Sales",
            Self::Finance => "Finance",
            Self::Field => "Field",
            Self::Strategy => "Strategy",
            Self::Memory => "Memory",
            Self::Policy => "Policy",
            Self::GlobalInfra => "Global Infra",
            Self::Ledger => "Ledger",
            Self::Resilience => "Resilience",
            Self::Invasion => "Invasion",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::Dashboard => "Cash $127,482 | Runway 4.2 months | Health 87/100",
            Self::Collections => "AR balance $32,414 | 3 accounts past 60 days",
            Self::Support => "61 open tickets | SLA 94%",
            Self::Sales => "Pipeline $57K | Win rate 24%",
            Self::Finance => "DSO 37 days | Runway review pending",
            Self::Field => "8/10 technicians active | Avg resolution 2.3h",
            Self::Strategy => "Scenario simulation idle",
            Self::Memory => "Decision vault: last Raffoul settlement on file",
            Self::Policy => "Autonomy tier: supervised | Biometric gate: L4",
            Self::GlobalInfra => "All tenants nominal",
            Self::Ledger => "Business-as-code ledger: 0 pending rules",
            Self::Resilience => "Island weather watch: clear",
            Self::Invasion => "No competitor strikes queued",
        }
    }

    fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|view| *view == self)
            .unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = self.position();
        if idx == 0 {
            Self::ALL[Self::ALL.len() - 1]
        } else {
            Self::ALL[idx - 1]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImpactAssessment {
    pub category: &'static str,
    pub value: &'static str,
    pub risk: RiskLevel,
}

/// What runs once the gate grants approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovedAction {
    Execute { command: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub request_id: String,
    pub session: u64,
    pub command: String,
    pub impact: ImpactAssessment,
    pub on_approve: ApprovedAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Idle,
    Scanning,
    Verifying,
    Success,
    Failed,
}

impl GateStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Verifying => "verifying",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecisionKind {
    Approved,
    Cancelled,
    Rejected,
}

impl ApprovalDecisionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDecisionRecord {
    pub request_id: String,
    pub command: String,
    pub decision: ApprovalDecisionKind,
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
    /// `None` uses the tray default.
    pub ttl_ms: Option<u64>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
            ttl_ms: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PostedNotice {
    pub seq: u64,
    pub notice: Notice,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NoticeTray {
    cap: usize,
    default_ttl_ms: u64,
    next_seq: u64,
    buf: VecDeque<PostedNotice>,
}

impl NoticeTray {
    pub fn new(cap: usize, default_ttl_ms: u64) -> Self {
        Self {
            cap,
            default_ttl_ms,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn post(&mut self, notice: Notice) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        let remaining_ms = notice.ttl_ms.unwrap_or(self.default_ttl_ms);
        self.buf.push_back(PostedNotice {
            seq,
            notice,
            remaining_ms,
        });
        seq
    }

    pub fn expire(&mut self, elapsed_ms: u64) {
        for posted in self.buf.iter_mut() {
            posted.remaining_ms = posted.remaining_ms.saturating_sub(elapsed_ms);
        }
        self.buf.retain(|posted| posted.remaining_ms > 0);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PostedNotice> {
        self.buf.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsoleInput {
    pub text: String,
    pub suggestion_query: Option<String>,
    pub suggestion_cursor: Option<usize>,
}

impl ConsoleInput {
    pub fn clear(&mut self) {
        self.text.clear();
        self.reset_suggestions();
    }

    pub fn reset_suggestions(&mut self) {
        self.suggestion_query = None;
        self.suggestion_cursor = None;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceState {
    pub available: bool,
    pub listening: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ArcState {
    pub config: Config,
    pub view: View,
    pub input: ConsoleInput,
    pub approval: ApprovalGate,
    pub last_decision: Option<ApprovalDecisionRecord>,
    pub execution: ExecutionSequencer,
    pub voice: VoiceState,
    pub notices: NoticeTray,
    pub clock_ms: u64,
}

impl ArcState {
    pub fn new(config: Config) -> Self {
        let notices = NoticeTray::new(config.notices.capacity, config.notices.default_ttl_ms);
        Self {
            config,
            view: View::Dashboard,
            input: ConsoleInput::default(),
            approval: ApprovalGate::default(),
            last_decision: None,
            execution: ExecutionSequencer::default(),
            voice: VoiceState::default(),
            notices,
            clock_ms: 0,
        }
    }

    /// True while anything is still counting down.
    pub fn has_pending_timers(&self) -> bool {
        self.voice.listening || self.approval.is_counting() || self.execution.is_busy()
    }
}
