//! Biometric approval gate.
//!
//! The gate is opened with an [`ApprovalRequest`] and walks
//! `Idle -> Scanning -> Verifying -> Success` on simulated time. The request
//! is handed back exactly once, after the success hold elapses; closing the
//! gate at any earlier point drops it.

use tracing::debug;

use crate::config::GateConfig;
use crate::state::ApprovalRequest;
use crate::state::ApprovedAction;
use crate::state::GateStatus;
use crate::state::ImpactAssessment;

#[derive(Debug, Clone)]
pub struct ApprovalGate {
    status: GateStatus,
    progress: u8,
    phase_elapsed_ms: u64,
    request: Option<ApprovalRequest>,
    session: u64,
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self {
            status: GateStatus::Idle,
            progress: 0,
            phase_elapsed_ms: 0,
            request: None,
            session: 0,
        }
    }
}

impl ApprovalGate {
    pub fn status(&self) -> GateStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn request(&self) -> Option<&ApprovalRequest> {
        self.request.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.request.is_some()
    }

    pub fn is_counting(&self) -> bool {
        self.is_open()
            && matches!(
                self.status,
                GateStatus::Scanning | GateStatus::Verifying | GateStatus::Success
            )
    }

    /// Opens a fresh session. Any request still held is replaced.
    pub fn open(&mut self, command: String, impact: ImpactAssessment) -> &ApprovalRequest {
        self.session += 1;
        self.reset_phase();
        let request = ApprovalRequest {
            request_id: format!("gov-{}", self.session),
            session: self.session,
            on_approve: ApprovedAction::Execute {
                command: command.clone(),
            },
            command,
            impact,
        };
        self.request.insert(request)
    }

    pub fn start_scan(&mut self) -> bool {
        if !self.is_open() || !matches!(self.status, GateStatus::Idle | GateStatus::Failed) {
            return false;
        }
        self.status = GateStatus::Scanning;
        self.progress = 0;
        self.phase_elapsed_ms = 0;
        true
    }

    /// Marks an in-flight scan as rejected. The request stays open so the
    /// scan can be retried or the gate closed.
    pub fn reject(&mut self) -> bool {
        if !self.is_open() || !matches!(self.status, GateStatus::Scanning | GateStatus::Verifying)
        {
            return false;
        }
        self.status = GateStatus::Failed;
        self.phase_elapsed_ms = 0;
        true
    }

    pub fn close(&mut self) -> Option<ApprovalRequest> {
        self.reset_phase();
        self.request.take()
    }

    /// Advances simulated time and returns the request once approval fires.
    pub fn advance(&mut self, elapsed_ms: u64, timing: &GateConfig) -> Option<ApprovalRequest> {
        if !self.is_open() {
            return None;
        }

        let mut budget = elapsed_ms;
        loop {
            let phase_len = match self.status {
                GateStatus::Idle | GateStatus::Failed => return None,
                GateStatus::Scanning => timing.scan_interval_ms.max(1),
                GateStatus::Verifying => timing.verify_ms,
                GateStatus::Success => timing.success_hold_ms,
            };

            let needed = phase_len.saturating_sub(self.phase_elapsed_ms);
            if budget < needed {
                self.phase_elapsed_ms += budget;
                return None;
            }
            budget -= needed;
            self.phase_elapsed_ms = 0;

            match self.status {
                GateStatus::Scanning => {
                    if self.progress >= 100 {
                        debug!(session = self.session, "biometric scan complete");
                        self.status = GateStatus::Verifying;
                    } else {
                        self.progress = self.progress.saturating_add(timing.scan_step).min(100);
                    }
                }
                GateStatus::Verifying => {
                    self.status = GateStatus::Success;
                }
                GateStatus::Success => {
                    let request = self.request.take();
                    self.reset_phase();
                    return request;
                }
                GateStatus::Idle | GateStatus::Failed => return None,
            }
        }
    }

    fn reset_phase(&mut self) {
        self.status = GateStatus::Idle;
        self.progress = 0;
        self.phase_elapsed_ms = 0;
    }
}
