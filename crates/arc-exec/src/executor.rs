use tracing::debug;

use crate::contracts::ExecutionRequest;
use crate::contracts::ExecutionScript;

pub const PREAMBLE_LINES: [&str; 3] = [
    "Initializing ARC Nexus...",
    "Authenticating with Odoo ERP...",
    "Analyzing command parameters...",
];

pub const STEP_LINES: [&str; 5] = [
    "Accessing database records...",
    "Cross-referencing departmental dependencies...",
    "Applying autonomous business-as-code logic...",
    "Updating system state in real-time...",
    "Command Executed Successfully.",
];

pub const COMPLETION_DETAIL: &str = "Autonomous ledger updates completed.";

pub trait CommandExecutor {
    fn script(&self, request: ExecutionRequest) -> ExecutionScript;
}

/// Produces the same narrative for every command; nothing is actually run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NarrativeExecutor;

impl CommandExecutor for NarrativeExecutor {
    fn script(&self, request: ExecutionRequest) -> ExecutionScript {
        debug!(run_id = request.run_id, command = %request.command, "scripting execution");
        ExecutionScript {
            run_id: request.run_id,
            completion_title: format!("ARC executed command: {}", request.command),
            completion_detail: COMPLETION_DETAIL.to_string(),
            command: request.command,
            preamble: to_lines(&PREAMBLE_LINES),
            steps: to_lines(&STEP_LINES),
        }
    }
}

fn to_lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}
