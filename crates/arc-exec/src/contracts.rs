use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub run_id: u64,
    pub command: String,
}

/// Lines a host replays for one run: `preamble` at once, then `steps` on the
/// step timer, then the completion notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionScript {
    pub run_id: u64,
    pub command: String,
    pub preamble: Vec<String>,
    pub steps: Vec<String>,
    pub completion_title: String,
    pub completion_detail: String,
}

impl ExecutionScript {
    pub fn line_count(&self) -> usize {
        self.preamble.len() + self.steps.len()
    }
}
