use tracing::debug;

use crate::config::ExecutionConfig;
use crate::state::Notice;

/// A scripted run handed over by the executor host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRun {
    pub run_id: u64,
    pub command: String,
    pub preamble: Vec<String>,
    pub steps: Vec<String>,
    pub completion: Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPhase {
    Ready,
    Pending { run_id: u64, command: String },
    Running { next_step: usize, elapsed_ms: u64 },
    Finishing { elapsed_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionLine {
    pub seq: u64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ExecutionLog {
    next_seq: u64,
    lines: Vec<ExecutionLine>,
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self {
            next_seq: 1,
            lines: Vec::new(),
        }
    }
}

impl ExecutionLog {
    pub fn append(&mut self, text: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.lines.push(ExecutionLine {
            seq,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    LineAppended(String),
    Completed(Notice),
    Reset,
}

#[derive(Debug, Clone)]
pub struct ExecutionSequencer {
    phase: ExecutionPhase,
    log: ExecutionLog,
    run: Option<ExecutionRun>,
    next_run_id: u64,
}

impl Default for ExecutionSequencer {
    fn default() -> Self {
        Self {
            phase: ExecutionPhase::Ready,
            log: ExecutionLog::default(),
            run: None,
            next_run_id: 1,
        }
    }
}

impl ExecutionSequencer {
    pub fn phase(&self) -> &ExecutionPhase {
        &self.phase
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    pub fn is_busy(&self) -> bool {
        self.phase != ExecutionPhase::Ready
    }

    pub fn active_command(&self) -> Option<&str> {
        match &self.phase {
            ExecutionPhase::Ready => None,
            ExecutionPhase::Pending { command, .. } => Some(command.as_str()),
            ExecutionPhase::Running { .. } | ExecutionPhase::Finishing { .. } => {
                self.run.as_ref().map(|run| run.command.as_str())
            }
        }
    }

    /// Reserves a run id for `command`. Returns `None` while another run is
    /// still in flight.
    pub fn queue(&mut self, command: String) -> Option<u64> {
        if self.is_busy() {
            return None;
        }
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.phase = ExecutionPhase::Pending { run_id, command };
        Some(run_id)
    }

    /// Starts the scripted run if it matches the pending reservation.
    pub fn begin(&mut self, run: ExecutionRun) -> Vec<SequencerEvent> {
        let matches_pending = matches!(
            &self.phase,
            ExecutionPhase::Pending { run_id, .. } if *run_id == run.run_id
        );
        if !matches_pending {
            debug!(run_id = run.run_id, "ignoring stale execution run");
            return Vec::new();
        }

        self.log.clear();
        let mut events = Vec::with_capacity(run.preamble.len());
        for line in &run.preamble {
            self.log.append(line.clone());
            events.push(SequencerEvent::LineAppended(line.clone()));
        }

        if run.steps.is_empty() {
            events.push(SequencerEvent::Completed(run.completion.clone()));
            self.phase = ExecutionPhase::Finishing { elapsed_ms: 0 };
        } else {
            self.phase = ExecutionPhase::Running {
                next_step: 0,
                elapsed_ms: 0,
            };
        }
        self.run = Some(run);
        events
    }

    pub fn advance(&mut self, elapsed_ms: u64, timing: &ExecutionConfig) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        let mut budget = elapsed_ms;

        loop {
            match self.phase {
                ExecutionPhase::Running {
                    next_step,
                    elapsed_ms,
                } => {
                    let needed = timing.step_delay_ms.max(1).saturating_sub(elapsed_ms);
                    if budget < needed {
                        self.phase = ExecutionPhase::Running {
                            next_step,
                            elapsed_ms: elapsed_ms + budget,
                        };
                        return events;
                    }
                    budget -= needed;

                    let Some(run) = self.run.as_ref() else {
                        self.reset();
                        return events;
                    };
                    if let Some(line) = run.steps.get(next_step) {
                        self.log.append(line.clone());
                        events.push(SequencerEvent::LineAppended(line.clone()));
                    }

                    let next_step = next_step + 1;
                    if next_step >= run.steps.len() {
                        events.push(SequencerEvent::Completed(run.completion.clone()));
                        self.phase = ExecutionPhase::Finishing { elapsed_ms: 0 };
                    } else {
                        self.phase = ExecutionPhase::Running {
                            next_step,
                            elapsed_ms: 0,
                        };
                    }
                }
                ExecutionPhase::Finishing { elapsed_ms } => {
                    let needed = timing.reset_delay_ms.saturating_sub(elapsed_ms);
                    if budget < needed {
                        self.phase = ExecutionPhase::Finishing {
                            elapsed_ms: elapsed_ms + budget,
                        };
                        return events;
                    }
                    self.reset();
                    events.push(SequencerEvent::Reset);
                    return events;
                }
                ExecutionPhase::Ready | ExecutionPhase::Pending { .. } => return events,
            }
        }
    }

    fn reset(&mut self) {
        self.phase = ExecutionPhase::Ready;
        self.log.clear();
        self.run = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(run_id: u64, command: &str) -> ExecutionRun {
        ExecutionRun {
            run_id,
            command: command.to_string(),
            preamble: vec!["boot".to_string(), "auth".to_string()],
            steps: vec!["one".to_string(), "two".to_string(), "done".to_string()],
            completion: Notice::success(format!("ran {command}")),
        }
    }

    fn texts(sequencer: &ExecutionSequencer) -> Vec<String> {
        sequencer.log().iter().map(|line| line.text.clone()).collect()
    }

    #[test]
    fn queue_refuses_second_run_while_busy() {
        let mut sequencer = ExecutionSequencer::default();
        assert_eq!(sequencer.queue("first".to_string()), Some(1));
        assert_eq!(sequencer.queue("second".to_string()), None);
        assert_eq!(sequencer.active_command(), Some("first"));
    }

    #[test]
    fn begin_ignores_run_that_was_not_queued() {
        let mut sequencer = ExecutionSequencer::default();
        sequencer.queue("first".to_string());
        assert!(sequencer.begin(run(7, "first")).is_empty());
        assert!(sequencer.log().is_empty());
    }

    #[test]
    fn preamble_is_immediate_and_steps_follow_the_delay() {
        let timing = ExecutionConfig::default();
        let mut sequencer = ExecutionSequencer::default();
        let run_id = sequencer.queue("cmd".to_string()).expect("queued");
        sequencer.begin(run(run_id, "cmd"));
        assert_eq!(texts(&sequencer), vec!["boot", "auth"]);

        sequencer.advance(799, &timing);
        assert_eq!(sequencer.log().len(), 2);
        sequencer.advance(1, &timing);
        assert_eq!(texts(&sequencer), vec!["boot", "auth", "one"]);
    }

    #[test]
    fn completion_then_reset_after_delay() {
        let timing = ExecutionConfig::default();
        let mut sequencer = ExecutionSequencer::default();
        let run_id = sequencer.queue("cmd".to_string()).expect("queued");
        sequencer.begin(run(run_id, "cmd"));

        let events = sequencer.advance(3 * 800, &timing);
        assert_eq!(
            events.last(),
            Some(&SequencerEvent::Completed(Notice::success("ran cmd")))
        );
        assert_eq!(
            sequencer.phase(),
            &ExecutionPhase::Finishing { elapsed_ms: 0 }
        );
        assert_eq!(sequencer.log().len(), 5);

        assert!(sequencer.advance(1_999, &timing).is_empty());
        assert_eq!(sequencer.advance(1, &timing), vec![SequencerEvent::Reset]);
        assert!(!sequencer.is_busy());
        assert!(sequencer.log().is_empty());
    }

    #[test]
    fn sequence_is_independent_of_tick_granularity() {
        let timing = ExecutionConfig::default();
        let mut coarse = ExecutionSequencer::default();
        let mut fine = ExecutionSequencer::default();
        for sequencer in [&mut coarse, &mut fine] {
            let run_id = sequencer.queue("cmd".to_string()).expect("queued");
            sequencer.begin(run(run_id, "cmd"));
        }

        coarse.advance(2_000, &timing);
        for _ in 0..200 {
            fine.advance(10, &timing);
        }
        assert_eq!(texts(&coarse), texts(&fine));
    }

    #[test]
    fn run_without_steps_completes_immediately() {
        let mut sequencer = ExecutionSequencer::default();
        let run_id = sequencer.queue("cmd".to_string()).expect("queued");
        let mut scripted = run(run_id, "cmd");
        scripted.steps.clear();

        let events = sequencer.begin(scripted);
        assert!(matches!(events.last(), Some(SequencerEvent::Completed(_))));
        assert_eq!(
            sequencer.advance(2_000, &ExecutionConfig::default()),
            vec![SequencerEvent::Reset]
        );
    }
}
