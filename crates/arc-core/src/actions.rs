use crate::sequencer::ExecutionRun;
use crate::state::Notice;
use crate::state::View;

#[derive(Debug, Clone)]
pub enum ArcAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    InputChar(char),
    InputBackspace,
    InputPaste(String),
    ClearInput,
    SubmitInput,
    NextSuggestion,
    PrevSuggestion,
    ToggleVoice,
    SelectView(View),
    NextView,
    PrevView,
    ReturnToDashboard,
    StartScan,
    CloseApproval,
    DismissNotices,
    CopyExecutionLog,
    Quit,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    Tick { elapsed_ms: u64 },
    SetSpeechAvailable(bool),
    BeginExecution(ExecutionRun),
    RejectBiometric { reason: String },
    Notify(Notice),
}

/// Text the mocked voice recognizer always "hears".
pub const MOCK_VOICE_COMMAND: &str = "Collections: Offer Raffoul 6 months, waive fees";

pub const SUGGESTIONS: [&str; 5] = [
    "Invasion: Deploy Sales to Kingston Flow outage",
    "Mesh: Arbitrage staff from Barbados to St. Vincent",
    "Collections: Review accounts >60 days",
    "Memory: Recall last Raffoul decision",
    "Field: Enter Emergency War Room",
];

pub fn filtered_suggestion_indices(query: &str) -> Vec<usize> {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        return (0..SUGGESTIONS.len()).collect();
    }

    SUGGESTIONS
        .iter()
        .enumerate()
        .filter_map(|(idx, suggestion)| {
            if suggestion.to_ascii_lowercase().contains(&query) {
                Some(idx)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_query_lists_every_suggestion() {
        assert_eq!(filtered_suggestion_indices("  "), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn query_filters_case_insensitively() {
        assert_eq!(filtered_suggestion_indices("RAFFOUL"), vec![3]);
        assert_eq!(filtered_suggestion_indices("o"), vec![0, 1, 2, 3, 4]);
        assert!(filtered_suggestion_indices("payroll").is_empty());
    }
}
