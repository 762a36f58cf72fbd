use serde::Serialize;

use crate::state::ImpactAssessment;
use crate::state::NoticeLevel;
use crate::state::RiskLevel;
use crate::state::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Navigate(View),
    Notice(NoticeLevel, &'static str),
    Governance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordGroup {
    pub keywords: &'static [&'static str],
    pub route: Route,
}

/// Evaluated top to bottom; the first group with any matching keyword wins.
pub const KEYWORD_GROUPS: [KeywordGroup; 9] = [
    KeywordGroup {
        keywords: &["ledger", "code"],
        route: Route::Navigate(View::Ledger),
    },
    KeywordGroup {
        keywords: &["memory"],
        route: Route::Navigate(View::Memory),
    },
    KeywordGroup {
        keywords: &["policy", "settings"],
        route: Route::Navigate(View::Policy),
    },
    KeywordGroup {
        keywords: &["strategy"],
        route: Route::Navigate(View::Strategy),
    },
    KeywordGroup {
        keywords: &["war room", "emergency"],
        route: Route::Notice(NoticeLevel::Warning, "Entering War Room Protocol..."),
    },
    KeywordGroup {
        keywords: &["invasion", "competitor", "strike"],
        route: Route::Navigate(View::Invasion),
    },
    KeywordGroup {
        keywords: &["mesh", "arbitrage", "staff"],
        route: Route::Notice(NoticeLevel::Info, "Accessing Human Compute Mesh..."),
    },
    KeywordGroup {
        keywords: &["resilience", "island", "weather"],
        route: Route::Navigate(View::Resilience),
    },
    KeywordGroup {
        keywords: &["waive", "fee", "liquidate", "procure", "order"],
        route: Route::Governance,
    },
];

const PROCUREMENT_KEYWORDS: [&str; 2] = ["procure", "order"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Navigate {
        view: View,
    },
    Notice {
        level: NoticeLevel,
        message: &'static str,
    },
    Governance {
        command: String,
        impact: ImpactAssessment,
    },
    Execute {
        command: String,
    },
}

/// Classifies a console command. Blank input yields `None`.
pub fn classify(input: &str) -> Option<Classification> {
    let command = input.trim();
    if command.is_empty() {
        return None;
    }
    let lowered = command.to_lowercase();

    let route = KEYWORD_GROUPS
        .iter()
        .find(|group| group.keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|group| group.route);

    Some(match route {
        Some(Route::Navigate(view)) => Classification::Navigate { view },
        Some(Route::Notice(level, message)) => Classification::Notice { level, message },
        Some(Route::Governance) => Classification::Governance {
            command: command.to_string(),
            impact: assess_impact(&lowered),
        },
        None => Classification::Execute {
            command: command.to_string(),
        },
    })
}

/// Category and value are placeholders picked from the keyword, not computed.
pub fn assess_impact(lowered: &str) -> ImpactAssessment {
    if PROCUREMENT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        ImpactAssessment {
            category: "Supply Chain Procurement",
            value: "$12,400.00",
            risk: RiskLevel::Medium,
        }
    } else {
        ImpactAssessment {
            category: "Financial Liability",
            value: "$450.00",
            risk: RiskLevel::Medium,
        }
    }
}
