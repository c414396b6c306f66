//! Intent classification for structured questions.
//!
//! Free-text matching against a closed catalog of recognized intents.
//! Each candidate carries a confidence score, and selection applies the
//! same threshold-and-margin shape the semantic side uses: below the
//! threshold nothing matches, and two distinct intents inside the margin
//! are ambiguous rather than silently picking one.

/// A recognized category of structured question, mapped to an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    LeaveBalance,
    CanApply,
    NextEligible,
    AirTicket,
    Workday,
    Attachment,
    SelfService,
    Manager,
    Probation,
    Accommodation,
    Shift,
    RpNumber,
    Department,
    JoiningDate,
    Profile,
}

impl Intent {
    /// Intents that cannot be answered without knowing which leave type
    /// the question is about.
    pub fn requires_leave_type(self) -> bool {
        matches!(
            self,
            Intent::CanApply | Intent::NextEligible | Intent::Attachment | Intent::SelfService
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Intent::LeaveBalance => "leave balance",
            Intent::CanApply => "leave application",
            Intent::NextEligible => "next eligibility",
            Intent::AirTicket => "air ticket eligibility",
            Intent::Workday => "workday eligibility",
            Intent::Attachment => "attachment requirement",
            Intent::SelfService => "self-service",
            Intent::Manager => "manager",
            Intent::Probation => "probation",
            Intent::Accommodation => "accommodation",
            Intent::Shift => "shift",
            Intent::RpNumber => "rp number",
            Intent::Department => "department",
            Intent::JoiningDate => "joining date",
            Intent::Profile => "profile",
        }
    }
}

/// One candidate intent with its match confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentMatch {
    pub intent: Intent,
    pub score: f32,
}

/// Outcome of threshold-and-margin selection over ranked candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntentDecision {
    /// No candidate reached the threshold.
    None,
    /// A unique winner.
    Selected(IntentMatch),
    /// Two distinct intents inside the tie margin.
    Ambiguous(Intent, Intent),
}

struct Rule {
    intent: Intent,
    /// Phrase fragments with per-phrase confidence. Longer, more
    /// specific phrasings carry more weight.
    phrases: &'static [(&'static str, f32)],
}

const RULES: &[Rule] = &[
    Rule {
        intent: Intent::LeaveBalance,
        phrases: &[
            ("leave balance", 1.0),
            ("balance", 0.7),
            ("days left", 0.8),
            ("days remaining", 0.8),
            ("remaining leave", 0.8),
            ("how many days", 0.7),
        ],
    },
    Rule {
        intent: Intent::NextEligible,
        phrases: &[
            ("when can i apply", 1.0),
            ("when can i take", 1.0),
            ("next eligible", 0.9),
        ],
    },
    Rule {
        intent: Intent::CanApply,
        phrases: &[("can i apply", 0.9), ("can i take", 0.9)],
    },
    Rule {
        intent: Intent::AirTicket,
        phrases: &[
            ("air ticket", 1.0),
            ("airticket", 1.0),
            ("flight ticket", 0.9),
            ("airfare", 0.8),
        ],
    },
    Rule {
        intent: Intent::Workday,
        phrases: &[("workday", 1.0), ("working day", 0.9)],
    },
    Rule {
        intent: Intent::Attachment,
        phrases: &[
            ("need an attachment", 1.0),
            ("attachment required", 1.0),
            ("attachment", 0.8),
        ],
    },
    Rule {
        intent: Intent::SelfService,
        phrases: &[("self service", 1.0), ("self-service", 1.0)],
    },
    Rule {
        intent: Intent::Manager,
        phrases: &[
            ("who is my manager", 1.0),
            ("manager", 0.9),
            ("reporting to", 0.9),
            ("who do i report", 0.9),
            ("reporting line", 0.8),
        ],
    },
    Rule {
        intent: Intent::Probation,
        phrases: &[("probation", 1.0)],
    },
    Rule {
        intent: Intent::Accommodation,
        phrases: &[("accommodation", 1.0), ("company housing", 0.8)],
    },
    Rule {
        intent: Intent::Shift,
        phrases: &[("shift", 1.0)],
    },
    Rule {
        intent: Intent::RpNumber,
        phrases: &[
            ("rp number", 1.0),
            ("resident permit", 1.0),
            ("residence permit", 1.0),
        ],
    },
    Rule {
        intent: Intent::Department,
        phrases: &[("department", 1.0), ("which team am i", 0.7)],
    },
    Rule {
        intent: Intent::JoiningDate,
        phrases: &[
            ("joining date", 1.0),
            ("date of joining", 1.0),
            ("doj", 1.0),
            ("when did i join", 0.9),
        ],
    },
    Rule {
        intent: Intent::Profile,
        phrases: &[
            ("my profile", 1.0),
            ("profile summary", 1.0),
            ("my details", 0.8),
        ],
    },
];

/// Rank every intent whose phrases appear in the question.
///
/// Matching is case-insensitive substring search; an intent's score is
/// its best-matching phrase. Results are ordered by descending score,
/// ties keeping catalog order so classification is deterministic.
pub fn classify(question: &str) -> Vec<IntentMatch> {
    let q = question.to_lowercase();

    let mut candidates: Vec<IntentMatch> = RULES
        .iter()
        .filter_map(|rule| {
            rule.phrases
                .iter()
                .filter(|(phrase, _)| q.contains(phrase))
                .map(|(_, weight)| *weight)
                .fold(None, |best: Option<f32>, w| {
                    Some(best.map_or(w, |b| b.max(w)))
                })
                .map(|score| IntentMatch {
                    intent: rule.intent,
                    score,
                })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

/// Apply the threshold-and-margin policy to ranked candidates.
pub fn select(candidates: &[IntentMatch], threshold: f32, margin: f32) -> IntentDecision {
    let mut eligible = candidates.iter().filter(|c| c.score >= threshold);

    let top = match eligible.next() {
        Some(top) => *top,
        None => return IntentDecision::None,
    };

    if let Some(second) = eligible.next() {
        if second.intent != top.intent && (top.score - second.score) <= margin {
            return IntentDecision::Ambiguous(top.intent, second.intent);
        }
    }

    IntentDecision::Selected(top)
}
