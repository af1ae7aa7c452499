use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Bet,
    Win,
    Loss,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::Bet => "bet",
            EventType::Win => "win",
            EventType::Loss => "loss",
        };
        write!(f, "{s}")
    }
}

/// One recorded wager event. Immutable once appended.
/// The timestamp string is validated at record time and stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub amount: f64,
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Accumulated state for one (user, session_id) pair. Created implicitly on
/// the first event; `end_time` stays None while the session is open.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub events: Vec<Event>,
}

// ---------------------------------------------------------------------------
// Summary figures
// ---------------------------------------------------------------------------

/// Integer-or-decimal JSON number. Whole values render without a trailing
/// `.0` (10.0 → 10) so consumers can compare summaries textually.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    Whole(i64),
    Decimal(f64),
}

impl From<f64> for Num {
    fn from(x: f64) -> Self {
        // i64::MAX is not exactly representable as f64; stay inside 2^63.
        if x.fract() == 0.0 && x >= -(2f64.powi(63)) && x < 2f64.powi(63) {
            Num::Whole(x as i64)
        } else {
            Num::Decimal(x)
        }
    }
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Whole(n) => n as f64,
            Num::Decimal(x) => x,
        }
    }
}

/// Finalized totals for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub session_id: String,
    pub user_id: String,
    pub start_time: String,
    pub end_time: String,
    /// Count of bet events — wins and losses do not add rounds.
    pub rounds: u32,
    pub total_bets: Num,
    pub total_wins: Num,
    pub net_change: Num,
}
