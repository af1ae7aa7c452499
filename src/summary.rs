//! Summary computation: rounds, wagered/won totals, net change, and the
//! derived session boundary timestamps.

use chrono::{DateTime, Utc};

use crate::archive::FinishedArchive;
use crate::error::{AppError, Result};
use crate::state::SessionStore;
use crate::time;
use crate::types::{EventType, Num, Summary};

/// Compute the summary for an active session, or return the previously
/// finalized one from the archive when no active record exists.
pub fn compute(
    sessions: &SessionStore,
    archive: &FinishedArchive,
    user_id: &str,
    session_id: &str,
) -> Result<Summary> {
    let Some(session) = sessions.get(user_id, session_id) else {
        return archive
            .find(user_id, session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()));
    };

    // One round per bet; wins and losses never count as rounds.
    let rounds = session
        .events
        .iter()
        .filter(|e| e.event_type == EventType::Bet)
        .count() as u32;
    let total_bets: f64 = session
        .events
        .iter()
        .filter(|e| e.event_type == EventType::Bet)
        .map(|e| e.amount)
        .sum();
    let total_wins: f64 = session
        .events
        .iter()
        .filter(|e| e.event_type == EventType::Win)
        .map(|e| e.amount)
        .sum();
    let net_change = total_wins - total_bets;

    // Unparseable timestamps are skipped rather than failing the summary.
    let mut parsed: Vec<DateTime<Utc>> = session
        .events
        .iter()
        .filter_map(|e| time::parse_iso(&e.timestamp).ok())
        .collect();
    parsed.sort();

    let mut start_time = session.start_time;
    let mut end_time = session.end_time;
    if let (Some(first), Some(last)) = (parsed.first(), parsed.last()) {
        start_time = Some(time::format_iso(*first));
        // A stored end time is fixed at end-of-session and never recomputed.
        if end_time.is_none() {
            end_time = Some(time::format_iso(*last));
        }
    }

    Ok(Summary {
        session_id: session_id.to_string(),
        user_id: user_id.to_string(),
        start_time: start_time.unwrap_or_else(time::now_iso),
        end_time: end_time.unwrap_or_else(time::now_iso),
        rounds,
        total_bets: Num::from(total_bets),
        total_wins: Num::from(total_wins),
        net_change: Num::from(net_change),
    })
}
