//! Drift detection rules
//!
//! Each rule is a pure function over a session's time-ordered event log and
//! returns candidate drifts. Persistence and near-duplicate suppression live
//! in the engine.
//!
//! The window rules look at a filtered subsequence of the log (focus events,
//! or focus and URL changes) and compare each event with its neighbours.
//! The sequential rules walk the whole log once, carrying state.

use chrono::{Duration, NaiveDateTime};
use ddt_common::{Category, DriftType, EventType, Severity};
use serde_json::json;

use crate::db::drifts::{NewDrift, TriggerDomain};
use crate::db::events::EventRecord;

/// Unproductive detours shorter than this count as a focus break
pub const FOCUS_BREAK_MAX_SECS: i64 = 180;

/// A search followed by a distraction within this many seconds
pub const SEARCH_WINDOW_SECS: i64 = 120;
pub const SEARCH_HIGH_SECS: f64 = 30.0;
const SEARCH_MARKERS: [&str; 2] = ["google.com/search", "bing.com/search"];

/// A productive tab left for a distraction within this many seconds
pub const ABANDON_MAX_SECS: i64 = 60;
pub const ABANDON_HIGH_SECS: i64 = 30;

/// Gap between consecutive events treated as the user being away
pub const IDLE_SECS: i64 = 300;

pub const RAPID_WINDOW_SECS: i64 = 30;
pub const RAPID_SWITCHES: usize = 5;

/// How many preceding events the loop rule inspects
pub const LOOP_LOOKBACK: usize = 20;
pub const LOOP_MIN_VISITS: usize = 3;

fn focus_events(log: &[EventRecord]) -> Vec<&EventRecord> {
    log.iter()
        .filter(|e| e.event_type == EventType::TabFocus)
        .collect()
}

fn navigation_events(log: &[EventRecord]) -> Vec<&EventRecord> {
    log.iter().filter(|e| e.event_type.is_navigation()).collect()
}

fn is_search(url: Option<&str>) -> bool {
    url.map(|u| {
        let lower = u.to_ascii_lowercase();
        SEARCH_MARKERS.iter().any(|m| lower.contains(m))
    })
    .unwrap_or(false)
}

/// Productive → short Unproductive visit → Productive again
pub fn focus_breaks(session_id: i64, log: &[EventRecord]) -> Vec<NewDrift> {
    let focus = focus_events(log);
    let mut found = Vec::new();

    for w in focus.windows(3) {
        let (prev, cur, next) = (w[0], w[1], w[2]);
        if prev.category != Category::Productive
            || cur.category != Category::Unproductive
            || next.category != Category::Productive
        {
            continue;
        }

        let dur = (next.timestamp - cur.timestamp).num_seconds();
        if dur >= FOCUS_BREAK_MAX_SECS {
            continue;
        }

        let severity = if dur > 120 {
            Severity::High
        } else if dur > 60 {
            Severity::Medium
        } else {
            Severity::Low
        };

        found.push(NewDrift {
            session_id,
            drift_type: DriftType::FocusBreak,
            event_start: cur.timestamp,
            event_end: cur.timestamp + Duration::seconds(dur),
            severity,
            description: format!("Focus break for {}s", dur),
            tab_id: Some(cur.tab_id),
            event_meta: Some(json!({ "drift_duration": dur, "tab_id": cur.tab_id })),
        });
    }

    found
}

/// One HIGH drift per productive domain that tends to precede the user's
/// HIGH drifts, spanning the whole analysed session
pub fn drift_triggers(session_id: i64, log: &[EventRecord], triggers: &[TriggerDomain]) -> Vec<NewDrift> {
    let (Some(first), Some(last)) = (log.first(), log.last()) else {
        return Vec::new();
    };

    triggers
        .iter()
        .map(|t| NewDrift {
            session_id,
            drift_type: DriftType::DriftTrigger,
            event_start: first.timestamp,
            event_end: last.timestamp,
            severity: Severity::High,
            description: format!(
                "{} triggered {} high-severity drifts",
                t.domain_name, t.trigger_count
            ),
            tab_id: Some(t.last_tab_id),
            event_meta: Some(json!({
                "drift_trigger_count": t.trigger_count,
                "domain_name": t.domain_name,
                "tab_id": t.last_tab_id,
            })),
        })
        .collect()
}

/// A web search immediately followed by an unproductive page
pub fn search_to_unproductive(session_id: i64, log: &[EventRecord]) -> Vec<NewDrift> {
    let nav = navigation_events(log);
    let mut found = Vec::new();

    for w in nav.windows(2) {
        let (cur, next) = (w[0], w[1]);
        if !is_search(cur.url.as_deref()) || next.category != Category::Unproductive {
            continue;
        }

        let gap = next.timestamp - cur.timestamp;
        if gap.num_seconds() >= SEARCH_WINDOW_SECS {
            continue;
        }

        let secs = gap.num_milliseconds() as f64 / 1000.0;
        let severity = if secs < SEARCH_HIGH_SECS {
            Severity::High
        } else {
            Severity::Medium
        };

        found.push(NewDrift {
            session_id,
            drift_type: DriftType::SearchToUnproductive,
            event_start: cur.timestamp,
            event_end: next.timestamp,
            severity,
            description: format!("Search to unproductive in {}s", gap.num_seconds()),
            tab_id: Some(cur.tab_id),
            event_meta: Some(json!({
                "search_time": cur.timestamp,
                "drift_time": next.timestamp,
                "duration": secs,
                "tab_id": cur.tab_id,
            })),
        });
    }

    found
}

/// A productive tab abandoned for an unproductive one within a minute
pub fn task_abandonment(session_id: i64, log: &[EventRecord]) -> Vec<NewDrift> {
    let focus = focus_events(log);
    let mut found = Vec::new();

    for w in focus.windows(2) {
        let (cur, next) = (w[0], w[1]);
        if cur.category != Category::Productive || next.category != Category::Unproductive {
            continue;
        }

        let dur = (next.timestamp - cur.timestamp).num_seconds();
        if dur >= ABANDON_MAX_SECS {
            continue;
        }

        let severity = if dur < ABANDON_HIGH_SECS {
            Severity::High
        } else {
            Severity::Medium
        };

        found.push(NewDrift {
            session_id,
            drift_type: DriftType::TaskAbandonment,
            event_start: cur.timestamp,
            event_end: cur.timestamp + Duration::seconds(dur),
            severity,
            description: format!("Abandoned productive task after {}s", dur),
            tab_id: Some(cur.tab_id),
            event_meta: Some(json!({
                "time_on_task": dur,
                "tab_id": cur.tab_id,
                "abandonment_time": cur.timestamp,
            })),
        });
    }

    found
}

/// Single pass over the log for shift, idle, rapid switching and loops
pub fn sequential(session_id: i64, log: &[EventRecord]) -> Vec<NewDrift> {
    let mut found = Vec::new();
    let mut last_category: Option<Category> = None;
    let mut prev: Option<&EventRecord> = None;
    let mut switches: Vec<NaiveDateTime> = Vec::new();

    for (i, event) in log.iter().enumerate() {
        let t = event.timestamp;

        if event.event_type.is_navigation() {
            if let (Some(Category::Productive), Some(p)) = (last_category, prev) {
                if event.category.is_distracting() {
                    found.push(NewDrift {
                        session_id,
                        drift_type: DriftType::UnproductiveShift,
                        event_start: p.timestamp,
                        event_end: t,
                        severity: Severity::Low,
                        description: format!(
                            "Shifted from productive to {} domain: {}",
                            event.category, event.domain_name
                        ),
                        tab_id: Some(event.tab_id),
                        event_meta: None,
                    });
                }
            }
            last_category = Some(event.category);
        }

        if let Some(p) = prev {
            let gap = t - p.timestamp;
            if gap > Duration::seconds(IDLE_SECS) {
                found.push(NewDrift {
                    session_id,
                    drift_type: DriftType::IdleAway,
                    event_start: p.timestamp,
                    event_end: t,
                    severity: Severity::Low,
                    description: format!("User idle for {} minutes", gap.num_seconds() / 60),
                    tab_id: None,
                    event_meta: None,
                });
            }
        }

        if event.event_type == EventType::TabFocus {
            switches.push(t);
            switches.retain(|ts| t - *ts <= Duration::seconds(RAPID_WINDOW_SECS));

            if switches.len() >= RAPID_SWITCHES {
                found.push(NewDrift {
                    session_id,
                    drift_type: DriftType::RapidTabSwitching,
                    event_start: switches[0],
                    event_end: t,
                    severity: Severity::Moderate,
                    description: format!(
                        "Rapidly switched between {} tabs in 30 seconds",
                        switches.len()
                    ),
                    tab_id: Some(event.tab_id),
                    event_meta: None,
                });
                switches.clear();
            }
        }

        if event.category.is_distracting() {
            let recent: Vec<&EventRecord> = log[i.saturating_sub(LOOP_LOOKBACK)..i]
                .iter()
                .filter(|e| e.domain_name == event.domain_name && e.category.is_distracting())
                .collect();

            if recent.len() >= LOOP_MIN_VISITS {
                found.push(NewDrift {
                    session_id,
                    drift_type: DriftType::UnproductiveLoop,
                    event_start: recent[0].timestamp,
                    event_end: t,
                    severity: Severity::Moderate,
                    description: format!(
                        "Repeatedly visited {} ({} times)",
                        event.domain_name,
                        recent.len() + 1
                    ),
                    tab_id: Some(event.tab_id),
                    event_meta: None,
                });
            }
        }

        prev = Some(event);
    }

    found
}
