//! Shared vocabulary stored as text in the database
//!
//! Every enum here round-trips through its stored label via `as_str` and
//! `FromStr`; serde uses the same labels on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Per-user classification of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Productive,
    Unproductive,
    Neutral,
    #[serde(rename = "Social Media")]
    SocialMedia,
    Entertainment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Productive => "Productive",
            Category::Unproductive => "Unproductive",
            Category::Neutral => "Neutral",
            Category::SocialMedia => "Social Media",
            Category::Entertainment => "Entertainment",
        }
    }

    /// Categories that count as a lapse from productive browsing
    pub fn is_distracting(&self) -> bool {
        matches!(
            self,
            Category::Unproductive | Category::SocialMedia | Category::Entertainment
        )
    }

    /// Read a possibly missing or unknown stored label; falls back to Neutral
    pub fn from_db(label: Option<&str>) -> Self {
        label.and_then(|l| l.parse().ok()).unwrap_or(Category::Neutral)
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Productive" => Ok(Category::Productive),
            "Unproductive" => Ok(Category::Unproductive),
            "Neutral" => Ok(Category::Neutral),
            "Social Media" => Ok(Category::SocialMedia),
            "Entertainment" => Ok(Category::Entertainment),
            other => Err(Error::InvalidInput(format!("Unknown category: {}", other))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity event kinds reported by the browser extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    TabFocus,
    UrlChange,
    Click,
    MouseMove,
    Scroll,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TabFocus => "TAB_FOCUS",
            EventType::UrlChange => "URL_CHANGE",
            EventType::Click => "CLICK",
            EventType::MouseMove => "MOUSE_MOVE",
            EventType::Scroll => "SCROLL",
        }
    }

    /// Events that move the user's attention to a (possibly new) page
    pub fn is_navigation(&self) -> bool {
        matches!(self, EventType::TabFocus | EventType::UrlChange)
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TAB_FOCUS" => Ok(EventType::TabFocus),
            "URL_CHANGE" => Ok(EventType::UrlChange),
            "CLICK" => Ok(EventType::Click),
            "MOUSE_MOVE" => Ok(EventType::MouseMove),
            "SCROLL" => Ok(EventType::Scroll),
            other => Err(Error::InvalidInput(format!("Unknown event type: {}", other))),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drift severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "MODERATE" => Ok(Severity::Moderate),
            "HIGH" => Ok(Severity::High),
            other => Err(Error::InvalidInput(format!("Unknown severity: {}", other))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of drift the analysis engine records
///
/// The stored labels are mixed-case for the sequential rules and
/// upper snake case for the window rules; dashboards group on them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriftType {
    #[serde(rename = "Unproductive Shift")]
    UnproductiveShift,
    #[serde(rename = "Idle / Away")]
    IdleAway,
    #[serde(rename = "Rapid Tab Switching")]
    RapidTabSwitching,
    #[serde(rename = "Unproductive Loop")]
    UnproductiveLoop,
    #[serde(rename = "FOCUS_BREAK")]
    FocusBreak,
    #[serde(rename = "DRIFT_TRIGGER")]
    DriftTrigger,
    #[serde(rename = "SEARCH_TO_UNPRODUCTIVE")]
    SearchToUnproductive,
    #[serde(rename = "TASK_ABANDONMENT")]
    TaskAbandonment,
}

impl DriftType {
    pub const ALL: [DriftType; 8] = [
        DriftType::UnproductiveShift,
        DriftType::IdleAway,
        DriftType::RapidTabSwitching,
        DriftType::UnproductiveLoop,
        DriftType::FocusBreak,
        DriftType::DriftTrigger,
        DriftType::SearchToUnproductive,
        DriftType::TaskAbandonment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftType::UnproductiveShift => "Unproductive Shift",
            DriftType::IdleAway => "Idle / Away",
            DriftType::RapidTabSwitching => "Rapid Tab Switching",
            DriftType::UnproductiveLoop => "Unproductive Loop",
            DriftType::FocusBreak => "FOCUS_BREAK",
            DriftType::DriftTrigger => "DRIFT_TRIGGER",
            DriftType::SearchToUnproductive => "SEARCH_TO_UNPRODUCTIVE",
            DriftType::TaskAbandonment => "TASK_ABANDONMENT",
        }
    }
}

impl FromStr for DriftType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriftType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown drift type: {}", s)))
    }
}

impl fmt::Display for DriftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
