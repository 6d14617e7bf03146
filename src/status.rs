//! Run status enumeration, display metadata and the transition model.
//!
//! Status is owned by the server. The client only reads it, decides which
//! action affordances to offer, and re-fetches after triggering an action.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Planning,
    Planned,
    NeedsConfirmation,
    Applying,
    Applied,
    Errored,
    Cancelled,
    Discarded,
    PlannedAndFinished,
    /// Any status string this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// Badge severity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Pending,
    Info,
    Warning,
    Success,
    Error,
    Neutral,
}

/// Fixed presentation metadata for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    pub label: &'static str,
    /// Narrower label used in list rows.
    pub short_label: &'static str,
    pub severity: Severity,
    pub icon: &'static str,
    /// In-progress states render with a pulsing badge.
    pub pulse: bool,
}

const fn meta(
    label: &'static str,
    short_label: &'static str,
    severity: Severity,
    icon: &'static str,
    pulse: bool,
) -> StatusMeta {
    StatusMeta {
        label,
        short_label,
        severity,
        icon,
        pulse,
    }
}

const PENDING_META: StatusMeta = meta("Pending", "Pending", Severity::Pending, "⏳", false);

impl RunStatus {
    pub const ALL: [RunStatus; 10] = [
        RunStatus::Pending,
        RunStatus::Planning,
        RunStatus::Planned,
        RunStatus::NeedsConfirmation,
        RunStatus::Applying,
        RunStatus::Applied,
        RunStatus::Errored,
        RunStatus::Cancelled,
        RunStatus::Discarded,
        RunStatus::PlannedAndFinished,
    ];

    /// Parse a wire value; unrecognised strings map to `Unknown`.
    pub fn parse(s: &str) -> RunStatus {
        RunStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .unwrap_or(RunStatus::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Planning => "planning",
            RunStatus::Planned => "planned",
            RunStatus::NeedsConfirmation => "needs_confirmation",
            RunStatus::Applying => "applying",
            RunStatus::Applied => "applied",
            RunStatus::Errored => "errored",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Discarded => "discarded",
            RunStatus::PlannedAndFinished => "planned_and_finished",
            RunStatus::Unknown => "unknown",
        }
    }

    /// Total lookup. `Unknown` shares pending's metadata.
    pub fn meta(self) -> StatusMeta {
        match self {
            RunStatus::Pending | RunStatus::Unknown => PENDING_META,
            RunStatus::Planning => meta("Planning", "Planning", Severity::Info, "🔄", true),
            RunStatus::Planned => meta("Planned", "Planned", Severity::Info, "📋", false),
            RunStatus::NeedsConfirmation => meta(
                "Needs Confirmation",
                "Needs Confirm",
                Severity::Warning,
                "⚠️",
                false,
            ),
            RunStatus::Applying => meta("Applying", "Applying", Severity::Info, "🔄", true),
            RunStatus::Applied => meta("Applied", "Applied", Severity::Success, "✅", false),
            RunStatus::Errored => meta("Errored", "Errored", Severity::Error, "❌", false),
            RunStatus::Cancelled => meta("Cancelled", "Cancelled", Severity::Neutral, "🚫", false),
            RunStatus::Discarded => meta("Discarded", "Discarded", Severity::Neutral, "🗑️", false),
            RunStatus::PlannedAndFinished => {
                meta("Plan Only", "Plan Only", Severity::Success, "📋", false)
            }
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Applied
                | RunStatus::Errored
                | RunStatus::Cancelled
                | RunStatus::Discarded
                | RunStatus::PlannedAndFinished
        )
    }

    /// Edges of the server's run state machine. Used only to sanity-check
    /// what polling observes; the client never moves a run itself.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Pending, Planning)
                | (Pending, Cancelled)
                | (Pending, Errored)
                | (Planning, Planned)
                | (Planning, Errored)
                | (Planning, Cancelled)
                | (Planning, PlannedAndFinished)
                | (Planned, NeedsConfirmation)
                | (Planned, Applying)
                | (Planned, PlannedAndFinished)
                | (NeedsConfirmation, Applying)
                | (NeedsConfirmation, Discarded)
                | (Applying, Applied)
                | (Applying, Errored)
        )
    }

    /// Actions whose affordance is shown for this status.
    pub fn available_actions(self) -> Vec<RunAction> {
        RunAction::ALL
            .into_iter()
            .filter(|a| a.is_legal_for(self))
            .collect()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a raw status string, tolerating values added server-side later.
pub fn status_meta_for(raw: &str) -> StatusMeta {
    RunStatus::parse(raw).meta()
}

/// User-triggered transitions. Each is a body-less POST against the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunAction {
    Approve,
    Discard,
    Cancel,
}

impl RunAction {
    pub const ALL: [RunAction; 3] = [RunAction::Approve, RunAction::Discard, RunAction::Cancel];

    pub fn is_legal_for(self, status: RunStatus) -> bool {
        match self {
            RunAction::Approve | RunAction::Discard => status == RunStatus::NeedsConfirmation,
            RunAction::Cancel => matches!(status, RunStatus::Pending | RunStatus::Planning),
        }
    }

    /// Status the server is expected to move to. Informational; views always
    /// re-fetch instead of applying this.
    pub fn expected_next(self) -> RunStatus {
        match self {
            RunAction::Approve => RunStatus::Applying,
            RunAction::Discard => RunStatus::Discarded,
            RunAction::Cancel => RunStatus::Cancelled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunAction::Approve => "approve",
            RunAction::Discard => "discard",
            RunAction::Cancel => "cancel",
        }
    }

    /// Confirmation toast after the server accepted the action.
    pub fn success_message(self) -> &'static str {
        match self {
            RunAction::Approve => "Run approved! Applying...",
            RunAction::Discard => "Run discarded",
            RunAction::Cancel => "Run cancelled",
        }
    }

    /// Discard and cancel abandon the run and ask for confirmation first.
    pub fn needs_confirmation(self) -> bool {
        !matches!(self, RunAction::Approve)
    }
}

impl fmt::Display for RunAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
