//! Ticket filtering.
//!
//! A [`FilterSpec`] constrains tickets on up to three dimensions: status,
//! priority and room. Dimensions combine with AND; the values listed for one
//! dimension combine with OR. An absent or empty list leaves its dimension
//! unconstrained.

use serde::{Deserialize, Serialize};

use crate::desk::TicketRecord;

/// Shortest ticket text allowed to match as a substring of a filter value.
///
/// Without a floor, a one-letter status such as "c" would match any filter
/// containing that letter.
pub const MIN_REVERSE_MATCH_CHARS: usize = 2;

/// Filter dimensions configured for a screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Vec<String>>,
}

impl FilterSpec {
    /// True when no dimension constrains anything.
    pub fn is_empty(&self) -> bool {
        [&self.status, &self.priority, &self.room]
            .into_iter()
            .all(|values| constraint(values).is_none())
    }

    /// Whether `ticket` satisfies every populated dimension.
    pub fn matches(&self, ticket: &TicketRecord) -> bool {
        if let Some(statuses) = constraint(&self.status) {
            if !statuses.iter().any(|s| loosely_matches(&ticket.status, s)) {
                return false;
            }
        }

        if let Some(priorities) = constraint(&self.priority) {
            let matched = priorities.iter().any(|p| {
                loosely_matches(&ticket.priority, p) || ticket.priority_code == p.to_lowercase()
            });
            if !matched {
                return false;
            }
        }

        if let Some(rooms) = constraint(&self.room) {
            if !rooms.iter().any(|r| loosely_matches(&ticket.room, r)) {
                return false;
            }
        }

        true
    }
}

/// Free-function form of [`FilterSpec::matches`].
pub fn matches(ticket: &TicketRecord, spec: &FilterSpec) -> bool {
    spec.matches(ticket)
}

/// Values of a dimension, or `None` when it imposes no constraint.
///
/// Values are compared as given; a blank value matches every ticket.
fn constraint(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|values| !values.is_empty())
}

/// Case-insensitive substring match in either direction.
fn loosely_matches(field: &str, value: &str) -> bool {
    let field = field.to_lowercase();
    let value = value.to_lowercase();

    if field.contains(&value) {
        return true;
    }

    field.chars().count() >= MIN_REVERSE_MATCH_CHARS && value.contains(&field)
}
