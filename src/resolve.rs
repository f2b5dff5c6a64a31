//! Target resolution: which recipient scope a command applies to
//!
//! Pure and synchronous; no I/O. Validation failures here mean the command
//! never reaches the transport.

use thiserror::Error;

use crate::command::{Scope, TeamColor};

/// Bad or missing operator input; always recoverable, never sent on the wire
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("no team selected")]
    NoTeamSelected,

    #[error("{0} team is disabled in this configuration")]
    TeamDisabled(TeamColor),

    #[error("invalid {axis} coordinate {input:?}: enter a finite number")]
    InvalidCoordinate { axis: &'static str, input: String },
}

/// Per-team enablement, fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct TeamToggles {
    pub yellow: bool,
    pub blue: bool,
}

impl TeamToggles {
    fn is_enabled(&self, color: TeamColor) -> bool {
        match color {
            TeamColor::Yellow => self.yellow,
            TeamColor::Blue => self.blue,
        }
    }
}

impl Default for TeamToggles {
    fn default() -> Self {
        Self {
            yellow: true,
            blue: true,
        }
    }
}

/// Validate a team selection against the enablement toggles
pub fn resolve_team(
    selected: Option<TeamColor>,
    toggles: &TeamToggles,
) -> Result<TeamColor, ValidationError> {
    let color = selected.ok_or(ValidationError::NoTeamSelected)?;
    if !toggles.is_enabled(color) {
        return Err(ValidationError::TeamDisabled(color));
    }
    Ok(color)
}

/// Scope for commands that are inherently global
pub fn resolve_broadcast() -> Scope {
    Scope::Broadcast
}
