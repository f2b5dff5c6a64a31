//! Game command model and its JSON wire encoding
//!
//! Every command becomes exactly one UTF-8 JSON object per UDP datagram:
//! ```text
//! {"type":"game_command","command":"place_ball","x":12.5,"y":-3,"robot_color":"yellow"}
//! ```
//!
//! A missing `robot_color` key IS the broadcast signal: the receiver treats
//! its absence as "all robots", so broadcast commands must not emit the key
//! at all (not even as null).

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// The two team colors the receiver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamColor {
    Yellow,
    Blue,
}

impl TeamColor {
    /// Lowercase name used for the `robot_color` wire key
    pub fn wire_name(&self) -> &'static str {
        match self {
            TeamColor::Yellow => "yellow",
            TeamColor::Blue => "blue",
        }
    }
}

impl std::fmt::Display for TeamColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Intended recipient set of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// All robots; encoded by omitting `robot_color`
    Broadcast,
    /// One named team
    Team(TeamColor),
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Broadcast => f.write_str("all robots"),
            Scope::Team(color) => write!(f, "{} team", color),
        }
    }
}

/// Closed set of control actions; adding one is a wire schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Stop,
    EmergencyStop,
    PlaceBall,
}

impl CommandKind {
    /// Name used for the `command` wire key
    pub fn wire_name(&self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Stop => "stop",
            CommandKind::EmergencyStop => "emergency_stop",
            CommandKind::PlaceBall => "place_ball",
        }
    }
}

/// Errors that can occur while encoding a command
///
/// Should be unreachable for commands built through the constructors below;
/// kept as a loud failure path rather than silently sending garbage.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("placement position is not finite: ({0}, {1})")]
    NonFinitePosition(f64, f64),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One command bound for the receiver
///
/// Built fresh per operator action, serialized once, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCommand {
    pub kind: CommandKind,
    pub scope: Scope,
    /// Present iff `kind` is `PlaceBall`; centimeters, not range-clamped
    pub position: Option<(f64, f64)>,
}

/// Wire shape; key set per command kind is a frozen contract with the receiver
#[derive(Serialize)]
struct WireCommand<'a> {
    r#type: &'static str,
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    robot_color: Option<&'static str>,
}

impl GameCommand {
    pub fn start() -> Self {
        Self {
            kind: CommandKind::Start,
            scope: Scope::Broadcast,
            position: None,
        }
    }

    pub fn stop() -> Self {
        Self {
            kind: CommandKind::Stop,
            scope: Scope::Broadcast,
            position: None,
        }
    }

    pub fn emergency_stop() -> Self {
        Self {
            kind: CommandKind::EmergencyStop,
            scope: Scope::Broadcast,
            position: None,
        }
    }

    pub fn place_ball(scope: Scope, x: f64, y: f64) -> Self {
        Self {
            kind: CommandKind::PlaceBall,
            scope,
            position: Some((x, y)),
        }
    }

    /// Encode into one JSON datagram payload
    ///
    /// Pure transform; never fails for commands built via the constructors
    /// with finite coordinates.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let (x, y) = match self.position {
            Some((x, y)) => {
                // serde_json would render a non-finite f64 as null, which the
                // receiver cannot interpret; fail loudly instead.
                if !x.is_finite() || !y.is_finite() {
                    return Err(EncodeError::NonFinitePosition(x, y));
                }
                (Some(x), Some(y))
            }
            None => (None, None),
        };

        let wire = WireCommand {
            r#type: "game_command",
            command: self.kind.wire_name(),
            x,
            y,
            robot_color: match self.scope {
                Scope::Broadcast => None,
                Scope::Team(color) => Some(color.wire_name()),
            },
        };

        Ok(Bytes::from(serde_json::to_vec(&wire)?))
    }
}
