//! Console configuration
//!
//! All values are injected at startup; the dispatch subsystem never reads
//! files or the environment itself. `main` assembles this from defaults and
//! environment overrides.

use crate::resolve::TeamToggles;

/// Where game-command datagrams are sent
///
/// Operator-changeable at runtime; takes effect on the next send. No
/// reachability check is performed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Which scope the ball-placement surface populates
///
/// Two front-end variants exist historically: broadcast-only placement and
/// team-targeted placement. Both live behind the one `place_ball` command;
/// this mode picks which scope gets filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// Placement addresses all robots (`robot_color` omitted)
    #[default]
    Broadcast,
    /// Placement requires a selected, enabled team
    TeamTargeted,
}

/// Configuration for the operator console
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Initial command destination
    pub target: ConnectionTarget,
    /// Per-team enablement, immutable after startup
    pub teams: TeamToggles,
    /// Ball-placement coordinates used when the operator gives none (cm)
    pub default_placement: (f64, f64),
    /// Scope the placement surface uses
    pub placement_mode: PlacementMode,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            target: ConnectionTarget {
                host: "127.0.0.1".into(),
                port: 50011,
            },
            teams: TeamToggles::default(),
            default_placement: (0.0, 0.0),
            placement_mode: PlacementMode::default(),
        }
    }
}
