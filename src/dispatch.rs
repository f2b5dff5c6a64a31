//! Dispatch facade: one entry point per operator action
//!
//! Validates the operator's input, builds the command, hands it to the
//! transport, and relays the outcome as a human-readable status line. Status
//! reports cross back to the single-threaded front end through an unbounded
//! channel; background send tasks never touch front-end state directly.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::command::{GameCommand, Scope, TeamColor};
use crate::config::{ConnectionTarget, ConsoleConfig, PlacementMode};
use crate::resolve::{self, TeamToggles, ValidationError};
use crate::transport::{SendOutcome, UdpTransport};

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Error,
}

/// One line of feedback for the operator
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub severity: Severity,
    pub message: String,
}

impl StatusReport {
    fn ok(message: String) -> Self {
        Self {
            severity: Severity::Ok,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }
}

/// Builds, validates, and sends game commands
pub struct Dispatcher {
    transport: UdpTransport,
    /// Read per send; operator retargeting applies to the next send
    target: Mutex<ConnectionTarget>,
    teams: TeamToggles,
    placement_mode: PlacementMode,
    default_placement: (f64, f64),
    status_tx: mpsc::UnboundedSender<StatusReport>,
}

impl Dispatcher {
    /// Create the dispatcher and the status channel the front end drains
    pub fn new(
        config: ConsoleConfig,
        transport: UdpTransport,
    ) -> (Self, mpsc::UnboundedReceiver<StatusReport>) {
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        let dispatcher = Self {
            transport,
            target: Mutex::new(config.target),
            teams: config.teams,
            placement_mode: config.placement_mode,
            default_placement: config.default_placement,
            status_tx,
        };

        (dispatcher, status_rx)
    }

    /// Current command destination
    pub fn target(&self) -> ConnectionTarget {
        self.lock_target().clone()
    }

    /// Retarget subsequent sends; in-flight sends keep their old target
    pub fn set_target(&self, host: String, port: u16) {
        let target = ConnectionTarget { host, port };
        info!("retargeting commands to {}", target);
        *self.lock_target() = target.clone();
        let _ = self
            .status_tx
            .send(StatusReport::ok(format!("commands now target {}", target)));
    }

    pub fn dispatch_start(&self) {
        self.send(GameCommand::start());
    }

    pub fn dispatch_stop(&self) {
        self.send(GameCommand::stop());
    }

    pub fn dispatch_emergency_stop(&self) {
        self.send(GameCommand::emergency_stop());
    }

    /// Place the ball at operator-supplied coordinates
    ///
    /// Both coordinates must parse as finite numbers before anything touches
    /// the network; in team-targeted mode the selection must also resolve.
    pub fn dispatch_place_ball(
        &self,
        raw_x: &str,
        raw_y: &str,
        selected: Option<TeamColor>,
    ) -> Result<(), ValidationError> {
        let command = (|| {
            let x = parse_coordinate("x", raw_x)?;
            let y = parse_coordinate("y", raw_y)?;
            let scope = self.placement_scope(selected)?;
            Ok(GameCommand::place_ball(scope, x, y))
        })();

        match command {
            Ok(command) => {
                self.send(command);
                Ok(())
            }
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    /// Place the ball at the configured default coordinates
    pub fn dispatch_place_ball_default(
        &self,
        selected: Option<TeamColor>,
    ) -> Result<(), ValidationError> {
        match self.placement_scope(selected) {
            Ok(scope) => {
                let (x, y) = self.default_placement;
                self.send(GameCommand::place_ball(scope, x, y));
                Ok(())
            }
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    fn placement_scope(&self, selected: Option<TeamColor>) -> Result<Scope, ValidationError> {
        match self.placement_mode {
            PlacementMode::Broadcast => Ok(resolve::resolve_broadcast()),
            PlacementMode::TeamTargeted => {
                resolve::resolve_team(selected, &self.teams).map(Scope::Team)
            }
        }
    }

    /// Validation short-circuit: status goes out synchronously, nothing is sent
    fn reject(&self, error: &ValidationError) {
        warn!("command rejected: {}", error);
        let _ = self.status_tx.send(StatusReport::error(error.to_string()));
    }

    fn send(&self, command: GameCommand) {
        let label = describe(&command);
        let target = self.lock_target().clone();
        let status_tx = self.status_tx.clone();

        info!("dispatching {} to {}", label, target);
        self.transport.send_async(command, target, move |outcome| {
            let report = match outcome {
                SendOutcome::Delivered => StatusReport::ok(format!("sent {}", label)),
                SendOutcome::TransportError(detail) => {
                    StatusReport::error(format!("send failed for {}: {}", label, detail))
                }
                SendOutcome::EncodingError(detail) => {
                    StatusReport::error(format!("encoding error for {}: {}", label, detail))
                }
            };
            let _ = status_tx.send(report);
        });
    }

    fn lock_target(&self) -> std::sync::MutexGuard<'_, ConnectionTarget> {
        // A poisoned lock only means a panicking thread held it; the target
        // value itself is still valid.
        match self.target.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn parse_coordinate(axis: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidCoordinate {
        axis,
        input: raw.to_string(),
    };

    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

fn describe(command: &GameCommand) -> String {
    match command.position {
        Some((x, y)) => format!("{} x={} y={} ({})", command.kind.wire_name(), x, y, command.scope),
        None => format!("{} ({})", command.kind.wire_name(), command.scope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::UdpSocket;
    use tokio::time::timeout;

    async fn listener() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = socket.local_addr().expect("listener addr");
        (socket, addr)
    }

    async fn console(
        addr: SocketAddr,
        placement_mode: PlacementMode,
        teams: TeamToggles,
    ) -> (Dispatcher, mpsc::UnboundedReceiver<StatusReport>) {
        let config = ConsoleConfig {
            target: ConnectionTarget {
                host: addr.ip().to_string(),
                port: addr.port(),
            },
            teams,
            default_placement: (0.0, 0.0),
            placement_mode,
        };
        let transport = UdpTransport::bind().await.expect("bind transport");
        Dispatcher::new(config, transport)
    }

    async fn recv_json(socket: &UdpSocket) -> Value {
        let mut buf = [0u8; 2048];
        let (n, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("no datagram")
            .expect("recv failed");
        serde_json::from_slice(&buf[..n]).expect("corrupt datagram")
    }

    async fn assert_silent(socket: &UdpSocket) {
        let mut buf = [0u8; 64];
        let got = timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await;
        assert!(got.is_err(), "no datagram should have been sent");
    }

    async fn next_status(rx: &mut mpsc::UnboundedReceiver<StatusReport>) -> StatusReport {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no status report")
            .expect("status channel closed")
    }

    #[tokio::test]
    async fn test_dispatch_start_reaches_listener() {
        let (socket, addr) = listener().await;
        let (dispatcher, mut status_rx) =
            console(addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        dispatcher.dispatch_start();

        assert_eq!(
            recv_json(&socket).await,
            json!({"type": "game_command", "command": "start"})
        );
        let status = next_status(&mut status_rx).await;
        assert_eq!(status.severity, Severity::Ok);
        assert!(status.message.contains("start"));
    }

    #[tokio::test]
    async fn test_global_commands_are_broadcast() {
        let (socket, addr) = listener().await;
        let (dispatcher, _status_rx) =
            console(addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        dispatcher.dispatch_stop();
        dispatcher.dispatch_emergency_stop();

        let mut commands = vec![
            recv_json(&socket).await["command"]
                .as_str()
                .expect("command key")
                .to_string(),
            recv_json(&socket).await["command"]
                .as_str()
                .expect("command key")
                .to_string(),
        ];
        commands.sort();
        assert_eq!(commands, ["emergency_stop", "stop"]);
    }

    #[tokio::test]
    async fn test_place_ball_team_targeted() {
        let (socket, addr) = listener().await;
        let (dispatcher, mut status_rx) =
            console(addr, PlacementMode::TeamTargeted, TeamToggles::default()).await;

        dispatcher
            .dispatch_place_ball("12.5", "-3", Some(TeamColor::Yellow))
            .expect("dispatch failed");

        assert_eq!(
            recv_json(&socket).await,
            json!({
                "type": "game_command",
                "command": "place_ball",
                "x": 12.5,
                "y": -3.0,
                "robot_color": "yellow"
            })
        );
        let status = next_status(&mut status_rx).await;
        assert_eq!(status.severity, Severity::Ok);
        assert!(status.message.contains("x=12.5") && status.message.contains("y=-3"));
    }

    #[tokio::test]
    async fn test_place_ball_broadcast_mode_ignores_selection() {
        let (socket, addr) = listener().await;
        let (dispatcher, _status_rx) =
            console(addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        dispatcher
            .dispatch_place_ball("1", "2", None)
            .expect("dispatch failed");

        let value = recv_json(&socket).await;
        assert_eq!(value["command"], "place_ball");
        assert!(!value.as_object().expect("object").contains_key("robot_color"));
    }

    #[tokio::test]
    async fn test_bad_coordinate_never_touches_the_network() {
        let (socket, addr) = listener().await;
        let (dispatcher, mut status_rx) =
            console(addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        let result = dispatcher.dispatch_place_ball("abc", "0", None);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidCoordinate { axis: "x", .. })
        ));

        let status = next_status(&mut status_rx).await;
        assert_eq!(status.severity, Severity::Error);
        assert_silent(&socket).await;
    }

    #[tokio::test]
    async fn test_empty_coordinate_is_rejected() {
        let (socket, addr) = listener().await;
        let (dispatcher, _status_rx) =
            console(addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        let result = dispatcher.dispatch_place_ball("7", "", None);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidCoordinate { axis: "y", .. })
        ));
        assert_silent(&socket).await;
    }

    #[tokio::test]
    async fn test_team_mode_requires_selection() {
        let (socket, addr) = listener().await;
        let (dispatcher, mut status_rx) =
            console(addr, PlacementMode::TeamTargeted, TeamToggles::default()).await;

        let result = dispatcher.dispatch_place_ball("0", "0", None);
        assert_eq!(result, Err(ValidationError::NoTeamSelected));

        let status = next_status(&mut status_rx).await;
        assert_eq!(status.severity, Severity::Error);
        assert_silent(&socket).await;
    }

    #[tokio::test]
    async fn test_disabled_team_short_circuits() {
        let (socket, addr) = listener().await;
        let toggles = TeamToggles {
            yellow: false,
            blue: true,
        };
        let (dispatcher, _status_rx) =
            console(addr, PlacementMode::TeamTargeted, toggles).await;

        let result = dispatcher.dispatch_place_ball("0", "0", Some(TeamColor::Yellow));
        assert_eq!(result, Err(ValidationError::TeamDisabled(TeamColor::Yellow)));
        assert_silent(&socket).await;
    }

    #[tokio::test]
    async fn test_default_placement_uses_configured_coordinates() {
        let (socket, addr) = listener().await;
        let (dispatcher, _status_rx) =
            console(addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        dispatcher
            .dispatch_place_ball_default(None)
            .expect("dispatch failed");

        assert_eq!(
            recv_json(&socket).await,
            json!({"type": "game_command", "command": "place_ball", "x": 0.0, "y": 0.0})
        );
    }

    #[tokio::test]
    async fn test_retarget_applies_to_next_send() {
        let (first, first_addr) = listener().await;
        let (second, second_addr) = listener().await;
        let (dispatcher, _status_rx) =
            console(first_addr, PlacementMode::Broadcast, TeamToggles::default()).await;

        dispatcher.dispatch_start();
        assert_eq!(recv_json(&first).await["command"], "start");

        dispatcher.set_target(second_addr.ip().to_string(), second_addr.port());
        dispatcher.dispatch_stop();

        assert_eq!(recv_json(&second).await["command"], "stop");
        assert_silent(&first).await;
    }
}
