mod command;
mod config;
mod dispatch;
mod resolve;
mod transport;

use anyhow::Result;
use command::TeamColor;
use config::{ConnectionTarget, ConsoleConfig, PlacementMode};
use dispatch::{Dispatcher, Severity, StatusReport};
use transport::UdpTransport;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = config_from_env();
    info!("Operator console starting");
    info!("  sending commands to {}", config.target);
    info!(
        "  teams enabled: yellow={} blue={}",
        config.teams.yellow, config.teams.blue
    );
    info!("  placement mode: {:?}", config.placement_mode);

    let transport = UdpTransport::bind().await?;
    let (dispatcher, mut status_rx) = Dispatcher::new(config, transport);

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Single cooperative loop: operator input and send outcomes, interleaved.
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if handle_line(&dispatcher, line.trim()) => {}
                    _ => break,
                }
            }
            Some(report) = status_rx.recv() => print_status(&report),
        }
    }

    println!("Operator console closed.");
    Ok(())
}

/// Parse one operator line; returns false to quit
fn handle_line(dispatcher: &Dispatcher, line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [] => {}
        ["start"] => dispatcher.dispatch_start(),
        ["stop"] => dispatcher.dispatch_stop(),
        ["estop"] => dispatcher.dispatch_emergency_stop(),
        ["place", rest @ ..] => handle_place(dispatcher, rest),
        ["target", host, port] => match port.parse::<u16>() {
            Ok(port) => dispatcher.set_target((*host).to_string(), port),
            Err(_) => println!("invalid port: {}", port),
        },
        ["status"] => println!("sending commands to {}", dispatcher.target()),
        ["help"] => print_help(),
        ["quit"] | ["exit"] => return false,
        _ => println!("unknown command: {} (try 'help')", line),
    }

    true
}

/// `place [x y] [yellow|blue]`
fn handle_place(dispatcher: &Dispatcher, args: &[&str]) {
    let (coords, selected) = match args.split_last() {
        Some((last, rest)) if team_from_token(last).is_some() => (rest, team_from_token(last)),
        _ => (args, None),
    };

    // Validation errors come back through the status channel.
    match coords {
        [] => {
            let _ = dispatcher.dispatch_place_ball_default(selected);
        }
        [x, y] => {
            let _ = dispatcher.dispatch_place_ball(x, y, selected);
        }
        _ => println!("usage: place [x y] [yellow|blue]"),
    }
}

fn team_from_token(token: &str) -> Option<TeamColor> {
    match token {
        "yellow" => Some(TeamColor::Yellow),
        "blue" => Some(TeamColor::Blue),
        _ => None,
    }
}

fn print_status(report: &StatusReport) {
    match report.severity {
        Severity::Ok => println!("[ok] {}", report.message),
        Severity::Error => println!("[error] {}", report.message),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  start                     - start the match (all robots)");
    println!("  stop                      - stop the match (all robots)");
    println!("  estop                     - emergency stop (all robots)");
    println!("  place [x y] [yellow|blue] - place the ball (cm); no x/y uses the default");
    println!("  target <host> <port>      - retarget subsequent commands");
    println!("  status                    - show the current target");
    println!("  quit                      - exit");
}

/// Assemble configuration from defaults and environment overrides
fn config_from_env() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();

    if let Ok(host) = std::env::var("GAME_COMMAND_TARGET_HOST") {
        config.target.host = host;
    }
    if let Some(port) = env_parse("GAME_COMMAND_TARGET_PORT") {
        config.target = ConnectionTarget {
            port,
            ..config.target
        };
    }
    if let Some(enabled) = env_parse("ENABLE_YELLOW_ROBOT") {
        config.teams.yellow = enabled;
    }
    if let Some(enabled) = env_parse("ENABLE_BLUE_ROBOT") {
        config.teams.blue = enabled;
    }
    if let Some(x) = env_parse("BALL_PLACEMENT_TARGET_X") {
        config.default_placement.0 = x;
    }
    if let Some(y) = env_parse("BALL_PLACEMENT_TARGET_Y") {
        config.default_placement.1 = y;
    }
    match std::env::var("PLACEMENT_MODE").as_deref() {
        Ok("broadcast") => config.placement_mode = PlacementMode::Broadcast,
        Ok("team") => config.placement_mode = PlacementMode::TeamTargeted,
        Ok(other) => warn!("ignoring unknown PLACEMENT_MODE {:?}", other),
        Err(_) => {}
    }

    config
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparsable {}={:?}", name, raw);
            None
        }
    }
}
