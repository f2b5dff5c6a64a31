//! Outbound UDP transport for game commands
//!
//! One socket, bound at startup and shared by every send. Each send is
//! fire-and-forget: the work runs on a spawned task so the interactive loop
//! never blocks, and the outcome comes back through a completion callback
//! invoked exactly once. There is no retry, no acknowledgement, and no
//! cancellation; a send that has started runs to completion or failure.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::command::GameCommand;
use crate::config::ConnectionTarget;

/// Outcome of one send attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The local stack accepted the datagram. Not a receipt: the channel is
    /// best-effort and the receiver may never see it.
    Delivered,
    /// Local socket or network failure; the transport stays usable
    TransportError(String),
    /// A malformed command slipped past validation; a logic defect upstream
    EncodingError(String),
}

/// The shared outbound socket
///
/// `send_to` takes `&self`, so concurrent in-flight sends need no external
/// locking; each datagram is written atomically. The socket closes exactly
/// once, when the last `Arc` clone (transport or in-flight task) drops.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    /// Bind the outbound socket on an ephemeral port
    pub async fn bind() -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        debug!("outbound socket bound on {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Encode and send one command without blocking the caller
    ///
    /// `on_result` is invoked exactly once. The target is resolved per send,
    /// so operator retargeting applies to the next call.
    pub fn send_async(
        &self,
        command: GameCommand,
        target: ConnectionTarget,
        on_result: impl FnOnce(SendOutcome) + Send + 'static,
    ) {
        let socket = self.socket.clone();

        tokio::spawn(async move {
            let outcome = match command.encode() {
                Ok(payload) => {
                    match socket
                        .send_to(&payload, (target.host.as_str(), target.port))
                        .await
                    {
                        Ok(sent) => {
                            debug!(
                                "sent {} ({} bytes) to {}",
                                command.kind.wire_name(),
                                sent,
                                target
                            );
                            SendOutcome::Delivered
                        }
                        Err(e) => {
                            warn!("send to {} failed: {}", target, e);
                            SendOutcome::TransportError(e.to_string())
                        }
                    }
                }
                Err(e) => {
                    warn!("refusing to send unencodable command: {}", e);
                    SendOutcome::EncodingError(e.to_string())
                }
            };

            on_result(outcome);
        });
    }
}
