use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::telemetry::domain::transport::TelemetryTransport;

/// Sends each packet as one UDP datagram from an ephemeral local port.
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Resolves `host:port` once; later sends never block on DNS.
    pub fn new(host: &str, port: u16) -> Result<Self, Box<dyn std::error::Error>> {
        let target = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| format!("could not resolve {host}:{port}"))?;
        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        log::debug!("Sending telemetry to {target}");
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl TelemetryTransport for UdpTransport {
    fn send(&mut self, packet: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        self.socket.send_to(packet, self.target)?;
        Ok(())
    }
}
