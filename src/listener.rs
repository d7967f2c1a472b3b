// Non-blocking UDP listener for control messages
// One receive attempt per tick; nothing is ever sent back.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use tracing::{debug, warn};

use crate::messages::ControlMessage;

// Larger than any sane control message
const MAX_DATAGRAM: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to decode control message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse a datagram payload
pub fn decode(payload: &[u8]) -> Result<ControlMessage, ListenerError> {
    Ok(serde_json::from_slice(payload)?)
}

pub struct DatagramListener {
    socket: UdpSocket,
    buf: [u8; MAX_DATAGRAM],
}

impl DatagramListener {
    /// Bind on all interfaces
    pub fn bind(port: u16) -> Result<Self, ListenerError> {
        Self::bind_addr(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    pub fn bind_addr(addr: SocketAddr) -> Result<Self, ListenerError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            buf: [0u8; MAX_DATAGRAM],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Try once to receive a message; never blocks and never fails
    pub fn poll(&mut self) -> Option<ControlMessage> {
        match self.try_recv() {
            Ok(msg) => msg,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn try_recv(&mut self) -> Result<Option<ControlMessage>, ListenerError> {
        let (len, from) = match self.socket.recv_from(&mut self.buf) {
            Ok(received) => received,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!("Received {} bytes from {}", len, from);
        decode(&self.buf[..len]).map(Some)
    }
}
