// Serial PWM bridge protocol
//
// The servos hang off a small microcontroller that exposes two 50 Hz PWM
// channels and one 10-bit ADC over serial.
// Packet format: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum]
// Reply format:  [0xFF, 0xFF, ID, Length, Status, Params..., Checksum]

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

use super::duty::Side;

/// Default serial configuration for the bridge
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Standard servo signaling frequency
pub const PWM_FREQUENCY_HZ: u16 = 50;

/// Channel ids on the bridge
pub const CHANNEL_LEFT: u8 = 0;
pub const CHANNEL_RIGHT: u8 = 1;
pub const CHANNEL_ANALOG: u8 = 0x0A;

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Ping = 0x01,
    ReadAnalog = 0x02,
    SetDuty = 0x03,
    SetFrequency = 0x04,
}

/// Error types for bridge communication
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from channel {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("Checksum mismatch for channel {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Channel {id} returned error status: 0x{status:02X}")]
    DeviceError { id: u8, status: u8 },

    #[error("Timeout waiting for response from channel {id}")]
    Timeout { id: u8 },
}

pub type Result<T> = std::result::Result<T, BridgeError>;

pub fn channel_id(side: Side) -> u8 {
    match side {
        Side::Left => CHANNEL_LEFT,
        Side::Right => CHANNEL_RIGHT,
    }
}

/// Serial connection to the PWM bridge
pub struct PwmBridge {
    port: Box<dyn SerialPort>,
}

impl PwmBridge {
    /// Open the bridge and set both PWM channels to 50 Hz
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        let mut bridge = Self { port };
        for id in [CHANNEL_LEFT, CHANNEL_RIGHT] {
            bridge.set_frequency(id, PWM_FREQUENCY_HZ)?;
        }
        Ok(bridge)
    }

    /// Calculate checksum for a packet (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a packet with header and checksum
    fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // params + instruction + checksum
        let mut packet = Vec::with_capacity(6 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(id);
        packet.push(length);
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        let checksum = Self::checksum(&packet[2..]);
        packet.push(checksum);

        packet
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read a reply packet and return its params
    fn read_response(&mut self, expected_id: u8) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.port.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                BridgeError::Timeout { id: expected_id }
            } else {
                BridgeError::Io(e)
            }
        })?;

        let mut id_length = [0u8; 2];
        self.port.read_exact(&mut id_length)?;

        let mut remaining = vec![0u8; id_length[1] as usize];
        self.port.read_exact(&mut remaining)?;

        parse_response(expected_id, header, id_length, &remaining)
    }

    pub fn ping(&mut self, id: u8) -> Result<bool> {
        let packet = Self::build_packet(id, Instruction::Ping, &[]);
        self.send_packet(&packet)?;

        match self.read_response(id) {
            Ok(_) => Ok(true),
            Err(BridgeError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Set the raw duty of a PWM channel; the bridge does not reply
    pub fn set_duty(&mut self, id: u8, duty: u16) -> Result<()> {
        let packet = Self::build_packet(id, Instruction::SetDuty, &duty.to_le_bytes());
        debug!("Set duty on channel {}: {}", id, duty);
        self.send_packet(&packet)
    }

    /// Set the PWM frequency of a channel; the bridge does not reply
    pub fn set_frequency(&mut self, id: u8, hz: u16) -> Result<()> {
        let packet = Self::build_packet(id, Instruction::SetFrequency, &hz.to_le_bytes());
        debug!("Set frequency on channel {}: {} Hz", id, hz);
        self.send_packet(&packet)
    }

    /// Read the ADC (0..=1023)
    pub fn read_analog(&mut self) -> Result<u16> {
        let packet = Self::build_packet(CHANNEL_ANALOG, Instruction::ReadAnalog, &[]);
        self.send_packet(&packet)?;

        let response = self.read_response(CHANNEL_ANALOG)?;
        if response.len() < 2 {
            return Err(BridgeError::InvalidResponse {
                id: CHANNEL_ANALOG,
                reason: format!("Expected 2 bytes, got {}", response.len()),
            });
        }
        Ok(u16::from_le_bytes([response[0], response[1]]))
    }
}

/// Validate a reply and strip status and checksum
///
/// `remaining` holds the `length` bytes after id/length: status, params, checksum.
fn parse_response(
    expected_id: u8,
    header: [u8; 2],
    id_length: [u8; 2],
    remaining: &[u8],
) -> Result<Vec<u8>> {
    if header != HEADER {
        return Err(BridgeError::InvalidResponse {
            id: expected_id,
            reason: format!("Invalid header: {:02X?}", header),
        });
    }

    let [id, length] = id_length;
    if id != expected_id {
        return Err(BridgeError::InvalidResponse {
            id: expected_id,
            reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
        });
    }

    if remaining.len() < 2 {
        return Err(BridgeError::InvalidResponse {
            id,
            reason: format!("Reply too short: length {}", length),
        });
    }

    let mut checksum_data = vec![id, length];
    checksum_data.extend_from_slice(&remaining[..remaining.len() - 1]);
    if PwmBridge::checksum(&checksum_data) != remaining[remaining.len() - 1] {
        return Err(BridgeError::ChecksumMismatch { id });
    }

    let status = remaining[0];
    if status != 0 {
        return Err(BridgeError::DeviceError { id, status });
    }

    Ok(remaining[1..remaining.len() - 1].to_vec())
}
