// Motor driver for the two continuous-rotation servos
//
// Maps speed pairs to duties and writes them to a PWM output (the serial
// bridge on hardware, a recording stub otherwise).

use tracing::{debug, info, warn};

use super::bridge::{self, BridgeError, PwmBridge};
use super::duty::{Calibration, MotorChannel, Side};
use crate::config::POT_CENTER;
use crate::messages::{DutyPair, SpeedPair};

/// Anything that can set a PWM duty on the left/right channel
pub trait PwmOutput {
    fn set_duty(&mut self, side: Side, duty: u16) -> Result<(), BridgeError>;
}

/// Anything that can read the potentiometer ADC (0..=1023)
pub trait AnalogInput {
    fn read_analog(&mut self) -> Result<u16, BridgeError>;
}

impl PwmOutput for PwmBridge {
    fn set_duty(&mut self, side: Side, duty: u16) -> Result<(), BridgeError> {
        PwmBridge::set_duty(self, bridge::channel_id(side), duty)
    }
}

impl AnalogInput for PwmBridge {
    fn read_analog(&mut self) -> Result<u16, BridgeError> {
        PwmBridge::read_analog(self)
    }
}

/// Output used when no bridge is attached: remembers what was written
#[derive(Debug, Clone)]
pub struct SimulatedOutput {
    pub last: DutyPair,
    pub writes: usize,
    pub analog: u16,
}

impl Default for SimulatedOutput {
    fn default() -> Self {
        Self {
            last: DutyPair::default(),
            writes: 0,
            analog: POT_CENTER,
        }
    }
}

impl PwmOutput for SimulatedOutput {
    fn set_duty(&mut self, side: Side, duty: u16) -> Result<(), BridgeError> {
        match side {
            Side::Left => self.last.left = duty,
            Side::Right => self.last.right = duty,
        }
        self.writes += 1;
        Ok(())
    }
}

impl AnalogInput for SimulatedOutput {
    fn read_analog(&mut self) -> Result<u16, BridgeError> {
        Ok(self.analog)
    }
}

/// Driver for the left/right servo pair
pub struct MotorDriver<O: PwmOutput> {
    output: O,
    left: MotorChannel,
    right: MotorChannel,
}

impl<O: PwmOutput> MotorDriver<O> {
    pub fn new(output: O, left: Calibration, right: Calibration) -> Self {
        info!(
            "Motor driver: left stop={} full={}, right stop={} full={}",
            left.stop, left.full_forward, right.stop, right.full_forward
        );
        Self {
            output,
            left: MotorChannel::new(Side::Left, left),
            right: MotorChannel::new(Side::Right, right),
        }
    }

    /// Clamp, map and write both speeds; returns the duties written
    pub fn apply(&mut self, speeds: SpeedPair) -> Result<DutyPair, BridgeError> {
        let speeds = speeds.clamped();
        let duties = DutyPair {
            left: self.left.duty(speeds.left),
            right: self.right.duty(speeds.right),
        };
        debug!(
            "L: {:.2} -> {}  R: {:.2} -> {}",
            speeds.left, duties.left, speeds.right, duties.right
        );
        self.write(duties)?;
        Ok(duties)
    }

    /// Write the stop duty to both motors
    pub fn stop(&mut self) -> Result<(), BridgeError> {
        info!("Stopping both motors");
        self.write(DutyPair {
            left: self.left.calibration.stop,
            right: self.right.calibration.stop,
        })
    }

    fn write(&mut self, duties: DutyPair) -> Result<(), BridgeError> {
        self.output.set_duty(Side::Left, duties.left)?;
        self.output.set_duty(Side::Right, duties.right)
    }

    pub fn channels(&self) -> [MotorChannel; 2] {
        [self.left, self.right]
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }
}

impl<O: PwmOutput> Drop for MotorDriver<O> {
    fn drop(&mut self) {
        // Leave the servos stopped
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
