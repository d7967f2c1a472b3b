// Motor side of the runtime
//
// Provides:
// - Speed -> duty mapping with per-motor calibration
// - Serial PWM bridge protocol
// - Motor driver over a pluggable PWM output

pub mod bridge;
mod driver;
pub mod duty;

pub use bridge::{BridgeError, PwmBridge};
pub use driver::{AnalogInput, MotorDriver, PwmOutput, SimulatedOutput};
pub use duty::{Calibration, MotorChannel, Side, duty};
