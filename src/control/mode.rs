// Manual / automatic mode state machine
//
// Manual -> Automatic: a message carrying both arm angles.
// Automatic -> Manual: a message with `"mode_switch": "manual"`.
// Angles are checked first, so a message with both angles and a manual
// switch ends up in (or stays in) Automatic.

use tracing::{debug, info};

use crate::messages::{ControlMessage, ControlMode, RemoteAngles};

/// A mode change caused by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    pub from: ControlMode,
    pub to: ControlMode,
}

#[derive(Debug, Clone, Default)]
pub struct ModeState {
    mode: ControlMode,
    remote: Option<RemoteAngles>,
}

impl ModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Last angles received; kept across mode changes until overwritten
    pub fn remote_angles(&self) -> Option<RemoteAngles> {
        self.remote
    }

    /// Apply an inbound message, returning the mode change if there was one
    pub fn apply(&mut self, msg: &ControlMessage) -> Option<ModeSwitch> {
        if let Some(angles) = msg.angles() {
            debug!("Remote angles: left={}, right={}", angles.left, angles.right);
            self.remote = Some(angles);
            if msg.mode_switch.is_some() {
                debug!("Ignoring mode_switch in a message that carries angles");
            }
            return self.switch_to(ControlMode::Automatic);
        }

        if msg.requests_manual() {
            return self.switch_to(ControlMode::Manual);
        }

        if msg.left_arm_angle.is_some() || msg.right_arm_angle.is_some() {
            debug!("Ignoring message with a single arm angle: {:?}", msg);
        }
        None
    }

    fn switch_to(&mut self, to: ControlMode) -> Option<ModeSwitch> {
        if self.mode == to {
            return None;
        }
        let from = self.mode;
        self.mode = to;
        info!("Mode switch: {:?} -> {:?}", from, to);
        Some(ModeSwitch { from, to })
    }
}
