// Control loop: listener poll -> mode dispatch -> duty write -> sleep
//
// `tick` does one pass and returns how long to wait; the async drivers below
// do the waiting so the tick itself can be exercised without a clock.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::control::steering::pot_to_speeds;
use crate::control::{Controller, SpeedSource};
use crate::listener::DatagramListener;
use crate::messages::DutyPair;
use crate::motor::{AnalogInput, MotorDriver, PwmOutput};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Dual-mode UDP controller
pub struct Runtime<O: PwmOutput, S: SpeedSource> {
    listener: DatagramListener,
    controller: Controller<S>,
    driver: MotorDriver<O>,
    last_duties: Option<DutyPair>,
}

impl<O: PwmOutput, S: SpeedSource> Runtime<O, S> {
    pub fn new(listener: DatagramListener, controller: Controller<S>, driver: MotorDriver<O>) -> Self {
        Self {
            listener,
            controller,
            driver,
            last_duties: None,
        }
    }

    /// One control loop pass; returns the sleep before the next one
    pub fn tick(&mut self, now: Instant) -> Duration {
        if let Some(msg) = self.listener.poll() {
            self.controller.handle(&msg);
        }

        let speeds = self.controller.step(now);
        match self.driver.apply(speeds) {
            Ok(duties) => self.last_duties = Some(duties),
            Err(e) => warn!("Failed to write duties: {}", e),
        }

        self.controller.tick_interval()
    }

    pub fn controller(&self) -> &Controller<S> {
        &self.controller
    }

    pub fn driver(&self) -> &MotorDriver<O> {
        &self.driver
    }

    /// Duties from the last successful write
    pub fn last_duties(&self) -> Option<DutyPair> {
        self.last_duties
    }
}

/// Potentiometer steering: no network, no modes
pub struct PotRuntime<O: PwmOutput + AnalogInput> {
    driver: MotorDriver<O>,
    config: RuntimeConfig,
}

impl<O: PwmOutput + AnalogInput> PotRuntime<O> {
    pub fn new(driver: MotorDriver<O>, config: RuntimeConfig) -> Self {
        Self { driver, config }
    }

    pub fn tick(&mut self) -> Duration {
        match self.driver.output_mut().read_analog() {
            Ok(raw) => {
                let speeds = pot_to_speeds(raw, &self.config.pot);
                debug!("Pot: {} -> L: {:.2} R: {:.2}", raw, speeds.left, speeds.right);
                if let Err(e) = self.driver.apply(speeds) {
                    warn!("Failed to write duties: {}", e);
                }
            }
            Err(e) => {
                // No reading, no steering
                warn!("Failed to read potentiometer: {}", e);
                if let Err(e) = self.driver.stop() {
                    warn!("Failed to stop motors: {}", e);
                }
            }
        }
        self.config.tick_interval()
    }

    pub fn driver(&self) -> &MotorDriver<O> {
        &self.driver
    }
}

/// Run the dual-mode UDP controller until Ctrl-C
pub async fn run<O, S>(config: RuntimeConfig, output: O, source: S) -> Result<(), BoxError>
where
    O: PwmOutput,
    S: SpeedSource,
{
    info!("Binding UDP listener on 0.0.0.0:{}...", config.udp_port);
    let listener = DatagramListener::bind(config.udp_port)?;
    let driver = MotorDriver::new(output, config.left, config.right);
    let controller = Controller::new(&config, Instant::now(), source);

    info!(
        "Runtime started: {}ms tick, {}ms phase, {}ms transition",
        config.tick_interval_ms, config.phase_duration_ms, config.transition_time_ms
    );
    info!("Listening on: {}", listener.local_addr()?);

    let mut runtime = Runtime::new(listener, controller, driver);
    loop {
        let delay = runtime.tick(Instant::now());
        tokio::select! {
            _ = sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }
    // dropping the driver stops the motors
    Ok(())
}

/// Run potentiometer steering until Ctrl-C
pub async fn run_pot<O>(config: RuntimeConfig, output: O) -> Result<(), BoxError>
where
    O: PwmOutput + AnalogInput,
{
    let driver = MotorDriver::new(output, config.left, config.right);
    info!(
        "Potentiometer steering started: center={}, tolerance={}",
        config.pot.center, config.pot.tolerance
    );

    let mut runtime = PotRuntime::new(driver, config);
    loop {
        let delay = runtime.tick();
        tokio::select! {
            _ = sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ScriptedSource;
    use crate::messages::ControlMode;
    use crate::motor::{Calibration, SimulatedOutput};
    use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

    const LEFT: Calibration = Calibration {
        stop: 76,
        full_forward: 80,
    };
    const RIGHT: Calibration = Calibration {
        stop: 81,
        full_forward: 85,
    };

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn runtime(t0: Instant) -> (Runtime<SimulatedOutput, ScriptedSource>, UdpSocket, SocketAddr) {
        let listener =
            DatagramListener::bind_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
        let addr = listener.local_addr().unwrap();
        let config = RuntimeConfig::default();
        let controller =
            Controller::new(&config, t0, ScriptedSource::new(&[0.6, 0.9, 0.2, 0.4], &[]));
        let driver = MotorDriver::new(SimulatedOutput::default(), LEFT, RIGHT);
        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        (Runtime::new(listener, controller, driver), sender, addr)
    }

    /// Tick (without sleeping) until `done` holds, advancing the clock 50 ms per tick
    fn tick_until<F>(
        rt: &mut Runtime<SimulatedOutput, ScriptedSource>,
        start: Instant,
        done: F,
    ) -> Instant
    where
        F: Fn(&Runtime<SimulatedOutput, ScriptedSource>) -> bool,
    {
        let mut now = start;
        for _ in 0..200 {
            rt.tick(now);
            if done(rt) {
                return now;
            }
            std::thread::sleep(ms(1));
            now += ms(50);
        }
        panic!("condition never reached");
    }

    #[test]
    fn test_tick_returns_interval_and_writes() {
        let t0 = Instant::now();
        let (mut rt, _sender, _addr) = runtime(t0);
        assert_eq!(rt.tick(t0), ms(50));
        // first tick of the first phase: both at standstill
        assert_eq!(rt.last_duties(), Some(DutyPair { left: 76, right: 81 }));
        assert_eq!(rt.driver().output().last, DutyPair { left: 76, right: 81 });
    }

    #[test]
    fn test_angles_switch_to_automatic() {
        let t0 = Instant::now();
        let (mut rt, sender, addr) = runtime(t0);
        sender
            .send_to(br#"{"left_arm_angle": 180, "right_arm_angle": 90}"#, addr)
            .unwrap();

        tick_until(&mut rt, t0, |rt| rt.controller().mode() == ControlMode::Automatic);
        // 180° -> full forward, 90° -> 81 + 4 * 0.5
        assert_eq!(rt.last_duties(), Some(DutyPair { left: 80, right: 83 }));
    }

    #[test]
    fn test_manual_switch_back() {
        let t0 = Instant::now();
        let (mut rt, sender, addr) = runtime(t0);
        sender
            .send_to(br#"{"left_arm_angle": 90, "right_arm_angle": 45}"#, addr)
            .unwrap();
        let now = tick_until(&mut rt, t0, |rt| rt.controller().mode() == ControlMode::Automatic);

        sender.send_to(br#"{"mode_switch": "manual"}"#, addr).unwrap();
        tick_until(&mut rt, now + ms(50), |rt| {
            rt.controller().mode() == ControlMode::Manual
        });
    }

    #[test]
    fn test_malformed_payload_changes_nothing() {
        let t0 = Instant::now();
        let (mut rt, sender, addr) = runtime(t0);
        rt.tick(t0);
        let mode_before = rt.controller().mode();
        let transition_before = *rt.controller().transition();

        sender.send_to(b"{\"left_arm_angle\": 90, \"right_a", addr).unwrap();
        std::thread::sleep(ms(20));
        rt.tick(t0 + ms(50));

        assert_eq!(rt.controller().mode(), mode_before);
        assert_eq!(*rt.controller().transition(), transition_before);
        assert_eq!(rt.controller().mode_state().remote_angles(), None);
    }

    #[test]
    fn test_pot_runtime_steers() {
        let mut output = SimulatedOutput::default();
        output.analog = 1023;
        let driver = MotorDriver::new(output, LEFT, RIGHT);
        let mut rt = PotRuntime::new(driver, RuntimeConfig::default());

        assert_eq!(rt.tick(), ms(50));
        assert_eq!(rt.driver().output().last, DutyPair { left: 80, right: 85 });
    }

    #[test]
    fn test_pot_runtime_center_stops() {
        let driver = MotorDriver::new(SimulatedOutput::default(), LEFT, RIGHT);
        let mut rt = PotRuntime::new(driver, RuntimeConfig::default());
        rt.tick();
        assert_eq!(rt.driver().output().last, DutyPair { left: 76, right: 81 });
    }
}
