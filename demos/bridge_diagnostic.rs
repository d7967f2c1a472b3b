// Bridge diagnostic: READ-ONLY check of the serial PWM bridge
//
// Pings both PWM channels and samples the analog input. No duty is written,
// so the servos do not move.
//
// Usage: cargo run --example bridge_diagnostic -- [port]
// Example: cargo run --example bridge_diagnostic -- /dev/ttyUSB0

use servo_duo_runtime::config::RuntimeConfig;
use servo_duo_runtime::control::steering::pot_to_speeds;
use servo_duo_runtime::motor::bridge::{CHANNEL_LEFT, CHANNEL_RIGHT, PwmBridge};
use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

const CHANNELS: [(u8, &str); 2] = [(CHANNEL_LEFT, "Left"), (CHANNEL_RIGHT, "Right")];
const SAMPLES: usize = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    println!("Serial port: {}", port);
    println!();

    println!("Step 1: Opening serial port...");
    let mut bridge = match PwmBridge::open(&port) {
        Ok(bridge) => {
            println!("  ✓ Bridge opened, channels set to 50 Hz");
            bridge
        }
        Err(e) => {
            println!("  ✗ Failed to open bridge: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the port path is correct");
            println!("  - Verify the USB cable is connected");
            return Err(e.into());
        }
    };
    println!();

    println!("Step 2: Pinging PWM channels...");
    for (id, name) in CHANNELS {
        print!("  {} (channel {}): ", name, id);
        io::stdout().flush()?;

        match bridge.ping(id) {
            Ok(true) => println!("✓ RESPONDING"),
            Ok(false) => println!("✗ NO RESPONSE"),
            Err(e) => println!("✗ ERROR: {}", e),
        }
    }
    println!();

    println!("Step 3: Sampling potentiometer ({} readings)...", SAMPLES);
    let config = RuntimeConfig::default();
    for _ in 0..SAMPLES {
        match bridge.read_analog() {
            Ok(raw) => {
                let speeds = pot_to_speeds(raw, &config.pot);
                println!(
                    "  Pot: {:4} -> L: {:.2} R: {:.2}",
                    raw, speeds.left, speeds.right
                );
            }
            Err(e) => println!("  Pot: ERROR - {}", e),
        }
        sleep(Duration::from_millis(100));
    }
    println!();
    println!("Next step: cargo run -- --bridge {} listen", port);

    Ok(())
}
