// Keyboard teleop over UDP: W/S throttle, A/D steer, M manual mode, Q quit
//
// Usage: cargo run --example angle_publisher -- [host:port]
// Example: cargo run --example angle_publisher -- 192.168.4.1:8080
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::json;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::info;

const THROTTLE_STEPS: [f32; 4] = [0.0, 60.0, 120.0, 180.0]; // degrees
const STEER_STEP: f32 = 15.0; // degrees
const MAX_STEER: f32 = 90.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(&target).await?;
    info!("Sending to {}", target);
    info!("Controls: W/S=throttle, A/D=steer, M=manual mode, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&socket).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(socket: &UdpSocket) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut throttle_idx: usize = 0;
    let mut steer: f32 = 0.0;
    // Angles are only sent once a steering key was pressed; M hands control back
    let mut automatic = false;

    loop {
        // Poll for key with 50ms timeout (matches the runtime tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('w') if pressed => {
                        throttle_idx = (throttle_idx + 1).min(THROTTLE_STEPS.len() - 1);
                        automatic = true;
                    }
                    KeyCode::Char('s') if pressed => {
                        throttle_idx = throttle_idx.saturating_sub(1);
                        automatic = true;
                    }
                    KeyCode::Char('a') if pressed => {
                        steer = (steer - STEER_STEP).max(-MAX_STEER);
                        automatic = true;
                    }
                    KeyCode::Char('d') if pressed => {
                        steer = (steer + STEER_STEP).min(MAX_STEER);
                        automatic = true;
                    }

                    KeyCode::Char('m') if pressed => {
                        automatic = false;
                        throttle_idx = 0;
                        steer = 0.0;
                        let cmd = json!({ "mode_switch": "manual" });
                        socket.send(cmd.to_string().as_bytes()).await?;
                        info!("Manual mode");
                    }

                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        if automatic {
            let throttle = THROTTLE_STEPS[throttle_idx];
            let cmd = json!({
                "left_arm_angle": (throttle + steer).clamp(0.0, 180.0),
                "right_arm_angle": (throttle - steer).clamp(0.0, 180.0),
            });
            socket.send(cmd.to_string().as_bytes()).await?;
        }
    }

    Ok(())
}
