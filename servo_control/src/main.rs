//! # Servo Control
//!
//! Moves a Dynamixel servo between two positions on button presses read from
//! a serial button board. Press the stop key (default `s`) or Ctrl-C to exit.
//!
//! `--simulate` replaces both the actuator bus and the button board with
//! software stand-ins.

use clap::Parser;
use servo_common::config::{
    BusConfig, ControllerConfig, MotionConfig, ProtocolVersion, SensorConfig,
};
use servo_common::consts::*;
use servo_common::link::{LinkError, SensorLine};
use servo_common::stop::StopToken;
use servo_control::cycle::ControlLoop;
use servo_hal::keyboard::{RawTerminalGuard, spawn_key_listener};
use servo_hal::simulation::SimulatedButtons;
use servo_hal::{ActuatorRegistry, SerialSensorLine};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Servo Control: button-triggered Dynamixel positioning
#[derive(Parser, Debug)]
#[command(name = "servo_control")]
#[command(version)]
#[command(about = "Moves a servo between two positions on button presses")]
struct Args {
    /// Actuator bus serial device.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_BUS_DEVICE)]
    bus_device: PathBuf,

    /// Actuator bus baud rate.
    #[arg(long, default_value_t = DEFAULT_BUS_BAUD)]
    bus_baud: u32,

    /// Dynamixel protocol version (1.0 or 2.0).
    #[arg(long, default_value_t = ProtocolVersion::V2)]
    protocol: ProtocolVersion,

    /// Actuator id on the bus.
    #[arg(long, default_value_t = DEFAULT_DXL_ID)]
    dxl_id: u8,

    /// Status packet timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RX_TIMEOUT.as_millis() as u64)]
    rx_timeout_ms: u64,

    /// Button board serial device.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SENSOR_DEVICE)]
    sensor_device: PathBuf,

    /// Button board baud rate.
    #[arg(long, default_value_t = DEFAULT_SENSOR_BAUD)]
    sensor_baud: u32,

    /// Goal position for BUTTON_1_PRESSED.
    #[arg(long, default_value_t = DEFAULT_POSITION_MAX)]
    position_max: i32,

    /// Goal position for BUTTON_2_PRESSED.
    #[arg(long, default_value_t = DEFAULT_POSITION_MIN)]
    position_min: i32,

    /// Moving speed written before every move.
    #[arg(long, default_value_t = DEFAULT_MOVE_SPEED)]
    speed: u16,

    /// Delay between sensor polls in milliseconds.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    poll_interval_ms: u64,

    /// Key that stops the program.
    #[arg(long, default_value_t = DEFAULT_STOP_KEY)]
    stop_key: char,

    /// Actuator driver name.
    #[arg(long, default_value = "dynamixel")]
    driver: String,

    /// Use the simulated actuator and button board.
    #[arg(long)]
    simulate: bool,

    /// Simulated button press every N polls.
    #[arg(long, default_value_t = 20)]
    sim_press_every: u32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            bus: BusConfig {
                device: self.bus_device.clone(),
                baud_rate: self.bus_baud,
                protocol: self.protocol,
                device_id: self.dxl_id,
                rx_timeout: Duration::from_millis(self.rx_timeout_ms),
            },
            sensor: SensorConfig {
                device: self.sensor_device.clone(),
                baud_rate: self.sensor_baud,
            },
            motion: MotionConfig {
                position_max: self.position_max,
                position_min: self.position_min,
                speed: self.speed,
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            stop_key: self.stop_key,
        }
    }
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Servo Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Program exited cleanly.");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.controller_config();

    // Restored on every return path, before the process exits.
    let _terminal = match RawTerminalGuard::enable() {
        Ok(guard) => guard,
        Err(e) => {
            warn!("Could not switch terminal to key-at-a-time mode: {e}");
            None
        }
    };

    let stop = StopToken::new();
    let s = stop.clone();
    ctrlc::set_handler(move || {
        info!("Program interrupted.");
        s.request_stop();
    })?;

    spawn_key_listener(stop.clone(), config.stop_key)?;
    info!("Press '{}' to stop.", config.stop_key);

    let registry = ActuatorRegistry::with_builtin();
    let driver = if args.simulate {
        "simulation"
    } else {
        args.driver.as_str()
    };
    let link = registry.create(driver)?;

    let simulate = args.simulate;
    let press_every = args.sim_press_every;
    let open_sensor = move |sensor: &SensorConfig| -> Result<Box<dyn SensorLine>, LinkError> {
        if simulate {
            Ok(Box::new(SimulatedButtons::new(press_every)))
        } else {
            Ok(Box::new(SerialSensorLine::open(sensor)?))
        }
    };

    let mut control = ControlLoop::start(config, link, open_sensor, stop)?;
    control.run();
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
