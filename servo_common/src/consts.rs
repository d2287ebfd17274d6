//! Workspace-wide defaults.
//!
//! Single source of truth for the values the controller starts with when no
//! command-line override is given.

use std::time::Duration;

/// Default actuator bus device.
pub const DEFAULT_BUS_DEVICE: &str = "/dev/ttyUSB0";

/// Default actuator bus baud rate.
pub const DEFAULT_BUS_BAUD: u32 = 57_600;

/// Default actuator id on the bus.
pub const DEFAULT_DXL_ID: u8 = 1;

/// Broadcast id. Writes to it are not answered with a status packet.
pub const BROADCAST_ID: u8 = 0xFE;

/// Default status packet timeout on the actuator bus.
pub const DEFAULT_RX_TIMEOUT: Duration = Duration::from_millis(50);

/// Default sensor (button board) device.
pub const DEFAULT_SENSOR_DEVICE: &str = "/dev/ttyUSB1";

/// Default sensor line baud rate.
pub const DEFAULT_SENSOR_BAUD: u32 = 57_600;

/// Target position commanded on the first trigger.
pub const DEFAULT_POSITION_MAX: i32 = 1023;

/// Target position commanded on the second trigger.
pub const DEFAULT_POSITION_MIN: i32 = 0;

/// Speed used for both moves.
pub const DEFAULT_MOVE_SPEED: u16 = 100;

/// Fixed sleep between loop iterations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Key that terminates the controller.
pub const DEFAULT_STOP_KEY: char = 's';

/// Token sent by the button board when the first button is pressed.
pub const TOKEN_TRIGGER_A: &str = "BUTTON_1_PRESSED";

/// Token sent by the button board when the second button is pressed.
pub const TOKEN_TRIGGER_B: &str = "BUTTON_2_PRESSED";

/// Longest line kept by the sensor line buffer before it is discarded.
pub const MAX_SENSOR_LINE: usize = 256;
