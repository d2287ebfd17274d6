//! The `servo_control` binary: exit codes and the stop-key path.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_servo_control"));
    // JSON output keeps ANSI styling out of the assertions.
    cmd.arg("--json")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Wait for `child`, killing it if it outlives `timeout`.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            child.kill().unwrap();
            panic!("servo_control did not exit within {timeout:?}");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn read_stdout(child: &mut Child) -> String {
    let mut out = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn test_stop_key_exits_zero() {
    let mut child = binary()
        .args([
            "--simulate",
            "--sim-press-every",
            "1",
            "--poll-interval-ms",
            "20",
        ])
        .stdin(Stdio::piped())
        .spawn()
        .unwrap();

    // Let a few simulated presses through before the stop key.
    thread::sleep(Duration::from_millis(100));
    child.stdin.take().unwrap().write_all(b"s").unwrap();

    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    let stdout = read_stdout(&mut child);

    assert_eq!(status.code(), Some(0), "stdout:\n{stdout}");
    assert!(stdout.contains("Key 's' pressed"), "stdout:\n{stdout}");
    assert!(stdout.contains("Program exited cleanly."), "stdout:\n{stdout}");
}

#[test]
fn test_missing_bus_device_exits_one() {
    let mut child = binary()
        .args(["--bus-device", "/nonexistent/tty"])
        .stdin(Stdio::null())
        .spawn()
        .unwrap();

    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    let stdout = read_stdout(&mut child);

    assert_eq!(status.code(), Some(1), "stdout:\n{stdout}");
    assert!(stdout.contains("failed to open actuator channel"), "stdout:\n{stdout}");
    assert!(!stdout.contains("Program exited cleanly."));
}

#[test]
fn test_invalid_configuration_exits_one() {
    let mut child = binary()
        .args(["--simulate", "--speed", "0"])
        .stdin(Stdio::null())
        .spawn()
        .unwrap();

    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(1));
}
