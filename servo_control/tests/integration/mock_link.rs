//! Recording actuator link and scripted sensor line shared by the scenarios.

use servo_common::config::{BusConfig, ControllerConfig};
use servo_common::link::{
    ActuatorLink, ChannelInfo, LinkError, Register, RegisterMap, SensorLine,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything observable about one run.
#[derive(Debug, Default)]
pub struct Journal {
    /// `(address, value)` of every write attempt, in order.
    pub writes: Vec<(u16, u32)>,
    pub opens: usize,
    pub actuator_closes: usize,
    pub sensor_closes: usize,
}

pub type SharedJournal = Arc<Mutex<Journal>>;

/// Actuator link that records writes and answers from a result script.
pub struct RecordingLink {
    journal: SharedJournal,
    results: VecDeque<Result<(), LinkError>>,
    open_error: Option<LinkError>,
}

impl RecordingLink {
    pub fn new(journal: &SharedJournal) -> Self {
        Self {
            journal: Arc::clone(journal),
            results: VecDeque::new(),
            open_error: None,
        }
    }

    /// Answer the next writes with `results`, then succeed.
    pub fn with_results(mut self, results: Vec<Result<(), LinkError>>) -> Self {
        self.results = results.into();
        self
    }

    pub fn failing_open(mut self, error: LinkError) -> Self {
        self.open_error = Some(error);
        self
    }
}

impl ActuatorLink for RecordingLink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn open(&mut self, config: &BusConfig) -> Result<ChannelInfo, LinkError> {
        if let Some(e) = self.open_error.take() {
            return Err(e);
        }
        self.journal.lock().unwrap().opens += 1;
        Ok(ChannelInfo {
            device: config.device.display().to_string(),
            baud_rate: config.baud_rate,
            protocol: config.protocol,
            device_id: config.device_id,
            registers: RegisterMap::for_protocol(config.protocol),
        })
    }

    fn write_register(&mut self, register: Register, value: u32) -> Result<(), LinkError> {
        self.journal
            .lock()
            .unwrap()
            .writes
            .push((register.address, value));
        self.results.pop_front().unwrap_or(Ok(()))
    }

    fn close(&mut self) {
        self.journal.lock().unwrap().actuator_closes += 1;
    }
}

/// Sensor line replaying a fixed script, then reporting no data.
pub struct ScriptedSensor {
    journal: SharedJournal,
    script: VecDeque<Result<Option<Vec<u8>>, LinkError>>,
}

impl ScriptedSensor {
    pub fn new(journal: &SharedJournal, script: Vec<Result<Option<Vec<u8>>, LinkError>>) -> Self {
        Self {
            journal: Arc::clone(journal),
            script: script.into(),
        }
    }

    /// Script of complete lines, one per poll.
    pub fn lines(journal: &SharedJournal, lines: &[&str]) -> Self {
        let script = lines
            .iter()
            .map(|line| Ok(Some(line.as_bytes().to_vec())))
            .collect();
        Self::new(journal, script)
    }

    pub fn boxed(self) -> Box<dyn SensorLine> {
        Box::new(self)
    }
}

impl SensorLine for ScriptedSensor {
    fn name(&self) -> &str {
        "scripted"
    }

    fn poll_line(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        self.script.pop_front().unwrap_or(Ok(None))
    }

    fn close(&mut self) {
        self.journal.lock().unwrap().sensor_closes += 1;
    }
}

pub fn journal() -> SharedJournal {
    Arc::new(Mutex::new(Journal::default()))
}

/// Default configuration with a short poll interval.
pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        poll_interval: Duration::from_millis(2),
        ..ControllerConfig::default()
    }
}
