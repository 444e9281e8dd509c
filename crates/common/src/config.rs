use serde::Deserialize;
use std::fs;

/// Full simulation configuration, loaded once at startup and never
/// mutated afterwards. Every collaborator borrows the section it needs.
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub simulation_name: String,
    pub plant: PlantConfig,
    pub run: RunConfig,
    pub events: EventConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub ffi: FfiConfig,
}

/// Physical parameters of the gate mechanism.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PlantConfig {
    /// Nominal travel speed in metres per second.
    pub speed_m_per_s: f64,
    /// Total rail length in metres.
    pub travel_m: f64,
    /// Mechanical play to take up before the gate moves, in metres.
    pub backlash_m: f64,
}

/// Loop timing and reproducibility parameters.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RunConfig {
    /// Control loop timestep in seconds.
    pub timestep_s: f64,
    /// Total simulated duration in hours.
    pub duration_hours: f64,
    /// Seed for the pulse generator.
    pub seed: u64,
    /// Quiescent ticks are recorded once every this many ticks.
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u64,
}

fn default_sample_stride() -> u64 {
    100
}

impl RunConfig {
    /// Number of control loop iterations for the configured duration.
    pub fn total_ticks(&self) -> u64 {
        (self.duration_hours * 3600.0 / self.timestep_s) as u64
    }
}

/// Synthetic radio-pulse pattern: a low baseline probability with
/// elevated windows for the morning and evening usage peaks.
#[derive(Debug, Deserialize, Clone)]
pub struct EventConfig {
    pub baseline_probability: f64,
    pub elevated_probability: f64,
    #[serde(default)]
    pub elevated_windows: Vec<TimeWindow>,
}

/// Slice of the simulated day, in hours. Bounds are exclusive.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TimeWindow {
    pub start_hour: f64,
    pub end_hour: f64,
}

impl TimeWindow {
    pub fn contains(&self, hour: f64) -> bool {
        hour > self.start_hour && hour < self.end_hour
    }
}

/// Hardware link parameters for the serial controller tier.
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    /// Maximum wait for one reply line, in milliseconds.
    pub reply_timeout_ms: u64,
    /// Wait after opening the port while the board reboots.
    pub boot_delay_s: f64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud: 115_200,
            reply_timeout_ms: 500,
            boot_delay_s: 2.0,
        }
    }
}

/// Location of the natively compiled controller module.
#[derive(Debug, Deserialize, Clone)]
pub struct FfiConfig {
    pub library: String,
}

impl Default for FfiConfig {
    fn default() -> Self {
        Self {
            library: "./libgate_controller.so".to_string(),
        }
    }
}

pub fn load_config(path: &str) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: SimulationConfig = toml::from_str(&content)?;
    Ok(config)
}
