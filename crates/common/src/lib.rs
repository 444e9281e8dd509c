pub mod config;
pub mod controller;
pub mod events;
pub mod harness;
pub mod plant;
pub mod telemetry;

pub use config::{load_config, SimulationConfig};
pub use controller::{GateController, GateState};
pub use events::PulseGenerator;
pub use harness::{run_simulation, Simulation};
pub use plant::GatePlant;
pub use telemetry::{SimulationRecorder, TickSample};
