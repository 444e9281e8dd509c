use common::{GateController, GateState, SimulationConfig, SimulationRecorder};

/// In-process implementation of the gate state machine.
///
/// This is the model the compiled and hardware tiers are validated
/// against: its transitions define the contract, bit for bit.
pub struct ReferenceController {
    state: GateState,
}

impl ReferenceController {
    pub fn new() -> Self {
        Self {
            state: GateState::Closed,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Returns the controller to its power-on state.
    pub fn reset(&mut self) {
        self.state = GateState::Closed;
    }
}

impl Default for ReferenceController {
    fn default() -> Self {
        Self::new()
    }
}

impl GateController for ReferenceController {
    fn step(&mut self, pulse: bool, limit_open: bool, limit_closed: bool) -> i32 {
        // Radio pulse cycles the single-button state machine
        if pulse {
            self.state = self.state.advance();
        }

        // Limit switches latch the travel extremes. Each switch is
        // only honoured against its own travel direction; inconsistent
        // combinations pass through untouched, exactly as deployed.
        if limit_open && self.state == GateState::Opening {
            self.state = GateState::Stopped;
        }
        if limit_closed && self.state == GateState::Closing {
            self.state = GateState::Closed;
        }

        match self.state {
            GateState::Opening => 1,
            GateState::Closing => -1,
            _ => 0,
        }
    }
}

/// Runs the full simulation against a fresh in-process controller.
pub fn run_simulation(config: &SimulationConfig) -> SimulationRecorder {
    let mut controller = ReferenceController::new();
    common::run_simulation(config, &mut controller)
}
