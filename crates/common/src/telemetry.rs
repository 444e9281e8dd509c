use serde::Serialize;

/// One recorded control-loop tick.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct TickSample {
    /// Simulated time in hours.
    pub hour: f64,
    /// Whether the radio key fired this tick.
    pub pulse: bool,
    /// Gate position after applying the motor command, in metres.
    pub position: f64,
    /// Motor command the controller returned (+1, 0, -1).
    pub command: i32,
}

/// Collects samples in tick order and exports them as CSV.
///
/// The loop is single-threaded, so this is a plain append-only buffer;
/// samples are produced once and never mutated.
pub struct SimulationRecorder {
    samples: Vec<TickSample>,
}

impl SimulationRecorder {
    pub fn new() -> Self {
        Self {
            samples: Vec::with_capacity(10_000),
        }
    }

    pub fn record(&mut self, sample: TickSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[TickSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn save_to_csv(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut wtr = csv::Writer::from_path(filename)?;
        for record in &self.samples {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        println!("Saved {} records to {}", self.samples.len(), filename);
        Ok(())
    }
}

impl Default for SimulationRecorder {
    fn default() -> Self {
        Self::new()
    }
}
