use crate::config::PlantConfig;

/// Physical model of the sliding gate.
///
/// The motor has to take up the mechanical play (gear backlash) before
/// the gate itself moves: after every direction change or start from
/// rest, commanded motion first accumulates slack and only then
/// translates into position change.
#[derive(Debug)]
pub struct GatePlant {
    position: f64,
    slack: f64,
    direction: i32,
    speed: f64,
    travel: f64,
    backlash: f64,
}

impl GatePlant {
    pub fn new(config: &PlantConfig) -> Self {
        Self {
            position: 0.0,
            slack: 0.0,
            direction: 0,
            speed: config.speed_m_per_s,
            travel: config.travel_m,
            backlash: config.backlash_m,
        }
    }

    /// Current gate position in metres, always within [0, travel].
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Play taken up so far in the current direction, within [0, backlash].
    pub fn slack(&self) -> f64 {
        self.slack
    }

    /// True when the gate rests against the open end of the rail.
    pub fn at_open_limit(&self) -> bool {
        self.position >= self.travel
    }

    /// True when the gate rests against the closed end of the rail.
    pub fn at_closed_limit(&self) -> bool {
        self.position <= 0.0
    }

    /// Integrates one timestep of the given motor command (+1 open,
    /// -1 close, 0 stop) and returns the new position.
    pub fn step(&mut self, command: i32, dt: f64) -> f64 {
        // Reversal or motion from rest discards any play already taken up
        if command != 0 && command != self.direction {
            self.slack = 0.0;
            self.direction = command;
        }

        // The motor turns but the gate holds still until the play is consumed
        if command != 0 && self.slack < self.backlash {
            self.slack = (self.slack + (self.speed * dt).abs()).min(self.backlash);
            return self.position;
        }

        match command {
            1 => self.position = (self.position + self.speed * dt).min(self.travel),
            -1 => self.position = (self.position - self.speed * dt).max(0.0),
            _ => {}
        }

        self.position
    }
}
