use std::fmt;
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use common::config::SerialConfig;
use common::{GateController, SimulationConfig, SimulationRecorder};

/// Command applied whenever the device fails to answer a cycle.
const FAIL_SAFE_COMMAND: i32 = 0;

/// A reply longer than this cannot be a motor command; stop reading.
const MAX_REPLY_LEN: usize = 32;

/// Failure to acquire the controller hardware. Fatal before the loop
/// starts; once the link is up, per-cycle faults degrade to the
/// fail-safe command instead.
#[derive(Debug)]
pub enum LinkError {
    Open {
        port: String,
        source: serialport::Error,
    },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Open { port, source } => {
                write!(f, "failed to open serial port '{}': {}", port, source)
            }
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Open { source, .. } => Some(source),
        }
    }
}

/// Per-run counters for cycles resolved by the fail-safe path.
///
/// Fault ticks never abort the run; these counters let the comparison
/// report exclude them from the parity verdict afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkStats {
    /// Write failures, timeouts and disconnects.
    pub timeouts: u64,
    /// Replies that arrived but did not parse as a command.
    pub malformed: u64,
}

impl LinkStats {
    pub fn fault_ticks(&self) -> u64 {
        self.timeouts + self.malformed
    }
}

/// Adapter that forwards each control cycle to the device as one ASCII
/// line and parses the replied motor command.
///
/// Request framing is `"{pulse},{limit_open},{limit_closed}\n"` with
/// lowercase boolean tokens; the reply is a single signed integer line.
/// Generic over the transport so the framing and fail-safe logic are
/// testable without hardware; production wires in a `serialport` handle
/// carrying the configured read timeout.
pub struct SerialController<T: Read + Write> {
    transport: T,
    stats: LinkStats,
}

impl<T: Read + Write> SerialController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            stats: LinkStats::default(),
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Reads bytes until a newline, or gives up on timeout, disconnect
    /// or a runaway reply. The transport's own timeout bounds each read.
    fn read_reply(&mut self) -> Option<Vec<u8>> {
        let mut reply = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.transport.read(&mut byte) {
                Ok(0) => return None,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        return Some(reply);
                    }
                    reply.push(byte[0]);
                    if reply.len() > MAX_REPLY_LEN {
                        return None;
                    }
                }
                Err(_) => return None,
            }
        }
    }
}

/// Parses a reply line into a motor command.
fn parse_reply(reply: &[u8]) -> Option<i32> {
    std::str::from_utf8(reply).ok()?.trim().parse().ok()
}

impl<T: Read + Write> GateController for SerialController<T> {
    fn step(&mut self, pulse: bool, limit_open: bool, limit_closed: bool) -> i32 {
        let request = format!("{},{},{}\n", pulse, limit_open, limit_closed);

        let sent = self
            .transport
            .write_all(request.as_bytes())
            .and_then(|_| self.transport.flush());
        if sent.is_err() {
            self.stats.timeouts += 1;
            return FAIL_SAFE_COMMAND;
        }

        match self.read_reply() {
            None => {
                self.stats.timeouts += 1;
                FAIL_SAFE_COMMAND
            }
            Some(reply) => match parse_reply(&reply) {
                Some(command) => command,
                None => {
                    self.stats.malformed += 1;
                    FAIL_SAFE_COMMAND
                }
            },
        }
    }
}

/// Opens the configured port and waits out the device reset.
///
/// Opening toggles DTR on most boards, which reboots the firmware; the
/// boot delay keeps the first cycles from racing the bootloader.
pub fn connect(
    config: &SerialConfig,
) -> Result<SerialController<Box<dyn serialport::SerialPort>>, LinkError> {
    let port = serialport::new(config.port.as_str(), config.baud)
        .timeout(Duration::from_millis(config.reply_timeout_ms))
        .open()
        .map_err(|source| LinkError::Open {
            port: config.port.clone(),
            source,
        })?;

    thread::sleep(Duration::from_secs_f64(config.boot_delay_s));

    Ok(SerialController::new(port))
}

/// Runs the full simulation against the hardware controller configured
/// under `[serial]`, returning the telemetry and the link fault counts.
pub fn run_simulation(
    config: &SimulationConfig,
) -> Result<(SimulationRecorder, LinkStats), LinkError> {
    let mut controller = connect(&config.serial)?;
    let recorder = common::run_simulation(config, &mut controller);
    let stats = controller.stats();
    Ok((recorder, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// In-memory transport with scripted replies.
    struct ScriptedTransport {
        written: Vec<u8>,
        replies: VecDeque<Option<Vec<u8>>>,
        pending: VecDeque<u8>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Option<&str>>) -> Self {
            Self {
                written: Vec::new(),
                replies: replies
                    .into_iter()
                    .map(|r| r.map(|s| s.as_bytes().to_vec()))
                    .collect(),
                pending: VecDeque::new(),
            }
        }
    }

    impl Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
            }
            buf[0] = self.pending.pop_front().unwrap();
            Ok(1)
        }
    }

    impl Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            if buf.ends_with(b"\n") {
                // One request consumed: queue the next scripted reply,
                // a None models a device that never answers
                if let Some(Some(reply)) = self.replies.pop_front() {
                    self.pending.extend(reply);
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn requests_use_lowercase_comma_separated_tokens() {
        let transport = ScriptedTransport::new(vec![Some("1\n")]);
        let mut controller = SerialController::new(transport);

        assert_eq!(controller.step(true, false, true), 1);
        assert_eq!(&controller.transport.written, b"true,false,true\n");
    }

    #[test]
    fn negative_commands_parse() {
        let transport = ScriptedTransport::new(vec![Some("-1\n")]);
        let mut controller = SerialController::new(transport);
        assert_eq!(controller.step(false, false, false), -1);
        assert_eq!(controller.stats().fault_ticks(), 0);
    }

    #[test]
    fn carriage_returns_are_tolerated() {
        let transport = ScriptedTransport::new(vec![Some("1\r\n")]);
        let mut controller = SerialController::new(transport);
        assert_eq!(controller.step(true, false, false), 1);
    }

    #[test]
    fn timeout_yields_the_fail_safe_command() {
        let transport = ScriptedTransport::new(vec![None, Some("1\n")]);
        let mut controller = SerialController::new(transport);

        assert_eq!(controller.step(true, false, false), 0);
        assert_eq!(controller.stats().timeouts, 1);

        // The next cycle proceeds normally
        assert_eq!(controller.step(false, false, false), 1);
        assert_eq!(controller.stats().fault_ticks(), 1);
    }

    #[test]
    fn malformed_replies_yield_the_fail_safe_command() {
        let transport = ScriptedTransport::new(vec![Some("garbage\n"), Some("\n")]);
        let mut controller = SerialController::new(transport);

        assert_eq!(controller.step(true, false, false), 0);
        assert_eq!(controller.step(true, false, false), 0);
        assert_eq!(controller.stats().malformed, 2);
    }

    #[test]
    fn parse_reply_accepts_only_signed_integers() {
        assert_eq!(parse_reply(b"1"), Some(1));
        assert_eq!(parse_reply(b"-1"), Some(-1));
        assert_eq!(parse_reply(b" 0 "), Some(0));
        assert_eq!(parse_reply(b""), None);
        assert_eq!(parse_reply(b"1.5"), None);
        assert_eq!(parse_reply(b"open"), None);
        assert_eq!(parse_reply(&[0xff, 0xfe]), None);
    }
}
