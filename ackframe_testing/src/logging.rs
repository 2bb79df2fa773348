use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use log::Level;
use logtest::Logger;
use rstest::fixture;

/// Exclusive handle to the process-wide captured log.
///
/// `logtest` installs a single global logger, so tests asserting on log
/// output serialise through this guard. Records left by earlier holders are
/// discarded on acquisition.
pub struct LogCapture {
    guard: MutexGuard<'static, Logger>,
}

impl LogCapture {
    /// Acquire the captured log, clearing anything already recorded.
    pub fn acquire() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let guard = logger.lock().unwrap_or_else(PoisonError::into_inner);
        let mut capture = Self { guard };
        capture.clear();
        capture
    }

    /// Discard every captured record.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Drain the captured records logged at `level`, returning their messages.
    pub fn drain_at(&mut self, level: Level) -> Vec<String> {
        let mut messages = Vec::new();
        while let Some(record) = self.guard.pop() {
            if record.level() == level {
                messages.push(record.args().to_owned());
            }
        }
        messages
    }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn log_capture() -> LogCapture { LogCapture::acquire() }
