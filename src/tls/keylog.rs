//! NSS key-log output for inspecting captured TLS traffic.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::Mutex,
};

use log::warn;
use rustls::KeyLog;

/// Appends TLS secrets in NSS key-log format to an explicit file.
///
/// Install it on a client or server configuration through its `key_log`
/// field. Only intended for debugging; the file lets anyone holding a capture
/// decrypt it.
#[derive(Debug)]
pub struct KeyLogWriter {
    file: Mutex<File>,
}

impl KeyLogWriter {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns any error raised while opening the file.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl KeyLog for KeyLogWriter {
    fn log(&self, label: &str, client_random: &[u8], secret: &[u8]) {
        let line = format!(
            "{label} {} {}\n",
            hex::encode(client_random),
            hex::encode(secret)
        );
        let Ok(mut file) = self.file.lock() else {
            warn!("key log file lock poisoned; dropping {label}");
            return;
        };
        if let Err(err) = file.write_all(line.as_bytes()) {
            warn!("failed to write key log entry: error={err}");
        }
    }
}
