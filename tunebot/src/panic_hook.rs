//! Process-wide panic reporting.
//!
//! Panics are logged through `tracing`. Release builds abort on panic, so the
//! record is also appended straight to today's log file: the non-blocking
//! writer may not get to flush before the process dies.

use std::backtrace::Backtrace;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Local;

use crate::logging::LOG_FILE_PREFIX;

/// Everything worth keeping about one panic.
struct PanicRecord {
    timestamp: String,
    thread: String,
    location: String,
    message: String,
    backtrace: Backtrace,
}

impl PanicRecord {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        Self {
            timestamp: Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
                .to_string(),
            thread: thread::current()
                .name()
                .unwrap_or("<unnamed>")
                .to_string(),
            location: info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: payload_message(info),
            backtrace: Backtrace::force_capture(),
        }
    }
}

impl fmt::Display for PanicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} PANIC thread={} location={} payload={}\nBacktrace:\n{}",
            self.timestamp, self.thread, self.location, self.message, self.backtrace
        )
    }
}

/// Install the panic hook, chaining to whatever hook was set before.
pub fn install(log_dir: impl AsRef<Path>) {
    let log_dir = log_dir.as_ref().to_path_buf();
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        // A panic inside the hook must not mask the original one.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let record = PanicRecord::capture(info).to_string();
            tracing::error!(target: "tunebot::panic", "{record}");

            if cfg!(panic = "abort") {
                let _ = append_to_daily_log(&log_dir, &record);
            }
        }));

        previous(info);
    }));
}

/// Path of today's file as named by the daily rolling appender.
fn daily_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!(
        "{}.{}",
        LOG_FILE_PREFIX,
        Local::now().format("%Y-%m-%d")
    ))
}

fn append_to_daily_log(log_dir: &Path, record: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(daily_log_path(log_dir))?;
    writeln!(file, "{record}")?;
    file.flush()
}

fn payload_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        info.to_string()
    }
}
