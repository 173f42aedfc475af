use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

/// Stored timestamp layout. Lexical order equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of "now" for server-maintained timestamps.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Wall clock in the server's local time zone.
pub fn system_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

pub fn format(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Clock that advances one second per reading, starting at `start`.
#[cfg(test)]
pub fn stepping_clock(start: &str) -> Clock {
    use std::sync::atomic::{AtomicI64, Ordering};

    let start = NaiveDateTime::parse_from_str(start, TIMESTAMP_FORMAT).unwrap();
    let ticks = AtomicI64::new(0);
    Arc::new(move || start + chrono::Duration::seconds(ticks.fetch_add(1, Ordering::SeqCst)))
}
