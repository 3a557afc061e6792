use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod console;
pub mod health;
pub mod judge;
pub mod phase;
pub mod question;
pub mod session;
pub mod sse;
pub mod team;
pub mod validation;

pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
