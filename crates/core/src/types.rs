/// All wire timestamps are UTC epoch milliseconds.
pub type EpochMillis = i64;

/// Current time as epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}
