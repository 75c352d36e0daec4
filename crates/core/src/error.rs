#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The metric provider call itself failed.
    #[error("Metric provider failure: {0}")]
    Provider(String),

    /// The provider returned output that could not be parsed as a load
    /// figure. Never coerced into a numeric default; a fabricated reading
    /// could mask a real problem on the monitored host.
    #[error("Unparsable load reading: {0}")]
    Malformed(String),
}
