/// Stream configuration (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Application-defined stream kind tag, opaque to this engine.
    pub stream_type: u16,
    pub buffer_size: usize,
    pub max_message_size: usize,
    pub poll_interval_ms: u64,
    pub idle_timeout_ms: u64,
    pub reconnect_timeout_ms: u64,
    /// Whether `send` should retry with exponential backoff on transport
    /// failure instead of surfacing the error immediately.
    pub auto_reconnect: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_type: 0,
            buffer_size: 64 * 1024,
            max_message_size: 16 * 1024,
            poll_interval_ms: 50,
            idle_timeout_ms: 30_000,
            reconnect_timeout_ms: 5_000,
            auto_reconnect: false,
        }
    }
}
