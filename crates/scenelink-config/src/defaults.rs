use crate::endpoint::ListenEndpoint;

/// Well-known TCP port automation clients connect to.
pub const DEFAULT_PORT: u16 = 55557;

/// Bind to every IPv4 interface unless told otherwise.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default bound on the bridge rendezvous.
pub const DEFAULT_INVOCATION_TIMEOUT_MS: u64 = 30_000;

/// Default poll loop sleep when idle.
pub const DEFAULT_IDLE_POLL_MS: u64 = 10;

/// Default request line limit (1 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Endpoint used when nothing else is configured.
pub fn default_listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::new(DEFAULT_LISTEN_HOST, DEFAULT_PORT)
}

/// Default bridge timeout in milliseconds.
pub fn default_invocation_timeout_ms() -> u64 {
    DEFAULT_INVOCATION_TIMEOUT_MS
}

/// Default idle poll interval in milliseconds.
pub fn default_idle_poll_ms() -> u64 {
    DEFAULT_IDLE_POLL_MS
}

/// Default request line limit in bytes.
pub fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}
