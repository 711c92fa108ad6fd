use std::error::Error as _;

use thiserror::Error;

/// Classification of a connection-level failure, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    ConnectionRefused,
    ConnectionReset,
    Dns,
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransportKind::Timeout => "timeout",
            TransportKind::ConnectionRefused => "connection-refused",
            TransportKind::ConnectionReset => "connection-reset",
            TransportKind::Dns => "dns",
            TransportKind::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum ResearchError {
    /// Rejected before any network call.
    #[error("invalid research request: {0}")]
    Validation(String),

    /// Opening the remote conversation failed. Terminal: no thread, no
    /// retry.
    #[error("failed to open research thread ({kind}): {message}")]
    ThreadCreation { kind: TransportKind, message: String },

    /// Submitting the run against an open thread failed. Terminal.
    #[error("failed to submit research run ({kind}): {message}")]
    RunSubmission { kind: TransportKind, message: String },

    /// The endpoint answered with a non-success status.
    #[error("research endpoint returned HTTP {code}: {message}")]
    Upstream { code: u16, message: String },

    /// Transport failure on the stream itself.
    #[error("research stream failed: {0}")]
    Stream(String),

    /// The agent emitted an error event.
    #[error("research agent reported an error: {0}")]
    Agent(String),

    /// Deadline fired before anything usable arrived. A deadline with a
    /// captured partial answer is a success, not this error.
    #[error("research timed out before any content was produced")]
    TimedOutEmpty,
}

/// Map a reqwest failure to a transport classification by walking its
/// source chain down to the io error.
pub(crate) fn classify_transport(e: &reqwest::Error) -> TransportKind {
    if e.is_timeout() {
        return TransportKind::Timeout;
    }

    let mut source = e.source();
    while let Some(s) = source {
        if let Some(io) = s.downcast_ref::<std::io::Error>() {
            return match io.kind() {
                std::io::ErrorKind::ConnectionRefused => TransportKind::ConnectionRefused,
                std::io::ErrorKind::ConnectionReset => TransportKind::ConnectionReset,
                std::io::ErrorKind::TimedOut => TransportKind::Timeout,
                _ => TransportKind::Other,
            };
        }
        source = s.source();
    }

    if e.to_string().to_lowercase().contains("dns") {
        TransportKind::Dns
    } else {
        TransportKind::Other
    }
}
