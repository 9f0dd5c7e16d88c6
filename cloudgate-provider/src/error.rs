use serde::{Deserialize, Serialize};

use cloudgate_transport::Error as TransportError;

/// Unified error type for all driver operations.
///
/// Each variant includes a `provider` field identifying which driver produced
/// the error, plus variant-specific context. All variants are serializable for
/// structured error reporting.
///
/// # Transient Errors
///
/// [`NetworkError`](Self::NetworkError) and [`Timeout`](Self::Timeout) may
/// succeed when retried. Drivers never retry on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The request or an async job exceeded its time budget.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The server certificate failed chain or hostname verification.
    TlsVerification {
        /// Provider that produced the error.
        provider: String,
        /// Verifier output.
        detail: String,
    },

    /// The credentials were rejected or the auth answer was incomplete.
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message, if available.
        raw_message: Option<String>,
    },

    /// Failed to parse the provider's API response.
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// An asynchronous job finished in the `ERROR` state.
    AsyncJobFailed {
        /// Provider that produced the error.
        provider: String,
        /// Job identifier.
        job_id: String,
        /// Error message reported by the job.
        raw_message: String,
    },

    /// The container does not exist.
    ContainerNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Container name.
        container: String,
    },

    /// A container with this name already exists.
    ContainerAlreadyExists {
        /// Provider that produced the error.
        provider: String,
        /// Container name.
        container: String,
    },

    /// Only empty containers can be deleted.
    ContainerNotEmpty {
        /// Provider that produced the error.
        provider: String,
        /// Container name.
        container: String,
    },

    /// The object does not exist.
    ObjectNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Container holding the object.
        container: String,
        /// Object name.
        object: String,
    },

    /// The DNS zone does not exist.
    ZoneNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Zone ID.
        zone_id: String,
        /// Original error message, if available.
        raw_message: Option<String>,
    },

    /// The DNS record does not exist.
    RecordNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Record ID.
        record_id: String,
        /// Original error message, if available.
        raw_message: Option<String>,
    },

    /// No floating IP with this address exists.
    FloatingIpNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Address or ID that was looked up.
        ip: String,
    },

    /// A request parameter is invalid.
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The API answered with a status the operation does not expect.
    UnexpectedStatus {
        /// Provider that produced the error.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Error text extracted from the body, if any.
        raw_message: Option<String>,
    },

    /// The driver does not implement the requested capability.
    Unsupported {
        /// Provider that produced the error.
        provider: String,
        /// Capability name.
        feature: String,
    },

    /// Local file system failure (downloads).
    Io {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// An unrecognized error from the provider API.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// Map a transport failure into the driver error space.
    pub fn from_transport(provider: &str, err: TransportError) -> Self {
        let provider = provider.to_string();
        match err {
            TransportError::Connection { detail, .. } => Self::NetworkError { provider, detail },
            TransportError::Timeout { detail, .. } => Self::Timeout { provider, detail },
            TransportError::TlsVerification { host, detail } => Self::TlsVerification {
                provider,
                detail: format!("{host}: {detail}"),
            },
            TransportError::InvalidCredentials(msg) => Self::InvalidCredentials {
                provider,
                raw_message: Some(msg),
            },
            TransportError::MalformedResponse(detail) => Self::ParseError { provider, detail },
            TransportError::AsyncJobFailed { job_id, message } => Self::AsyncJobFailed {
                provider,
                job_id,
                raw_message: message,
            },
            e @ TransportError::PollTimeout { .. } => Self::Timeout {
                provider,
                detail: e.to_string(),
            },
            e @ TransportError::Cancelled { .. } => Self::Unknown {
                provider,
                raw_code: Some("Cancelled".to_string()),
                raw_message: e.to_string(),
            },
            TransportError::Configuration(detail) => Self::InvalidParameter {
                provider,
                param: "configuration".to_string(),
                detail,
            },
            e @ (TransportError::Io(_) | TransportError::IncompleteTransfer { .. }) => Self::Io {
                provider,
                detail: e.to_string(),
            },
        }
    }

    /// Whether this is an expected outcome (user input, missing resource, etc.),
    /// used to pick the log level.
    ///
    /// `true` should be logged at `warn`, `false` at `error`.
    /// **Keep in sync when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::AsyncJobFailed { .. }
                | Self::ContainerNotFound { .. }
                | Self::ContainerAlreadyExists { .. }
                | Self::ContainerNotEmpty { .. }
                | Self::ObjectNotFound { .. }
                | Self::ZoneNotFound { .. }
                | Self::RecordNotFound { .. }
                | Self::FloatingIpNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::Unsupported { .. }
        )
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::TlsVerification { provider, detail } => {
                write!(f, "[{provider}] TLS verification failed: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{provider}] Invalid credentials")
                }
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::AsyncJobFailed {
                provider,
                job_id,
                raw_message,
            } => {
                write!(f, "[{provider}] Job {job_id} failed: {raw_message}")
            }
            Self::ContainerNotFound {
                provider,
                container,
            } => {
                write!(f, "[{provider}] Container '{container}' not found")
            }
            Self::ContainerAlreadyExists {
                provider,
                container,
            } => {
                write!(f, "[{provider}] Container '{container}' already exists")
            }
            Self::ContainerNotEmpty {
                provider,
                container,
            } => {
                write!(f, "[{provider}] Container '{container}' is not empty")
            }
            Self::ObjectNotFound {
                provider,
                container,
                object,
            } => {
                write!(f, "[{provider}] Object '{container}/{object}' not found")
            }
            Self::ZoneNotFound {
                provider,
                zone_id,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Zone '{zone_id}' not found: {msg}")
                } else {
                    write!(f, "[{provider}] Zone '{zone_id}' not found")
                }
            }
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => {
                write!(f, "[{provider}] Record '{record_id}' not found")
            }
            Self::FloatingIpNotFound { provider, ip } => {
                write!(f, "[{provider}] Floating IP '{ip}' not found")
            }
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => {
                write!(f, "[{provider}] Invalid parameter '{param}': {detail}")
            }
            Self::UnexpectedStatus {
                provider,
                status,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Unexpected status code {status}: {msg}")
                } else {
                    write!(f, "[{provider}] Unexpected status code {status}")
                }
            }
            Self::Unsupported { provider, feature } => {
                write!(f, "[{provider}] {feature} is not supported")
            }
            Self::Io { provider, detail } => {
                write!(f, "[{provider}] I/O error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => {
                write!(f, "[{provider}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn display_network_error() {
        let e = ProviderError::NetworkError {
            provider: "cloudfiles".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "[cloudfiles] Network error: connection refused");
    }

    #[test]
    fn display_object_not_found() {
        let e = ProviderError::ObjectNotFound {
            provider: "cloudfiles".to_string(),
            container: "backups".to_string(),
            object: "db.tar".to_string(),
        };
        assert_eq!(e.to_string(), "[cloudfiles] Object 'backups/db.tar' not found");
    }

    #[test]
    fn display_zone_not_found_with_message() {
        let e = ProviderError::ZoneNotFound {
            provider: "rackspace_dns".to_string(),
            zone_id: "12345".to_string(),
            raw_message: Some("Object not Found.".to_string()),
        };
        assert_eq!(
            e.to_string(),
            "[rackspace_dns] Zone '12345' not found: Object not Found."
        );
    }

    #[test]
    fn display_unexpected_status() {
        let e = ProviderError::UnexpectedStatus {
            provider: "cloudfiles".to_string(),
            status: 500,
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[cloudfiles] Unexpected status code 500");
    }

    #[test]
    fn display_async_job_failed() {
        let e = ProviderError::AsyncJobFailed {
            provider: "rackspace_dns".to_string(),
            job_id: "abc".to_string(),
            raw_message: "Domain already exists".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[rackspace_dns] Job abc failed: Domain already exists"
        );
    }

    #[test]
    fn display_unsupported() {
        let e = ProviderError::Unsupported {
            provider: "rackspace_compute".to_string(),
            feature: "floating IPs".to_string(),
        };
        assert_eq!(e.to_string(), "[rackspace_compute] floating IPs is not supported");
    }

    #[test]
    fn serialize_json_tag() {
        let e = ProviderError::ContainerNotEmpty {
            provider: "cloudfiles".to_string(),
            container: "logs".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"ContainerNotEmpty\""));
        assert!(json.contains("\"container\":\"logs\""));
    }

    // ==================== from_transport ====================

    #[test]
    fn transport_connection_is_network_error() {
        let e = ProviderError::from_transport(
            "cloudfiles",
            TransportError::Connection {
                host: "storage.example.com".to_string(),
                detail: "refused".to_string(),
            },
        );
        assert!(matches!(e, ProviderError::NetworkError { ref detail, .. } if detail == "refused"));
        assert!(!e.is_expected());
    }

    #[test]
    fn transport_job_failure_keeps_message() {
        let e = ProviderError::from_transport(
            "rackspace_dns",
            TransportError::AsyncJobFailed {
                job_id: "j1".to_string(),
                message: "Validation failed".to_string(),
            },
        );
        assert!(matches!(
            e,
            ProviderError::AsyncJobFailed { ref job_id, ref raw_message, .. }
                if job_id == "j1" && raw_message == "Validation failed"
        ));
        assert!(e.is_expected());
    }

    #[test]
    fn transport_poll_timeout_is_timeout() {
        let e = ProviderError::from_transport(
            "rackspace_dns",
            TransportError::PollTimeout {
                job_id: "j1".to_string(),
                attempts: 3,
                elapsed: Duration::from_secs(3),
            },
        );
        assert!(matches!(e, ProviderError::Timeout { .. }));
    }

    #[test]
    fn transport_incomplete_transfer_is_io() {
        let e = ProviderError::from_transport(
            "cloudfiles",
            TransportError::IncompleteTransfer {
                expected: 1_160_520,
                written: 10,
            },
        );
        assert!(
            matches!(e, ProviderError::Io { ref detail, .. } if detail.contains("1160520")),
            "got {e:?}"
        );
    }

    #[test]
    fn transport_invalid_credentials() {
        let e = ProviderError::from_transport(
            "cloudfiles",
            TransportError::InvalidCredentials("Auth endpoint returned HTTP 401".to_string()),
        );
        assert_eq!(
            e.to_string(),
            "[cloudfiles] Invalid credentials: Auth endpoint returned HTTP 401"
        );
    }
}
