//! Compute error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::ComputeApi;

/// Nova wraps errors as `{"itemNotFound": {"code": 404, "message": ...}}`;
/// the transport has already flattened that into code and message.
impl ProviderErrorMapper for ComputeApi {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match (raw.status, context.floating_ip) {
            (Some(401 | 403), _) => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: (!raw.message.is_empty()).then_some(raw.message),
            },

            (Some(404), Some(ip)) => ProviderError::FloatingIpNotFound {
                provider: self.provider_name().to_string(),
                ip,
            },

            (Some(400), _) => ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "request".to_string(),
                detail: raw.message,
            },

            (Some(_), _) if raw.code.is_some() => self.unknown_error(raw),

            (Some(_), _) => self.unexpected_status(raw),

            (None, _) => self.unknown_error(raw),
        }
    }
}
