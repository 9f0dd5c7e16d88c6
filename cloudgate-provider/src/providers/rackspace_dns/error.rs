//! Rackspace DNS error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::RackspaceDnsDriver;

/// Rackspace DNS error mapping
///
/// A 404 names no resource in its body, so the call's context decides between
/// zone and record. Bodies such as `{"code": 400, "message", "details"}` or
/// `{"validationErrors": {"messages": [...]}}` arrive pre-formatted in the raw
/// message. The API answers 400 "could not be understood" for duplicates too.
impl ProviderErrorMapper for RackspaceDnsDriver {
    fn provider_name(&self) -> &'static str {
        "rackspace_dns"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let message = (!raw.message.is_empty()).then(|| raw.message.clone());

        match raw.status {
            Some(401 | 403) => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: message,
            },

            Some(404) => match context {
                ErrorContext {
                    record_id: Some(record_id),
                    ..
                } => ProviderError::RecordNotFound {
                    provider: self.provider_name().to_string(),
                    record_id,
                    raw_message: message,
                },
                ErrorContext {
                    zone_id: Some(zone_id),
                    ..
                } => ProviderError::ZoneNotFound {
                    provider: self.provider_name().to_string(),
                    zone_id,
                    raw_message: message,
                },
                _ => self.unexpected_status(raw),
            },

            // Structured error bodies keep their code and text
            Some(_) if raw.code.is_some() || raw.status == Some(400) => self.unknown_error(raw),

            Some(_) => self.unexpected_status(raw),

            None => self.unknown_error(raw),
        }
    }
}
