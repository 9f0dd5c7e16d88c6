//! Cloud Files error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudFilesDriver;

/// Cloud Files reports failures through the status code; bodies are plain text.
impl ProviderErrorMapper for CloudFilesDriver {
    fn provider_name(&self) -> &'static str {
        "cloudfiles"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match (raw.status, context) {
            (Some(401 | 403), _) => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: (!raw.message.is_empty()).then_some(raw.message),
            },

            (
                Some(404),
                ErrorContext {
                    container: Some(container),
                    object: Some(object),
                    ..
                },
            ) => ProviderError::ObjectNotFound {
                provider: self.provider_name().to_string(),
                container,
                object,
            },

            (
                Some(404),
                ErrorContext {
                    container: Some(container),
                    ..
                },
            ) => ProviderError::ContainerNotFound {
                provider: self.provider_name().to_string(),
                container,
            },

            // Only deleting a container answers 409
            (
                Some(409),
                ErrorContext {
                    container: Some(container),
                    object: None,
                    ..
                },
            ) => ProviderError::ContainerNotEmpty {
                provider: self.provider_name().to_string(),
                container,
            },

            (Some(_), _) => self.unexpected_status(raw),

            (None, _) => self.unknown_error(raw),
        }
    }
}
