//! Cloud Files request helpers

use cloudgate_transport::{Request, Requester, Response};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::providers::common::raw_error;
use crate::traits::{ErrorContext, ProviderErrorMapper};

use super::CloudFilesDriver;

impl CloudFilesDriver {
    /// Send a request through the authenticated connection
    pub(crate) async fn send(&self, request: Request) -> Result<Response> {
        log::debug!("[cloudfiles] {} {}", request.method, request.path);

        let response = self
            .connection
            .request(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        log::debug!("[cloudfiles] Response Status: {}", response.status());
        Ok(response)
    }

    /// Decode a JSON listing body
    pub(crate) fn listing<T: DeserializeOwned>(&self, response: &Response) -> Result<Vec<T>> {
        response.json().map_err(|e| self.transport_error(e))
    }

    /// Map a failed response in the given context
    pub(crate) fn failure(&self, response: &Response, context: ErrorContext) -> ProviderError {
        let raw = raw_error(response);
        log::warn!(
            "[cloudfiles] HTTP {} ({})",
            response.status(),
            if raw.message.is_empty() { "no body" } else { raw.message.as_str() }
        );
        self.map_error(raw, context)
    }
}
