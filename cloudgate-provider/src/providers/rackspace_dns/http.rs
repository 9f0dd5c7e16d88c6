//! Rackspace DNS request helpers

use cloudgate_transport::utils::log_sanitizer::truncate_for_log;
use cloudgate_transport::{Request, Requester, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::providers::common::raw_error;
use crate::traits::{ErrorContext, ProviderErrorMapper};

use super::RackspaceDnsDriver;

impl RackspaceDnsDriver {
    /// Synchronous call; fails unless the status is 2xx
    pub(crate) async fn execute(&self, request: Request, context: ErrorContext) -> Result<Response> {
        log::debug!("[rackspace_dns] {} {}", request.method, request.path);

        let response = self
            .connection
            .request(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        log::debug!("[rackspace_dns] Response Status: {}", response.status());
        self.check(response, context)
    }

    /// Submit a job and wait for it; returns the completed job body
    pub(crate) async fn execute_async(
        &self,
        request: Request,
        context: ErrorContext,
    ) -> Result<Response> {
        log::debug!("[rackspace_dns] {} {} (async)", request.method, request.path);

        let response = self
            .connection
            .async_request(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        self.check(response, context)
    }

    /// `GET` and decode
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        request: Request,
        context: ErrorContext,
    ) -> Result<T> {
        let response = self.execute(request, context).await?;
        self.decode(&response)
    }

    /// Attach a JSON body
    pub(crate) fn with_json<B: Serialize>(&self, request: Request, body: &B) -> Result<Request> {
        if log::log_enabled!(log::Level::Debug) {
            let body_json = serde_json::to_string_pretty(body)
                .unwrap_or_else(|_| "<unserializable body>".to_string());
            log::debug!("[rackspace_dns] Request Body: {}", truncate_for_log(&body_json));
        }
        request.json(body).map_err(|e| self.transport_error(e))
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self, response: &Response) -> Result<T> {
        response.json().map_err(|e| self.transport_error(e))
    }

    fn check(&self, response: Response, context: ErrorContext) -> Result<Response> {
        if response.is_success() {
            return Ok(response);
        }
        Err(self.failure(&response, context))
    }

    fn failure(&self, response: &Response, context: ErrorContext) -> ProviderError {
        let raw = raw_error(response);
        log::warn!(
            "[rackspace_dns] HTTP {}: {}",
            response.status(),
            if raw.message.is_empty() {
                "no body".to_string()
            } else {
                truncate_for_log(&raw.message)
            }
        );
        self.map_error(raw, context)
    }
}
