//! Compute request helpers

use cloudgate_transport::{Request, Requester, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::providers::common::raw_error;
use crate::traits::{ErrorContext, ProviderErrorMapper};

use super::ComputeApi;

impl ComputeApi {
    /// Send a request; fails unless the status is 2xx
    pub(crate) async fn execute(&self, request: Request, context: ErrorContext) -> Result<Response> {
        log::debug!("[{}] {} {}", self.provider, request.method, request.path);

        let response = self
            .connection
            .request(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        log::debug!("[{}] Response Status: {}", self.provider, response.status());
        if response.is_success() {
            return Ok(response);
        }

        let raw = raw_error(&response);
        log::warn!("[{}] HTTP {}: {}", self.provider, response.status(), raw.message);
        Err(self.map_error(raw, context))
    }

    /// `GET` and decode
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .execute(Request::get(path), ErrorContext::default())
            .await?;
        response.json().map_err(|e| self.transport_error(e))
    }

    /// `POST` a JSON body
    pub(crate) async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        context: ErrorContext,
    ) -> Result<Response> {
        let request = Request::post(path)
            .json(body)
            .map_err(|e| self.transport_error(e))?;
        self.execute(request, context).await
    }
}
