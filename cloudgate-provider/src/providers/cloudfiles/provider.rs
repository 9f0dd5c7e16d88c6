//! Cloud Files `StorageDriver` implementation

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use cloudgate_transport::{
    CHUNK_SIZE, ChunkStream, DownloadOptions, Request, Response, StatusCode, save_to_file,
};

use crate::error::{ProviderError, Result};
use crate::providers::common::{header_string, header_u64, path_segment};
use crate::traits::{ErrorContext, ProviderErrorMapper, StorageDriver};
use crate::types::{
    AccountMetadata, Container, ProviderFeatures, ProviderMetadata, ServiceKind, StorageObject,
};

use super::{
    CloudFilesContainer, CloudFilesDriver, CloudFilesObject, MAX_CONTAINER_NAME_LEN,
    OBJECT_META_PREFIX,
};

impl CloudFilesDriver {
    /// Strip a leading `/` and reject names the API would refuse
    pub(crate) fn clean_container_name(&self, name: &str) -> Result<String> {
        let name = name.strip_prefix('/').unwrap_or(name);
        let invalid = |detail: &str| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: "container_name".to_string(),
            detail: detail.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("Container name is empty"));
        }
        if name.contains('/') {
            return Err(invalid("Container name must not contain '/'"));
        }
        if name.len() > MAX_CONTAINER_NAME_LEN {
            return Err(invalid(&format!(
                "Container name is longer than {MAX_CONTAINER_NAME_LEN} bytes"
            )));
        }
        Ok(name.to_string())
    }

    fn container_path(&self, name: &str) -> Result<String> {
        Ok(format!(
            "/{}",
            path_segment(name, "container_name", self.provider_name())?
        ))
    }

    fn object_path(&self, container: &str, object: &str) -> Result<String> {
        Ok(format!(
            "/{}/{}",
            path_segment(container, "container_name", self.provider_name())?,
            path_segment(object, "object_name", self.provider_name())?
        ))
    }

    /// File path for a download into `destination`
    ///
    /// Only plain relative names are joined onto a directory, so a server
    /// supplied name cannot point outside it.
    fn download_target(
        &self,
        destination: &Path,
        object_name: &str,
        is_dir: bool,
    ) -> Result<PathBuf> {
        if !is_dir {
            return Ok(destination.to_path_buf());
        }
        let relative = Path::new(object_name);
        let plain = relative.components().next().is_some()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "object_name".to_string(),
                detail: format!(
                    "{object_name:?} cannot be used as a file name under the destination"
                ),
            });
        }
        Ok(destination.join(relative))
    }

    fn container_from_headers(name: &str, response: &Response) -> Container {
        Container {
            name: name.to_string(),
            object_count: header_u64(response, "x-container-object-count"),
            size: header_u64(response, "x-container-bytes-used"),
        }
    }

    fn object_from_headers(container: &str, name: &str, response: &Response) -> StorageObject {
        let meta_data: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(key, value)| {
                let key = key.as_str().strip_prefix(OBJECT_META_PREFIX)?;
                Some((key.to_string(), value.to_str().ok()?.to_string()))
            })
            .collect();

        StorageObject {
            name: name.to_string(),
            container: container.to_string(),
            size: header_u64(response, "content-length"),
            hash: None,
            etag: header_string(response, "etag"),
            content_type: header_string(response, "content-type"),
            last_modified: header_string(response, "last-modified"),
            meta_data,
        }
    }

    fn object_from_listing(container: &str, obj: CloudFilesObject) -> StorageObject {
        StorageObject {
            name: obj.name,
            container: container.to_string(),
            size: obj.bytes,
            hash: obj.hash,
            etag: None,
            content_type: obj.content_type,
            last_modified: obj.last_modified,
            meta_data: HashMap::new(),
        }
    }

    /// `GET` the object body without buffering it
    async fn object_body(&self, object: &StorageObject) -> Result<Response> {
        let response = self
            .send(Request::get(self.object_path(&object.container, &object.name)?).raw())
            .await?;
        if response.status() == StatusCode::OK {
            Ok(response)
        } else {
            Err(self.failure(
                &response,
                ErrorContext::object(&object.container, &object.name),
            ))
        }
    }
}

#[async_trait]
impl StorageDriver for CloudFilesDriver {
    fn id(&self) -> &'static str {
        "cloudfiles"
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: "cloudfiles".to_string(),
            service: ServiceKind::Storage,
            name: "Rackspace Cloud Files".to_string(),
            description: "Object storage with chunked streaming downloads".to_string(),
            region: None,
            features: ProviderFeatures {
                async_jobs: false,
                streaming_download: true,
                floating_ips: false,
            },
        }
    }

    async fn get_meta_data(&self) -> Result<AccountMetadata> {
        let response = self.send(Request::head("")).await?;
        if !response.is_success() {
            return Err(self.failure(&response, ErrorContext::default()));
        }
        Ok(AccountMetadata {
            container_count: header_u64(&response, "x-account-container-count"),
            object_count: header_u64(&response, "x-account-object-count"),
            bytes_used: header_u64(&response, "x-account-bytes-used"),
        })
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        let response = self.send(Request::get("")).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            StatusCode::OK => {
                let containers: Vec<CloudFilesContainer> = self.listing(&response)?;
                Ok(containers
                    .into_iter()
                    .map(|c| Container {
                        name: c.name,
                        object_count: c.count,
                        size: c.bytes,
                    })
                    .collect())
            }
            _ => Err(self.failure(&response, ErrorContext::default())),
        }
    }

    async fn list_container_objects(&self, container_name: &str) -> Result<Vec<StorageObject>> {
        let name = self.clean_container_name(container_name)?;
        let response = self.send(Request::get(self.container_path(&name)?)).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            StatusCode::OK => {
                let objects: Vec<CloudFilesObject> = self.listing(&response)?;
                Ok(objects
                    .into_iter()
                    .map(|obj| Self::object_from_listing(&name, obj))
                    .collect())
            }
            _ => Err(self.failure(&response, ErrorContext::container(&name))),
        }
    }

    async fn get_container(&self, container_name: &str) -> Result<Container> {
        let name = self.clean_container_name(container_name)?;
        let response = self.send(Request::head(self.container_path(&name)?)).await?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                Ok(Self::container_from_headers(&name, &response))
            }
            _ => Err(self.failure(&response, ErrorContext::container(&name))),
        }
    }

    async fn get_object(&self, container_name: &str, object_name: &str) -> Result<StorageObject> {
        let container = self.get_container(container_name).await?;
        let response = self
            .send(Request::head(self.object_path(&container.name, object_name)?))
            .await?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(Self::object_from_headers(
                &container.name,
                object_name,
                &response,
            )),
            _ => Err(self.failure(
                &response,
                ErrorContext::object(&container.name, object_name),
            )),
        }
    }

    async fn create_container(&self, container_name: &str) -> Result<Container> {
        let name = self.clean_container_name(container_name)?;
        let response = self.send(Request::put(self.container_path(&name)?)).await?;
        match response.status() {
            StatusCode::CREATED => {
                log::info!("[cloudfiles] Created container {name}");
                Ok(Container {
                    name,
                    object_count: 0,
                    size: 0,
                })
            }
            StatusCode::ACCEPTED => Err(ProviderError::ContainerAlreadyExists {
                provider: self.provider_name().to_string(),
                container: name,
            }),
            _ => Err(self.failure(&response, ErrorContext::container(&name))),
        }
    }

    async fn delete_container(&self, container: &Container) -> Result<()> {
        let name = self.clean_container_name(&container.name)?;
        let response = self.send(Request::delete(self.container_path(&name)?)).await?;
        if response.status() == StatusCode::NO_CONTENT {
            log::info!("[cloudfiles] Deleted container {name}");
            Ok(())
        } else {
            Err(self.failure(&response, ErrorContext::container(&name)))
        }
    }

    async fn delete_object(&self, object: &StorageObject) -> Result<()> {
        let response = self
            .send(Request::delete(self.object_path(&object.container, &object.name)?))
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(self.failure(
                &response,
                ErrorContext::object(&object.container, &object.name),
            ))
        }
    }

    async fn download_object(
        &self,
        object: &StorageObject,
        destination: &Path,
        options: DownloadOptions,
    ) -> Result<PathBuf> {
        let is_dir = tokio::fs::metadata(destination)
            .await
            .is_ok_and(|meta| meta.is_dir());
        let target = self.download_target(destination, &object.name, is_dir)?;

        let response = self.object_body(object).await?;
        let written = save_to_file(
            response.into_chunks(CHUNK_SIZE),
            &target,
            Some(object.size),
            options,
        )
        .await
        .map_err(|e| self.transport_error(e))?;

        log::info!(
            "[cloudfiles] Downloaded {}/{} ({written} bytes) to {}",
            object.container,
            object.name,
            target.display()
        );
        Ok(target)
    }

    async fn object_as_stream(
        &self,
        object: &StorageObject,
        chunk_size: Option<usize>,
    ) -> Result<ChunkStream> {
        let response = self.object_body(object).await?;
        Ok(response.into_chunks(chunk_size.unwrap_or(CHUNK_SIZE)))
    }
}
