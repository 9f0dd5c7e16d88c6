//! Rackspace DNS `DnsDriver` implementation

use async_trait::async_trait;
use cloudgate_transport::Request;

use crate::error::{ProviderError, Result};
use crate::providers::common::{parse_record_type, path_segment, record_type_to_string};
use crate::traits::{DnsDriver, ErrorContext, ProviderErrorMapper};
use crate::types::{
    CreateRecordRequest, CreateZoneRequest, ProviderFeatures, ProviderMetadata, Record,
    ServiceKind, UpdateRecordRequest, UpdateZoneRequest, Zone,
};

use super::RackspaceDnsDriver;
use super::types::{
    DomainChanges, DomainsPayload, JobResult, NewDomain, NewRecord, RackspaceDomain,
    RackspaceDomainList, RackspaceRecord, RackspaceRecordList, RecordChanges, RecordsPayload,
};

/// Rackspace only serves primary zones
const ZONE_TYPE: &str = "master";

impl RackspaceDnsDriver {
    fn zone_path(&self, zone_id: &str) -> Result<String> {
        Ok(format!(
            "/domains/{}",
            path_segment(zone_id, "zone_id", self.provider_name())?
        ))
    }

    fn record_path(&self, zone_id: &str, record_id: &str) -> Result<String> {
        Ok(format!(
            "{}/records/{}",
            self.zone_path(zone_id)?,
            path_segment(record_id, "record_id", self.provider_name())?
        ))
    }

    pub(crate) fn to_zone(domain: RackspaceDomain) -> Zone {
        Zone {
            id: domain.id,
            domain: domain.name,
            zone_type: ZONE_TYPE.to_string(),
            ttl: domain.ttl,
            email: domain.email_address,
            comment: domain.comment,
        }
    }

    pub(crate) fn to_record(&self, record: RackspaceRecord, zone_id: &str) -> Result<Record> {
        Ok(Record {
            record_type: parse_record_type(&record.record_type, self.provider_name())?,
            id: record.id,
            name: record.name,
            data: record.data,
            zone_id: zone_id.to_string(),
            ttl: record.ttl,
            comment: record.comment,
        })
    }

    fn first<T>(&self, items: Vec<T>, what: &str) -> Result<T> {
        items
            .into_iter()
            .next()
            .ok_or_else(|| self.parse_error(format!("Job response lists no {what}")))
    }
}

#[async_trait]
impl DnsDriver for RackspaceDnsDriver {
    fn id(&self) -> &'static str {
        "rackspace_dns"
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: "rackspace_dns".to_string(),
            service: ServiceKind::Dns,
            name: "Rackspace Cloud DNS".to_string(),
            description: "Managed DNS; changes are applied through polled async jobs".to_string(),
            region: None,
            features: ProviderFeatures {
                async_jobs: true,
                streaming_download: false,
                floating_ips: false,
            },
        }
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let list: RackspaceDomainList = self
            .get(Request::get("/domains"), ErrorContext::default())
            .await?;
        Ok(list.domains.into_iter().map(Self::to_zone).collect())
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        let domain: RackspaceDomain = self
            .get(
                Request::get(self.zone_path(zone_id)?),
                ErrorContext::zone(zone_id),
            )
            .await?;
        Ok(Self::to_zone(domain))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>> {
        let domain: RackspaceDomain = self
            .get(
                Request::get(self.zone_path(zone_id)?).param("showRecord", "true"),
                ErrorContext::zone(zone_id),
            )
            .await?;

        domain
            .records_list
            .unwrap_or_default()
            .records
            .into_iter()
            .map(|r| self.to_record(r, zone_id))
            .collect()
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record> {
        let zone = self.get_zone(zone_id).await?;
        let record: RackspaceRecord = self
            .get(
                Request::get(self.record_path(&zone.id, record_id)?),
                ErrorContext::record(&zone.id, record_id),
            )
            .await?;
        self.to_record(record, &zone.id)
    }

    async fn create_zone(&self, req: &CreateZoneRequest) -> Result<Zone> {
        let email = req
            .email
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "email".to_string(),
                detail: "An email address is required to create a zone".to_string(),
            })?;

        let payload = DomainsPayload {
            domains: vec![NewDomain {
                name: &req.domain,
                email_address: email,
                records_list: RecordsPayload::default(),
                ttl: req.ttl,
                comment: req.comment.as_deref(),
            }],
        };
        let request = self.with_json(Request::post("/domains"), &payload)?;
        let response = self.execute_async(request, ErrorContext::default()).await?;

        let result: JobResult<RackspaceDomainList> = self.decode(&response)?;
        let zone = Self::to_zone(self.first(result.response.domains, "domains")?);
        log::info!("[rackspace_dns] Created zone {} ({})", zone.domain, zone.id);
        Ok(zone)
    }

    async fn update_zone(&self, zone: &Zone, req: &UpdateZoneRequest) -> Result<Zone> {
        if req.domain.as_deref().is_some_and(|d| d != zone.domain) {
            return Err(ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "domain".to_string(),
                detail: "Domain cannot be changed".to_string(),
            });
        }

        let changes = DomainChanges {
            ttl: req.ttl,
            email_address: req.email.as_deref(),
            comment: req.comment.as_deref(),
        };
        let request = self.with_json(Request::put(self.zone_path(&zone.id)?), &changes)?;
        self.execute_async(request, ErrorContext::zone(&zone.id))
            .await?;

        Ok(Zone {
            ttl: req.ttl.unwrap_or(zone.ttl),
            email: req.email.clone().or_else(|| zone.email.clone()),
            comment: req.comment.clone().or_else(|| zone.comment.clone()),
            ..zone.clone()
        })
    }

    async fn create_record(&self, zone: &Zone, req: &CreateRecordRequest) -> Result<Record> {
        let payload = RecordsPayload {
            records: vec![NewRecord {
                name: &req.name,
                record_type: record_type_to_string(req.record_type),
                data: &req.data,
                ttl: req.ttl,
                comment: req.comment.as_deref(),
            }],
        };
        let request = self.with_json(
            Request::post(format!("{}/records", self.zone_path(&zone.id)?)),
            &payload,
        )?;
        let response = self
            .execute_async(request, ErrorContext::zone(&zone.id))
            .await?;

        let result: JobResult<RackspaceRecordList> = self.decode(&response)?;
        let record = self.to_record(self.first(result.response.records, "records")?, &zone.id)?;
        log::info!(
            "[rackspace_dns] Created record {} {} in zone {}",
            record.name,
            record_type_to_string(record.record_type),
            zone.id
        );
        Ok(record)
    }

    async fn update_record(&self, record: &Record, req: &UpdateRecordRequest) -> Result<Record> {
        // The API requires the name even though it cannot change
        let changes = RecordChanges {
            name: &record.name,
            data: req.data.as_deref(),
            ttl: req.ttl,
            comment: req.comment.as_deref(),
        };
        let request = self.with_json(
            Request::put(self.record_path(&record.zone_id, &record.id)?),
            &changes,
        )?;
        self.execute_async(request, ErrorContext::record(&record.zone_id, &record.id))
            .await?;

        Ok(Record {
            data: req.data.clone().unwrap_or_else(|| record.data.clone()),
            ttl: req.ttl.or(record.ttl),
            comment: req.comment.clone().or_else(|| record.comment.clone()),
            ..record.clone()
        })
    }

    async fn delete_zone(&self, zone: &Zone) -> Result<()> {
        self.execute_async(
            Request::delete(self.zone_path(&zone.id)?),
            ErrorContext::zone(&zone.id),
        )
        .await?;
        log::info!("[rackspace_dns] Deleted zone {}", zone.id);
        Ok(())
    }

    async fn delete_record(&self, record: &Record) -> Result<()> {
        self.execute_async(
            Request::delete(self.record_path(&record.zone_id, &record.id)?),
            ErrorContext::record(&record.zone_id, &record.id),
        )
        .await?;
        log::info!("[rackspace_dns] Deleted record {}", record.id);
        Ok(())
    }
}
