use serde::{Deserialize, Serialize};

use crate::providers::common::deserialize_id;

// ============ Rackspace DNS API types ============

#[derive(Debug, Deserialize)]
pub struct RackspaceDomainList {
    #[serde(default)]
    pub domains: Vec<RackspaceDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RackspaceDomain {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ttl: u32,
    pub email_address: Option<String>,
    pub comment: Option<String>,
    pub records_list: Option<RackspaceRecordList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RackspaceRecordList {
    #[serde(default)]
    pub records: Vec<RackspaceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RackspaceRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: String,
    pub ttl: Option<u32>,
    pub comment: Option<String>,
}

/// Body of a completed job polled with `showDetails=true`
#[derive(Debug, Deserialize)]
pub struct JobResult<T> {
    pub response: T,
}

// ============ Request bodies ============

/// `{"domains": [...]}` request envelope
#[derive(Debug, Serialize)]
pub struct DomainsPayload<'a> {
    pub domains: Vec<NewDomain<'a>>,
}

/// `{"records": [...]}` request envelope
#[derive(Debug, Default, Serialize)]
pub struct RecordsPayload<'a> {
    pub records: Vec<NewRecord<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDomain<'a> {
    pub name: &'a str,
    pub email_address: &'a str,
    pub records_list: RecordsPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainChanges<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct NewRecord<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct RecordChanges<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}
