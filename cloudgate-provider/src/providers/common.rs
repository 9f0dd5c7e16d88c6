//! Helpers shared by the driver implementations

use cloudgate_transport::{
    AuthConnection, AuthScheme, Credentials, Outcome, ParsedBody, Response, Url,
};
use serde::{Deserialize, Deserializer};

use crate::error::{ProviderError, Result};
use crate::traits::RawApiError;
use crate::types::{DriverOptions, RecordType, Region};

// ============ Auth endpoints ============

/// US auth endpoint
pub(crate) const AUTH_URL_US: &str = "https://auth.api.rackspacecloud.com";
/// UK auth endpoint
pub(crate) const AUTH_URL_UK: &str = "https://lon.auth.api.rackspacecloud.com";

/// Auth endpoint for `options`: the explicit override, else the region default.
pub(crate) fn auth_url(options: &DriverOptions, provider: &str) -> Result<Url> {
    if let Some(url) = &options.auth_url {
        return Ok(url.clone());
    }
    let default = match options.region {
        Region::Us => AUTH_URL_US,
        Region::Uk => AUTH_URL_UK,
    };
    Url::parse(default).map_err(|e| ProviderError::InvalidParameter {
        provider: provider.to_string(),
        param: "auth_url".to_string(),
        detail: e.to_string(),
    })
}

/// Authenticating connection for `scheme` with the options' security mode.
pub(crate) fn auth_connection(
    credentials: Credentials,
    scheme: AuthScheme,
    options: &DriverOptions,
) -> AuthConnection {
    AuthConnection::new(
        credentials,
        scheme,
        options.secure,
        options.connection.clone(),
    )
}

// ============ Response helpers ============

/// Describe a failed response for error mapping.
///
/// A structured error body supplies code and message; otherwise the message
/// is the (trimmed) text body.
pub(crate) fn raw_error(response: &Response) -> RawApiError {
    let status = response.status().as_u16();
    let raw = match response.classify() {
        Outcome::StructuredError(api) => {
            let message = api.to_string();
            match api.code {
                Some(code) => RawApiError::with_code(code, message),
                None => RawApiError::new(message),
            }
        }
        _ => RawApiError::new(match response.parsed() {
            Ok(ParsedBody::Text(text)) => text.trim().to_string(),
            Ok(ParsedBody::Json(value)) => value.to_string(),
            _ => String::new(),
        }),
    };
    raw.status(status)
}

/// Numeric header value, `0` when absent or not a number.
pub(crate) fn header_u64(response: &Response, name: &str) -> u64 {
    response
        .header(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

/// Header value as an owned string.
pub(crate) fn header_string(response: &Response, name: &str) -> Option<String> {
    response.header(name).map(String::from)
}

/// Resource IDs come back as JSON numbers or strings depending on the API.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

// ============ Paths ============

/// Percent-encode a caller or server supplied name as one path segment.
///
/// `/` is encoded too, so a name never spans segments; `.` and `..` are
/// rejected because URL normalization would resolve them.
pub(crate) fn path_segment(value: &str, param: &str, provider: &str) -> Result<String> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: param.to_string(),
            detail: format!("{value:?} is not usable as a path segment"),
        });
    }
    Ok(urlencoding::encode(value).into_owned())
}

// ============ Record type conversion ============

/// Parse an API record type string
pub(crate) fn parse_record_type(record_type: &str, provider: &str) -> Result<RecordType> {
    match record_type.to_uppercase().as_str() {
        "A" => Ok(RecordType::A),
        "AAAA" => Ok(RecordType::Aaaa),
        "CNAME" => Ok(RecordType::Cname),
        "MX" => Ok(RecordType::Mx),
        "NS" => Ok(RecordType::Ns),
        "TXT" => Ok(RecordType::Txt),
        "SRV" => Ok(RecordType::Srv),
        _ => Err(ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: "record_type".to_string(),
            detail: format!("Unsupported record type: {record_type}"),
        }),
    }
}

/// `RecordType` as the upper-case API string
pub(crate) fn record_type_to_string(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::A => "A",
        RecordType::Aaaa => "AAAA",
        RecordType::Cname => "CNAME",
        RecordType::Mx => "MX",
        RecordType::Ns => "NS",
        RecordType::Txt => "TXT",
        RecordType::Srv => "SRV",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cloudgate_transport::StatusCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn auth_url_defaults_by_region() {
        let us = auth_url(&DriverOptions::default(), "t").unwrap();
        assert_eq!(us.host_str(), Some("auth.api.rackspacecloud.com"));

        let uk = auth_url(&DriverOptions::default().region(Region::Uk), "t").unwrap();
        assert_eq!(uk.host_str(), Some("lon.auth.api.rackspacecloud.com"));
    }

    #[test]
    fn auth_url_override_wins() {
        let custom = Url::parse("http://127.0.0.1:8080").unwrap();
        let options = DriverOptions::default()
            .region(Region::Uk)
            .auth_url(custom.clone());
        assert_eq!(auth_url(&options, "t").unwrap(), custom);
    }

    #[test]
    fn raw_error_from_structured_body() {
        let resp = Response::from_json(
            StatusCode::BAD_REQUEST,
            &json!({"code": 400, "message": "Bad request", "details": "Invalid TTL"}),
        );
        let raw = raw_error(&resp);
        assert_eq!(raw.status, Some(400));
        assert_eq!(raw.code.as_deref(), Some("400"));
        assert_eq!(raw.message, "400 - Bad request (Invalid TTL)");
    }

    #[test]
    fn raw_error_from_text_body() {
        let resp = Response::new(
            StatusCode::SERVICE_UNAVAILABLE,
            cloudgate_transport::header::HeaderMap::new(),
            "  down for maintenance\n",
        );
        let raw = raw_error(&resp);
        assert_eq!(raw.status, Some(503));
        assert_eq!(raw.code, None);
        assert_eq!(raw.message, "down for maintenance");
    }

    #[test]
    fn raw_error_from_validation_errors_has_no_code() {
        let resp = Response::from_json(
            StatusCode::BAD_REQUEST,
            &json!({"validationErrors": {"messages": ["Record name is invalid"]}}),
        );
        let raw = raw_error(&resp);
        assert_eq!(raw.status, Some(400));
        assert_eq!(raw.code, None);
        assert_eq!(raw.message, "Validation errors: Record name is invalid");
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(path_segment("db.tar", "object_name", "t").unwrap(), "db.tar");
        assert_eq!(
            path_segment("../logs/app.log", "object_name", "t").unwrap(),
            "..%2Flogs%2Fapp.log"
        );
        assert_eq!(path_segment("a b?c", "object_name", "t").unwrap(), "a%20b%3Fc");
    }

    #[test]
    fn dot_segments_are_rejected() {
        for name in ["", ".", ".."] {
            let err = path_segment(name, "zone_id", "t").unwrap_err();
            assert!(matches!(
                err,
                ProviderError::InvalidParameter { ref param, .. } if param == "zone_id"
            ));
        }
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        #[derive(Deserialize)]
        struct Item {
            #[serde(deserialize_with = "deserialize_id")]
            id: String,
        }

        let numeric: Item = serde_json::from_value(json!({"id": 2_946_063})).unwrap();
        assert_eq!(numeric.id, "2946063");
        let text: Item = serde_json::from_value(json!({"id": "A-6817754"})).unwrap();
        assert_eq!(text.id, "A-6817754");
    }

    #[test]
    fn record_type_round_trip() {
        for s in ["A", "AAAA", "CNAME", "MX", "NS", "TXT", "SRV"] {
            let t = parse_record_type(s, "t").unwrap();
            assert_eq!(record_type_to_string(t), s);
        }
        assert!(parse_record_type("ptr", "t").is_err());
        assert_eq!(parse_record_type("cname", "t").unwrap(), RecordType::Cname);
    }
}
