//! Wire protocol for the conversion service.
//!
//! Every message is one JSON header line followed by exactly `size` raw
//! bytes: the EXR payload after a convert request, the PNG payload after a
//! successful convert response. Health messages carry no payload.

use serde::{Deserialize, Serialize};

use crate::image_pipeline::tonemap::{ToneMapParameters, TransferEncoding};

/// Service this server identifies as in health responses.
pub const SERVICE_NAME: &str = "exr-extractor";

/// Request envelope (one JSON line)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServiceRequest {
    /// Convert the EXR payload following this header to PNG
    Convert {
        /// Byte length of the EXR payload following the header line
        size: u64,
        #[serde(default)]
        exposure_ev: f32,
        #[serde(default = "default_key")]
        key: f32,
        #[serde(default)]
        transfer: TransferEncoding,
    },
    /// Service liveness probe
    Health,
}

fn default_key() -> f32 {
    0.18
}

impl ServiceRequest {
    /// Tone mapping parameters carried by a convert request.
    pub fn tonemap_parameters(&self) -> Option<ToneMapParameters> {
        match self {
            ServiceRequest::Convert {
                exposure_ev,
                key,
                transfer,
                ..
            } => Some(ToneMapParameters {
                exposure_ev: *exposure_ev,
                key: *key,
                transfer: *transfer,
            }),
            ServiceRequest::Health => None,
        }
    }
}

/// Response envelope (one JSON line)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    /// Byte length of the PNG payload following the header line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ServiceResponse {
    pub fn converted(width: usize, height: usize, size: u64) -> Self {
        Self {
            ok: true,
            error: None,
            width: Some(width),
            height: Some(height),
            size: Some(size),
            message: Some(format!("Successfully processed {}x{} image", width, height)),
            service: None,
            version: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
            width: None,
            height: None,
            size: None,
            message: None,
            service: None,
            version: None,
        }
    }

    pub fn health() -> Self {
        Self {
            ok: true,
            error: None,
            width: None,
            height: None,
            size: None,
            message: Some("healthy".to_string()),
            service: Some(SERVICE_NAME.to_string()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

/// Parse a request from a JSON header line
pub fn parse_request(line: &str) -> Result<ServiceRequest, String> {
    serde_json::from_str(line).map_err(|e| format!("JSON parse error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_with_defaults() {
        let json = r#"{"op":"convert","size":1024}"#;
        let req = parse_request(json).unwrap();
        match req {
            ServiceRequest::Convert {
                size,
                exposure_ev,
                key,
                transfer,
            } => {
                assert_eq!(size, 1024);
                assert_eq!(exposure_ev, 0.0);
                assert_eq!(key, 0.18);
                assert_eq!(transfer, TransferEncoding::Srgb);
            }
            _ => panic!("Expected Convert"),
        }
    }

    #[test]
    fn test_parse_convert_with_parameters() {
        let json =
            r#"{"op":"convert","size":7,"exposure_ev":-1.5,"key":0.36,"transfer":"gamma22"}"#;
        let req = parse_request(json).unwrap();
        let params = req.tonemap_parameters().unwrap();
        assert_eq!(params.exposure_ev, -1.5);
        assert_eq!(params.key, 0.36);
        assert_eq!(params.transfer, TransferEncoding::Gamma22);
    }

    #[test]
    fn test_parse_health() {
        let req = parse_request(r#"{"op":"health"}"#).unwrap();
        assert!(matches!(req, ServiceRequest::Health));
        assert!(req.tonemap_parameters().is_none());
    }

    #[test]
    fn test_parse_unknown_op_fails() {
        assert!(parse_request(r#"{"op":"stream"}"#).is_err());
        assert!(parse_request("not json at all").is_err());
    }

    #[test]
    fn test_response_converted() {
        let resp = ServiceResponse::converted(640, 480, 1234);
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"ok":true,"width":640,"height":480,"size":1234,"message":"Successfully processed 640x480 image"}"#
        );
    }

    #[test]
    fn test_response_error() {
        let resp = ServiceResponse::error("something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":"something went wrong"}"#);
    }

    #[test]
    fn test_response_health() {
        let resp = ServiceResponse::health();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""ok":true"#));
        assert!(json.contains(r#""service":"exr-extractor""#));
        assert!(json.contains(r#""version":"#));
    }

    #[test]
    fn test_request_round_trip() {
        let req = ServiceRequest::Convert {
            size: 9,
            exposure_ev: 2.0,
            key: 0.18,
            transfer: TransferEncoding::Linear,
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed = parse_request(&json).unwrap();
        assert_eq!(
            parsed.tonemap_parameters().unwrap().transfer,
            TransferEncoding::Linear
        );
    }
}
