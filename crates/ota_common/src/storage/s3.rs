//! S3-compatible object store over path-style REST
//!
//! Requests are signed with SigV4 when an access key is configured and sent
//! anonymously otherwise. No retries: the first failure is returned.

use chrono::Utc;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use super::sigv4::{self, Credentials, EMPTY_PAYLOAD_SHA256};
use super::{cdn_base, public_url, ObjectStore};
use crate::config::Settings;
use crate::error::{ReleaseError, Result};

pub struct S3Store {
    endpoint: Url,
    bucket: String,
    region: String,
    access_key: String,
    secret_key: String,
    cdn_base: Option<String>,
    client: Client,
}

impl S3Store {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let endpoint = Url::parse(settings.s3_endpoint.trim_end_matches('/')).map_err(|e| {
            ReleaseError::Config(format!("invalid s3_endpoint '{}': {}", settings.s3_endpoint, e))
        })?;
        if endpoint.host_str().is_none() {
            return Err(ReleaseError::Config(format!(
                "s3_endpoint '{}' has no host",
                settings.s3_endpoint
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .user_agent(format!("otactl/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReleaseError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            bucket: settings.s3_bucket.clone(),
            region: settings.s3_region.clone(),
            access_key: settings.s3_access_key.clone(),
            secret_key: settings.s3_secret_key.clone(),
            cdn_base: cdn_base(settings),
            client,
        })
    }

    /// Path of the endpoint itself, without a trailing slash (`/s3` for a
    /// gateway mounted below the host root, empty otherwise)
    fn base_path(&self) -> &str {
        self.endpoint.path().trim_end_matches('/')
    }

    /// `{base_path}/{bucket}/{key}`, percent-encoded. This exact path is both
    /// requested and signed.
    fn canonical_uri(&self, key: &str) -> String {
        format!(
            "{}{}",
            self.base_path(),
            sigv4::encode_path(&format!("/{}/{}", self.bucket, key.trim_start_matches('/')))
        )
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}{}",
            self.endpoint.origin().ascii_serialization(),
            self.canonical_uri(key)
        )
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn bucket_base(&self) -> String {
        format!(
            "{}{}/{}",
            self.endpoint.origin().ascii_serialization(),
            self.base_path(),
            self.bucket
        )
    }

    fn signed(
        &self,
        req: RequestBuilder,
        method: &str,
        key: &str,
        payload_sha256: &str,
    ) -> std::result::Result<RequestBuilder, String> {
        if self.access_key.is_empty() {
            return Ok(req);
        }

        let creds = Credentials {
            access_key: &self.access_key,
            secret_key: &self.secret_key,
            region: &self.region,
        };
        let headers = sigv4::sign(
            &creds,
            method,
            &self.host(),
            &self.canonical_uri(key),
            payload_sha256,
            Utc::now(),
        )
        .map_err(|e| format!("request signing failed: {}", e))?;

        Ok(req
            .header("x-amz-date", headers.amz_date)
            .header("x-amz-content-sha256", headers.content_sha256)
            .header(reqwest::header::AUTHORIZATION, headers.authorization))
    }

    fn status_error(resp: Response) -> String {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        if snippet.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, snippet)
        }
    }
}

impl ObjectStore for S3Store {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        debug!("GET s3://{}/{}", self.bucket, key);
        let req = self.client.get(self.object_url(key));
        let resp = self
            .signed(req, "GET", key, EMPTY_PAYLOAD_SHA256)
            .map_err(|e| ReleaseError::read_failed(key, e))?
            .send()
            .map_err(|e| ReleaseError::read_failed(key, e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let bytes = resp.bytes().map_err(|e| ReleaseError::read_failed(key, e))?;
                Ok(Some(bytes.to_vec()))
            }
            _ => Err(ReleaseError::read_failed(key, Self::status_error(resp))),
        }
    }

    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        debug!(
            "PUT s3://{}/{} ({} bytes, {})",
            self.bucket,
            key,
            bytes.len(),
            content_type
        );
        let payload_sha256 = sigv4::sha256_hex(bytes);
        let req = self
            .client
            .put(self.object_url(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        let resp = self
            .signed(req, "PUT", key, &payload_sha256)
            .map_err(|e| ReleaseError::write_failed(key, e))?
            .send()
            .map_err(|e| ReleaseError::write_failed(key, e))?;

        if !resp.status().is_success() {
            return Err(ReleaseError::write_failed(key, Self::status_error(resp)));
        }

        Ok(public_url(self.cdn_base.as_deref(), &self.bucket_base(), key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let req = self.client.head(self.object_url(key));
        let resp = self
            .signed(req, "HEAD", key, EMPTY_PAYLOAD_SHA256)
            .map_err(|e| ReleaseError::read_failed(key, e))?
            .send()
            .map_err(|e| ReleaseError::read_failed(key, e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(ReleaseError::read_failed(key, format!("HTTP {}", s))),
        }
    }

    fn describe(&self) -> String {
        format!(
            "s3 {} (bucket {})",
            self.endpoint.as_str().trim_end_matches('/'),
            self.bucket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(endpoint: &str, cdn: &str) -> S3Store {
        let settings = Settings {
            s3_endpoint: endpoint.to_string(),
            s3_bucket: "releases".to_string(),
            cdn_base_url: cdn.to_string(),
            ..Settings::default()
        };
        S3Store::from_settings(&settings).unwrap()
    }

    #[test]
    fn test_object_url_path_style() {
        let s = store("https://s3.example.com/", "");
        assert_eq!(
            s.object_url("app/releases/android/1.0/app 1.apk"),
            "https://s3.example.com/releases/app/releases/android/1.0/app%201.apk"
        );
        assert_eq!(s.host(), "s3.example.com");
    }

    #[test]
    fn test_host_keeps_explicit_port() {
        let s = store("http://127.0.0.1:9000", "");
        assert_eq!(s.host(), "127.0.0.1:9000");
        assert_eq!(s.bucket_base(), "http://127.0.0.1:9000/releases");
    }

    #[test]
    fn test_endpoint_path_is_requested_and_signed() {
        let s = store("https://gw.example.com/s3/", "");
        assert_eq!(s.canonical_uri("app/manifest.json"), "/s3/releases/app/manifest.json");
        assert_eq!(
            s.object_url("app/manifest.json"),
            "https://gw.example.com/s3/releases/app/manifest.json"
        );
        assert_eq!(s.bucket_base(), "https://gw.example.com/s3/releases");
        assert_eq!(s.host(), "gw.example.com");

        let url = Url::parse(&s.object_url("app/manifest.json")).unwrap();
        assert_eq!(url.path(), s.canonical_uri("app/manifest.json"));
    }

    #[test]
    fn test_signed_request_carries_sigv4_headers() {
        let settings = Settings {
            s3_endpoint: "https://gw.example.com/s3".to_string(),
            s3_bucket: "releases".to_string(),
            s3_access_key: "AKIDEXAMPLE".to_string(),
            s3_secret_key: String::new(),
            ..Settings::default()
        };
        let s = S3Store::from_settings(&settings).unwrap();
        let req = s.client.get(s.object_url("app/manifest.json"));
        let req = s
            .signed(req, "GET", "app/manifest.json", EMPTY_PAYLOAD_SHA256)
            .unwrap()
            .build()
            .unwrap();

        let auth = req.headers()[reqwest::header::AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert_eq!(
            req.headers()["x-amz-content-sha256"].to_str().unwrap(),
            EMPTY_PAYLOAD_SHA256
        );
        assert_eq!(req.url().path(), "/s3/releases/app/manifest.json");
    }

    #[test]
    fn test_anonymous_request_is_unsigned() {
        let s = store("https://s3.example.com", "");
        let req = s.client.head(s.object_url("k"));
        let req = s.signed(req, "HEAD", "k", EMPTY_PAYLOAD_SHA256).unwrap().build().unwrap();
        assert!(req.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let settings = Settings {
            s3_endpoint: "not a url".to_string(),
            s3_bucket: "releases".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            S3Store::from_settings(&settings),
            Err(ReleaseError::Config(_))
        ));
    }

    #[test]
    fn test_describe() {
        let s = store("https://s3.example.com", "https://cdn.example.com");
        assert_eq!(s.describe(), "s3 https://s3.example.com (bucket releases)");
        assert_eq!(s.cdn_base.as_deref(), Some("https://cdn.example.com"));
    }
}
