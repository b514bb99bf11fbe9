//! MinIO / S3-compatible blob store client.
//!
//! Speaks plain S3 REST with hand-rolled AWS Signature Version 4 signing
//! (`sha2` + `hmac`), since a MinIO deployment needs nothing beyond the
//! handful of path-style operations the pipeline uses and pulling in a full
//! SDK would be a heavyweight way to get there.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::BlobStore;
use crate::error::BlobError;

type HmacSha256 = Hmac<Sha256>;

const REGION: &str = "us-east-1";
const SERVICE: &str = "s3";

/// Blob store client speaking the S3 REST API against a MinIO-compatible endpoint.
pub struct MinioStore {
    client: reqwest::Client,
    endpoint: String,
    access_key: String,
    secret_key: String,
    bucket: String,
    secure: bool,
}

impl MinioStore {
    /// Create a new client. `endpoint` is a bare `host:port`, without scheme.
    pub fn new(endpoint: String, access_key: String, secret_key: String, bucket: String, secure: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            access_key,
            secret_key,
            bucket,
            secure,
        }
    }

    fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}://{}/{}/{}", self.scheme(), self.endpoint, self.bucket, key)
    }

    fn sign_request(
        &self,
        method: &str,
        key: &str,
        payload_hash: &str,
        amz_date: &str,
        datestamp: &str,
    ) -> (String, String) {
        let canonical_uri = format!("/{}/{}", self.bucket, key);
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            self.endpoint, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );

        let credential_scope = format!("{datestamp}/{REGION}/{SERVICE}/aws4_request");
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
            hex_sha256(canonical_request.as_bytes())
        );

        let signature = self.sign_string(&string_to_sign, datestamp);

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key
        );

        (authorization, signed_headers.to_string())
    }

    fn sign_string(&self, string_to_sign: &str, datestamp: &str) -> String {
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), datestamp.as_bytes());
        let k_region = hmac_sha256(&k_date, REGION.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()))
    }

    /// Build a presigned query-string-authenticated URL valid for `ttl`.
    fn presign(&self, key: &str, ttl: Duration) -> String {
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let credential_scope = format!("{datestamp}/{REGION}/{SERVICE}/aws4_request");
        let credential = percent_encode(&format!("{}/{credential_scope}", self.access_key));

        let mut query_pairs = vec![
            ("X-Amz-Algorithm".to_string(), "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential".to_string(), credential),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), ttl.as_secs().to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];
        query_pairs.sort();

        let canonical_querystring = query_pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_uri = format!("/{}/{}", self.bucket, key);
        let canonical_headers = format!("host:{}\n", self.endpoint);
        let canonical_request = format!(
            "GET\n{canonical_uri}\n{canonical_querystring}\n{canonical_headers}\nhost\nUNSIGNED-PAYLOAD"
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
            hex_sha256(canonical_request.as_bytes())
        );
        let signature = self.sign_string(&string_to_sign, &datestamp);

        format!(
            "{}://{}{canonical_uri}?{canonical_querystring}&X-Amz-Signature={signature}",
            self.scheme(),
            self.endpoint
        )
    }
}

#[async_trait::async_trait]
impl BlobStore for MinioStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        let payload_hash = hex_sha256(&bytes);
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let (authorization, _) = self.sign_request("PUT", key, &payload_hash, &amz_date, &datestamp);

        let response = self
            .client
            .put(self.object_url(key))
            .header("host", &self.endpoint)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header("content-type", content_type)
            .header("authorization", authorization)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BlobError::Api { status, message });
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let payload_hash = hex_sha256(b"");
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let (authorization, _) = self.sign_request("GET", key, &payload_hash, &amz_date, &datestamp);

        let response = self
            .client
            .get(self.object_url(key))
            .header("host", &self.endpoint)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization)
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Err(BlobError::NotFound { key: key.to_string() });
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BlobError::Api { status, message });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let payload_hash = hex_sha256(b"");
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let (authorization, _) = self.sign_request("DELETE", key, &payload_hash, &amz_date, &datestamp);

        let response = self
            .client
            .delete(self.object_url(key))
            .header("host", &self.endpoint)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization)
            .send()
            .await?;

        if !response.status().is_success() && response.status().as_u16() != 404 {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BlobError::Api { status, message });
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let payload_hash = hex_sha256(b"");
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let (authorization, _) = self.sign_request("HEAD", key, &payload_hash, &amz_date, &datestamp);

        let response = self
            .client
            .head(self.object_url(key))
            .header("host", &self.endpoint)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization)
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, BlobError> {
        Ok(self.presign(key, ttl))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Minimal module exposing hex encoding, mirroring what an `aws-sigv4`
/// crate would provide, since signing is the only place this is needed.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// RFC 3986 percent-encoding for SigV4 canonical query components.
/// Unreserved characters (`A-Za-z0-9-_.~`) pass through unescaped.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(endpoint: String) -> MinioStore {
        MinioStore::new(endpoint, "access".into(), "secret".into(), "rfp-bucket".into(), false)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let server = MockServer::start().await;
        let host = server.address().to_string();

        Mock::given(method("PUT"))
            .and(path_regex(r"^/rfp-bucket/.*"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/rfp-bucket/.*"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello world".to_vec()))
            .mount(&server)
            .await;

        let blob_store = store(host);
        blob_store
            .put("projects/p1/doc.pdf", b"hello world".to_vec(), "application/pdf")
            .await
            .expect("put");

        let bytes = blob_store.get("projects/p1/doc.pdf").await.expect("get");
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn get_missing_key_maps_to_not_found() {
        let server = MockServer::start().await;
        let host = server.address().to_string();

        Mock::given(method("GET"))
            .and(path_regex(r"^/rfp-bucket/.*"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let blob_store = store(host);
        let err = blob_store.get("projects/p1/missing.pdf").await.unwrap_err();
        match err {
            BlobError::NotFound { key } => assert_eq!(key, "projects/p1/missing.pdf"),
            other => panic!("expected NotFound, got: {other}"),
        }
    }

    #[tokio::test]
    async fn exists_false_on_404() {
        let server = MockServer::start().await;
        let host = server.address().to_string();

        Mock::given(method("HEAD"))
            .and(path_regex(r"^/rfp-bucket/.*"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let blob_store = store(host);
        assert!(!blob_store.exists("projects/p1/missing.pdf").await.unwrap());
    }

    #[test]
    fn presign_get_includes_signature_and_expiry() {
        let blob_store = store("localhost:9000".to_string());
        let url = blob_store
            .presign_get("projects/p1/doc.pdf", Duration::from_secs(3600))
            .expect("presign");

        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.starts_with("http://localhost:9000/rfp-bucket/"));
    }

    #[test]
    fn percent_encode_escapes_reserved_characters() {
        assert_eq!(percent_encode("access/20260101/us-east-1"), "access%2F20260101%2Fus-east-1");
    }
}
