//! AWS Signature Version 4 POST policies.
//!
//! A POST policy lets a browser or CLI upload one object straight to S3 with a plain
//! multipart form. The policy document lists the conditions S3 enforces on the form
//! (bucket, exact key, content type, size range) and is signed with the derived SigV4
//! key. The returned form fields must be sent before the `file` part.

use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::time::Duration;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// What the upload is allowed to be.
#[derive(Debug, Clone)]
pub struct PostPolicy<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub content_type: &'a str,
    pub size_range: RangeInclusive<u64>,
    pub region: &'a str,
    pub expires_in: Duration,
}

/// Credentials used to sign the policy.
#[derive(Debug, Clone)]
pub struct SigningCredentials<'a> {
    pub key_id: &'a str,
    pub secret_key: &'a str,
    /// Session token for temporary credentials (instance roles, SSO, ...)
    pub token: Option<&'a str>,
}

impl PostPolicy<'_> {
    /// Build the form fields for this policy, signed at `now`.
    pub fn sign(&self, credentials: &SigningCredentials<'_>, now: DateTime<Utc>) -> BTreeMap<String, String> {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential = format!(
            "{}/{}/{}/{}/aws4_request",
            credentials.key_id, date_stamp, self.region, SERVICE
        );

        let document = self.document(&credential, &amz_date, credentials.token, now);
        let encoded_policy =
            base64::engine::general_purpose::STANDARD.encode(document.to_string().as_bytes());

        let signing_key = derive_signing_key(credentials.secret_key, &date_stamp, self.region);
        let signature = hex::encode(hmac_sha256(&signing_key, encoded_policy.as_bytes()));

        let mut fields = BTreeMap::new();
        fields.insert("bucket".to_string(), self.bucket.to_string());
        fields.insert("key".to_string(), self.key.to_string());
        fields.insert("Content-Type".to_string(), self.content_type.to_string());
        fields.insert("X-Amz-Algorithm".to_string(), ALGORITHM.to_string());
        fields.insert("X-Amz-Credential".to_string(), credential);
        fields.insert("X-Amz-Date".to_string(), amz_date);
        if let Some(token) = credentials.token {
            fields.insert("X-Amz-Security-Token".to_string(), token.to_string());
        }
        fields.insert("Policy".to_string(), encoded_policy);
        fields.insert("X-Amz-Signature".to_string(), signature);
        fields
    }

    fn document(&self, credential: &str, amz_date: &str, token: Option<&str>, now: DateTime<Utc>) -> Value {
        let expires_in = chrono::Duration::from_std(self.expires_in)
            .unwrap_or_else(|_| chrono::Duration::seconds(0));
        let expiration = (now + expires_in)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();

        let mut conditions = vec![
            json!({ "bucket": self.bucket }),
            json!({ "key": self.key }),
            json!({ "Content-Type": self.content_type }),
            json!(["content-length-range", self.size_range.start(), self.size_range.end()]),
            json!({ "x-amz-algorithm": ALGORITHM }),
            json!({ "x-amz-credential": credential }),
            json!({ "x-amz-date": amz_date }),
        ];
        if let Some(token) = token {
            conditions.push(json!({ "x-amz-security-token": token }));
        }

        json!({ "expiration": expiration, "conditions": conditions })
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}
