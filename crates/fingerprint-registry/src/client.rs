//! Registry API client for fetching manifest digests

use crate::error::{RegistryError, Result};
use crate::provider::RegistryEndpoints;
use crate::{
    CONTENT_DIGEST_HEADER, MANIFEST_LIST_V2, MANIFEST_V2, OCI_INDEX_V1, OCI_MANIFEST_V1,
    SHA256_HEX_PATTERN,
};
use regex_lite::Regex;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Request timeout for every registry call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Username/password pair used to obtain a pull token
#[derive(Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token service response. Docker Hub uses `token`, OAuth2-style services
/// use `access_token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// What we keep from a manifest response
struct ManifestResponse {
    content_type: String,
    digest: Option<String>,
    body: Vec<u8>,
}

/// Registry API client
pub struct RegistryClient {
    endpoints: RegistryEndpoints,
    client: Client,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(endpoints: RegistryEndpoints) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::Http(e.to_string()))?;

        Ok(Self { endpoints, client })
    }

    /// Create a client around a preconfigured HTTP client (proxies, TLS roots)
    pub fn with_http_client(endpoints: RegistryEndpoints, client: Client) -> Self {
        Self { endpoints, client }
    }

    /// The endpoints this client talks to
    pub fn endpoints(&self) -> &RegistryEndpoints {
        &self.endpoints
    }

    /// Obtain a short-lived pull token for `repository`.
    pub fn request_token(
        &self,
        credentials: &RegistryCredentials,
        repository: &str,
    ) -> Result<String> {
        self.fetch_token(Some(credentials), repository)
    }

    /// Obtain a pull token without logging in. Docker Hub and GHCR hand
    /// these out for public repositories.
    pub fn anonymous_token(&self, repository: &str) -> Result<String> {
        self.fetch_token(None, repository)
    }

    fn fetch_token(
        &self,
        credentials: Option<&RegistryCredentials>,
        repository: &str,
    ) -> Result<String> {
        let request = match credentials {
            Some(credentials) if self.endpoints.is_jfrog() => {
                let url = self.endpoints.jfrog_token_url();
                debug!("requesting artifactory token from {}", url);
                self.client
                    .post(&url)
                    .basic_auth(&credentials.username, Some(&credentials.password))
                    .form(&[
                        ("username", credentials.username.as_str()),
                        ("scope", "member-of-groups:readers"),
                        ("expires_in", "60"),
                    ])
            }
            _ => {
                let url = format!("{}/token", self.endpoints.auth);
                let scope = format!("repository:{}:pull", repository);
                let request = self.client.get(&url).query(&[
                    ("scope", scope.as_str()),
                    ("service", self.endpoints.service.as_str()),
                ]);
                match credentials {
                    Some(c) => request.basic_auth(&c.username, Some(&c.password)),
                    None => request,
                }
            }
        };
        let response = request
            .send()
            .map_err(|e| RegistryError::Token(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Token(format!(
                "token service returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .map_err(|e| RegistryError::Token(e.to_string()))?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RegistryError::Token("response carried no token".to_string()))
    }

    /// Fetch the manifest digest for `repository:reference`.
    ///
    /// Asks for a manifest list first, since multi-platform images are
    /// identified by their list digest. Falls back to a single-platform
    /// manifest when the registry has no list for the reference.
    pub fn manifest_digest(
        &self,
        repository: &str,
        reference: &str,
        token: Option<&str>,
    ) -> Result<String> {
        let url = format!(
            "{}/{}/manifests/{}",
            self.endpoints.api, repository, reference
        );

        let list_accept = format!("{}, {}", MANIFEST_LIST_V2, OCI_INDEX_V1);
        let mut manifest = self.get_manifest(&url, &list_accept, token)?;

        if !is_list_media_type(&manifest.content_type) {
            debug!(
                "no manifest list for {} (content type {:?}), requesting single manifest",
                url, manifest.content_type
            );
            let single_accept = format!("{}, {}", MANIFEST_V2, OCI_MANIFEST_V1);
            manifest = self.get_manifest(&url, &single_accept, token)?;
        }

        match manifest.digest {
            Some(header) => {
                let digest = header.trim().trim_start_matches("sha256:").to_string();
                if !is_sha256_hex(&digest) {
                    return Err(RegistryError::InvalidDigest(header));
                }
                Ok(digest)
            }
            None => {
                // The manifest digest is by definition the SHA-256 of its bytes.
                debug!("{} carried no digest header, hashing manifest body", url);
                let mut hasher = Sha256::new();
                hasher.update(&manifest.body);
                Ok(hex::encode(hasher.finalize()))
            }
        }
    }

    /// Fetch a token, then the manifest digest.
    ///
    /// Without credentials a token is only requested from registries that
    /// issue anonymous ones; other registries are asked without auth.
    pub fn remote_digest(
        &self,
        repository: &str,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<String> {
        let token = match credentials {
            Some(c) => Some(self.request_token(c, repository)?),
            None if self.endpoints.issues_anonymous_tokens() => {
                Some(self.anonymous_token(repository)?)
            }
            None => None,
        };
        self.manifest_digest(repository, reference, token.as_deref())
    }

    fn get_manifest(
        &self,
        url: &str,
        accept: &str,
        token: Option<&str>,
    ) -> Result<ManifestResponse> {
        let mut request = self.client.get(url).header(ACCEPT, accept);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let response = check_status(response, url)?;

        let content_type = header_value(&response, CONTENT_TYPE.as_str()).unwrap_or_default();
        let digest = header_value(&response, CONTENT_DIGEST_HEADER);
        let body = response.bytes()?.to_vec();

        Ok(ManifestResponse {
            content_type,
            digest,
            body,
        })
    }
}

fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = url.to_string();
    if status == StatusCode::NOT_FOUND {
        Err(RegistryError::NotFound { url })
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(RegistryError::Unauthorized { url })
    } else {
        Err(RegistryError::Status {
            status: status.as_u16(),
            url,
        })
    }
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn is_list_media_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    media_type == MANIFEST_LIST_V2 || media_type == OCI_INDEX_V1
}

fn is_sha256_hex(s: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(SHA256_HEX_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}
