//! Registry endpoint discovery for well-known providers.

/// The three endpoints needed to fetch a manifest digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoints {
    /// Base of the distribution API, including the `/v2` suffix
    pub api: String,
    /// Base of the token service
    pub auth: String,
    /// Service name sent with token requests
    pub service: String,
}

impl RegistryEndpoints {
    /// Resolve endpoints for a provider name or a registry host/URL.
    ///
    /// `dockerhub` and `github` are known providers; anything else is taken
    /// as a registry host, optionally with a scheme and a path. `https` is
    /// assumed when no scheme is given.
    pub fn for_provider(provider: &str) -> Self {
        match provider {
            "dockerhub" => Self {
                api: "https://registry-1.docker.io/v2".to_string(),
                auth: "https://auth.docker.io".to_string(),
                service: "registry.docker.io".to_string(),
            },
            "github" => Self {
                api: "https://ghcr.io/v2".to_string(),
                auth: "https://ghcr.io".to_string(),
                service: "ghcr.io".to_string(),
            },
            other => Self::for_host(other),
        }
    }

    fn for_host(url: &str) -> Self {
        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => ("https", url),
        };
        let host = rest.split('/').next().unwrap_or(rest);

        Self {
            api: format!("{}://{}/v2", scheme, host),
            auth: format!("{}://{}/oauth2", scheme, host),
            service: host.to_string(),
        }
    }

    /// Whether the registry is a JFrog Artifactory instance
    pub fn is_jfrog(&self) -> bool {
        self.service.contains("jfrog")
    }

    /// Whether the registry is Docker Hub
    pub fn is_dockerhub(&self) -> bool {
        self.service == "registry.docker.io"
    }

    /// Whether the token service hands out tokens without a login
    pub fn issues_anonymous_tokens(&self) -> bool {
        self.is_dockerhub() || self.service == "ghcr.io"
    }

    /// Artifactory token endpoint, on the same host and scheme as the API
    pub fn jfrog_token_url(&self) -> String {
        let base = self.api.trim_end_matches('/');
        let base = base.strip_suffix("/v2").unwrap_or(base);
        format!("{}/artifactory/api/security/token", base)
    }
}
