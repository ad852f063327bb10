//! Destination URL validation and auto-link policy.

use miette::Diagnostic;
use thiserror::Error;
use url::Url;
use weaver_common::LinkPolicyConfig;

/// Why a destination was rejected.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RejectedUrl {
    #[error("`{input}` is not a valid URL")]
    #[diagnostic(
        code(weaver::url::malformed),
        help("enter a full address such as https://example.com")
    )]
    Malformed { input: String },

    #[error("links using `{protocol}:` are not allowed")]
    #[diagnostic(code(weaver::url::protocol))]
    DisallowedProtocol { protocol: String },

    #[error("links to {host} are not allowed")]
    #[diagnostic(code(weaver::url::domain))]
    DeniedDomain { host: String },
}

/// Protocol and domain rules applied to link destinations.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    default_protocol: String,
    allowed_protocols: Vec<String>,
    disallowed_protocols: Vec<String>,
    denied_domains: Vec<String>,
    autolink_denied_domains: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::from_config(&LinkPolicyConfig::default())
    }
}

impl UrlPolicy {
    pub fn from_config(config: &LinkPolicyConfig) -> Self {
        Self {
            default_protocol: scheme_name(&config.default_protocol),
            allowed_protocols: config.allowed_protocols.iter().map(|p| scheme_name(p)).collect(),
            disallowed_protocols: config
                .disallowed_protocols
                .iter()
                .map(|p| scheme_name(p))
                .collect(),
            denied_domains: config.denied_domains.iter().map(|d| host_name(d)).collect(),
            autolink_denied_domains: config
                .autolink_denied_domains
                .iter()
                .map(|d| host_name(d))
                .collect(),
        }
    }

    pub fn default_protocol(&self) -> &str {
        &self.default_protocol
    }

    /// Validate with the configured default protocol.
    pub fn validate(&self, raw: &str) -> Result<String, RejectedUrl> {
        self.validate_destination(raw, &self.default_protocol)
    }

    /// Validate and normalize a destination typed by the user.
    ///
    /// Input containing `:` is parsed as an absolute URL, anything else gets
    /// `default_protocol://` prepended. The normalized form is that candidate
    /// string, trimmed.
    pub fn validate_destination(
        &self,
        raw: &str,
        default_protocol: &str,
    ) -> Result<String, RejectedUrl> {
        let raw = raw.trim();
        let candidate = if raw.contains(':') {
            raw.to_owned()
        } else {
            format!("{}://{raw}", scheme_name(default_protocol))
        };

        let url = Url::parse(&candidate).map_err(|err| {
            tracing::debug!(input = raw, %err, "rejecting malformed destination");
            RejectedUrl::Malformed {
                input: raw.to_owned(),
            }
        })?;

        let protocol = url.scheme();
        let disallowed = self.disallowed_protocols.iter().any(|p| p == protocol);
        let allowed = self.allowed_protocols.iter().any(|p| p == protocol);
        if disallowed || !allowed {
            return Err(RejectedUrl::DisallowedProtocol {
                protocol: protocol.to_owned(),
            });
        }

        if let Some(host) = url.host_str() {
            if is_denied(host, &self.denied_domains) {
                return Err(RejectedUrl::DeniedDomain {
                    host: host.to_owned(),
                });
            }
        }

        Ok(candidate)
    }

    /// Whether a bare URL typed inline should become a link automatically.
    ///
    /// Only the auto-link denylist applies; explicit attachment still runs
    /// the full validation.
    pub fn should_auto_link(&self, raw: &str) -> bool {
        let raw = raw.trim();
        let candidate = if raw.contains(':') {
            raw.to_owned()
        } else {
            format!("{}://{raw}", self.default_protocol)
        };
        match Url::parse(&candidate) {
            Ok(url) => match url.host_str() {
                Some(host) => !is_denied(host, &self.autolink_denied_domains),
                None => false,
            },
            Err(_) => false,
        }
    }
}

fn scheme_name(protocol: &str) -> String {
    protocol.trim().trim_end_matches(':').to_ascii_lowercase()
}

fn host_name(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// A host matches a listed domain exactly or as a subdomain of it.
fn is_denied(host: &str, denied: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    denied.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
