use super::url_parts::{host_name, registrable_domain};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::net::{IpAddr, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("URL has no host")]
    EmptyHost,

    #[error("no registrable domain in '{0}'")]
    NoRegistrableDomain(String),

    #[error("RDAP request failed: {0}")]
    Http(String),

    #[error("RDAP response unreadable: {0}")]
    Parse(String),

    #[error("no registration date for '{0}'")]
    NoRegistrationDate(String),

    #[error("could not resolve '{0}': {1}")]
    Resolve(String, String),
}

/// Network capabilities used during feature extraction.
///
/// Both calls are best effort; callers treat every error as "unknown".
pub trait NetworkLookup: Send + Sync {
    /// Registration date of the domain behind `host` (a URL network location).
    fn creation_date(&self, host: &str) -> Result<DateTime<Utc>, LookupError>;

    /// Addresses `host` resolves to.
    fn resolve_host(&self, host: &str) -> Result<Vec<IpAddr>, LookupError>;
}

#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    events: Vec<RdapEvent>,
}

#[derive(Debug, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction")]
    action: String,
    #[serde(rename = "eventDate")]
    date: Option<String>,
}

/// Pulls the `registration` event out of an RDAP domain object.
pub fn parse_rdap_registration(body: &str) -> Result<Option<DateTime<Utc>>, LookupError> {
    let domain: RdapDomain =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;
    let Some(raw) = domain
        .events
        .iter()
        .find(|e| e.action.eq_ignore_ascii_case("registration"))
        .and_then(|e| e.date.as_deref())
    else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|d| Some(d.with_timezone(&Utc)))
        .map_err(|e| LookupError::Parse(format!("bad eventDate '{}': {}", raw, e)))
}

/// Live lookups: RDAP over HTTP and the system resolver.
#[derive(Clone)]
pub struct SystemLookup {
    agent: ureq::Agent,
    rdap_endpoint: String,
}

impl SystemLookup {
    pub fn new(rdap_endpoint: &str, timeout: Option<Duration>, user_agent: &str) -> Self {
        let mut builder = ureq::AgentBuilder::new().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            rdap_endpoint: rdap_endpoint.trim_end_matches('/').to_string(),
        }
    }
}

impl NetworkLookup for SystemLookup {
    fn creation_date(&self, host: &str) -> Result<DateTime<Utc>, LookupError> {
        if host.is_empty() {
            return Err(LookupError::EmptyHost);
        }
        let domain = registrable_domain(host)
            .ok_or_else(|| LookupError::NoRegistrableDomain(host.to_string()))?;
        let url = format!("{}/domain/{}", self.rdap_endpoint, domain);
        log::debug!("RDAP query {}", url);

        let body = self
            .agent
            .get(&url)
            .set("Accept", "application/rdap+json")
            .call()
            .map_err(|e| LookupError::Http(e.to_string()))?
            .into_string()
            .map_err(|e| LookupError::Http(e.to_string()))?;

        parse_rdap_registration(&body)?.ok_or(LookupError::NoRegistrationDate(domain))
    }

    fn resolve_host(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        let name = host_name(host);
        if name.is_empty() {
            return Err(LookupError::EmptyHost);
        }
        let addrs = (name.as_str(), 0)
            .to_socket_addrs()
            .map_err(|e| LookupError::Resolve(name.clone(), e.to_string()))?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}
