use std::collections::BTreeSet;

use url::Url;

use crate::{Error, Result};

/// Restricts credentials to a set of hosts.
///
/// Hosts are compared lower-cased. An empty set allows every host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedHostsValidator {
    hosts: BTreeSet<String>,
}

impl AllowedHostsValidator {
    /// A validator for `hosts`, given without a scheme.
    pub fn new<I, S>(hosts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validator = Self::default();
        validator.set_allowed_hosts(hosts)?;
        Ok(validator)
    }

    /// Replace the allowed hosts.
    pub fn set_allowed_hosts<I, S>(&mut self, hosts: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = BTreeSet::new();
        for host in hosts {
            let host = host.as_ref().trim().to_ascii_lowercase();
            if host.starts_with("http://") || host.starts_with("https://") {
                return Err(Error::configuration(format!(
                    "host should not contain http or https prefix: {host}"
                )));
            }
            if !host.is_empty() {
                allowed.insert(host);
            }
        }
        self.hosts = allowed;
        Ok(())
    }

    /// The allowed hosts, sorted.
    pub fn allowed_hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Returns `true` if credentials may be sent to the host of `url`.
    #[must_use]
    pub fn is_url_host_valid(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.hosts.is_empty() || self.hosts.contains(&host.to_ascii_lowercase())
    }
}
