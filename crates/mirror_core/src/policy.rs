use std::collections::HashSet;

use url::Url;

/// The set of hosts a crawl is allowed to fetch from.
///
/// Hosts are registered from the seed URLs before the first fetch and the set
/// is read-only afterwards. A host with an explicit port is distinct from the
/// same host on the default port, so two servers on one machine do not bleed
/// into each other's crawl.
#[derive(Debug, Clone, Default)]
pub struct HostPolicy {
    hosts: HashSet<String>,
}

impl HostPolicy {
    pub fn from_seeds<'a>(seeds: impl IntoIterator<Item = &'a Url>) -> Self {
        let mut policy = Self::default();
        for seed in seeds {
            policy.register(seed);
        }
        policy
    }

    /// Records the URL's host. URLs without a host component are ignored.
    pub fn register(&mut self, url: &Url) {
        if let Some(key) = host_key(url) {
            self.hosts.insert(key);
        }
    }

    /// Whether the URL's host is one the crawl may fetch from.
    pub fn is_allowed(&self, url: &Url) -> bool {
        host_key(url).is_some_and(|key| self.hosts.contains(&key))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}
