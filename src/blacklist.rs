//! Static deny lists for phones, IPs and user agents.

/// Deny lists loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    /// Phone prefixes.
    pub phones: Vec<String>,
    /// Exact IP strings.
    pub ips: Vec<String>,
    /// User-agent substrings, stored lowercased.
    pub user_agents: Vec<String>,
}

impl Blacklist {
    pub fn new(phones: Vec<String>, ips: Vec<String>, user_agents: Vec<String>) -> Self {
        Self {
            phones,
            ips,
            user_agents: user_agents.into_iter().map(|u| u.to_lowercase()).collect(),
        }
    }

    pub fn is_blacklisted(&self, phone: &str, ip: &str, user_agent: &str) -> bool {
        self.phone_hit(phone) || self.ip_hit(ip) || self.user_agent_hit(user_agent)
    }

    fn phone_hit(&self, phone: &str) -> bool {
        self.phones.iter().any(|p| phone.starts_with(p.as_str()))
    }

    fn ip_hit(&self, ip: &str) -> bool {
        self.ips.iter().any(|i| i == ip)
    }

    fn user_agent_hit(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_lowercase();
        self.user_agents.iter().any(|u| ua.contains(u.as_str()))
    }
}

/// Parse a comma-separated list: entries are trimmed, empty ones dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
