//! Wire types for the Clash external-controller HTTP API.
//!
//! Only the part of `GET /proxies` the launcher reads is modelled. Unknown
//! fields are ignored so that newer daemons keep parsing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `type` value the daemon reports for manually switched groups.
pub const SELECTOR_TYPE: &str = "Selector";

/// Body of `GET /proxies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxiesResponse {
    #[serde(default)]
    pub proxies: HashMap<String, ProxyEntry>,
}

/// One named entry under `proxies`: a single upstream or a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Active member; only groups carry it
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub all: Option<Vec<String>>,
}

impl ProxyEntry {
    pub fn is_selector(&self) -> bool {
        self.kind == SELECTOR_TYPE
    }
}

/// Active choice and candidates of one selector group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorGroup {
    pub now: Option<String>,
    pub all: Vec<String>,
}

/// Selector groups keyed by group name. Iteration order is unspecified.
pub type ProxyGroupSnapshot = HashMap<String, SelectorGroup>;

impl ProxiesResponse {
    /// Collect every selector group into a snapshot.
    pub fn selector_groups(&self) -> ProxyGroupSnapshot {
        self.proxies
            .iter()
            .filter(|(_, entry)| entry.is_selector())
            .map(|(name, entry)| {
                (
                    name.clone(),
                    SelectorGroup {
                        now: entry.now.clone(),
                        all: entry.all.clone().unwrap_or_default(),
                    },
                )
            })
            .collect()
    }
}

/// Sum of candidate counts across all groups of a snapshot.
pub fn total_candidates(snapshot: &ProxyGroupSnapshot) -> usize {
    snapshot.values().map(|group| group.all.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_groups_skip_other_types() {
        let body = r#"{
            "proxies": {
                "Proxy": {"type": "Selector", "now": "HK 01", "all": ["HK 01", "JP 02"]},
                "HK 01": {"type": "Shadowsocks", "history": []},
                "Auto": {"type": "URLTest", "now": "JP 02", "all": ["HK 01", "JP 02"]},
                "DIRECT": {"type": "Direct"}
            }
        }"#;
        let parsed: ProxiesResponse = serde_json::from_str(body).unwrap();
        let groups = parsed.selector_groups();

        assert_eq!(groups.len(), 1);
        let proxy = &groups["Proxy"];
        assert_eq!(proxy.now.as_deref(), Some("HK 01"));
        assert_eq!(proxy.all, vec!["HK 01".to_string(), "JP 02".to_string()]);
        assert_eq!(total_candidates(&groups), 2);
    }

    #[test]
    fn selector_without_candidates_has_empty_list() {
        let body = r#"{"proxies": {"G": {"type": "Selector", "now": null, "all": null}}}"#;
        let parsed: ProxiesResponse = serde_json::from_str(body).unwrap();
        let groups = parsed.selector_groups();

        assert_eq!(
            groups["G"],
            SelectorGroup {
                now: None,
                all: Vec::new()
            }
        );
    }

    #[test]
    fn missing_proxies_key_is_empty() {
        let parsed: ProxiesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.selector_groups().is_empty());
    }
}
