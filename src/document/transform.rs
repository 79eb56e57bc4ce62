//! Rewrite an operator-supplied Clash configuration for the container setup.
//!
//! [`transform`] is pure: it only looks at the document and the overrides.
//! The one check it performs up front is that a `proxies` list exists;
//! every other key is optional and handled when present.

use super::policy::{self, UNSUPPORTED_KEYS, URL_TEST_MARKER};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::secret::ApiSecret;
use serde_yaml::{Mapping, Value};

/// Top-level list every usable configuration must have.
pub const REQUIRED_FIELD: &str = "proxies";

/// Values forced into every generated configuration.
#[derive(Debug, Clone)]
pub struct Overrides {
    pub port: u16,
    pub socks_port: u16,
    pub mixed_port: u16,
    pub allow_lan: bool,
    pub mode: String,
    pub log_level: String,
    pub external_controller: String,
    pub secret: ApiSecret,
}

impl Overrides {
    pub fn from_config(config: &AppConfig, secret: ApiSecret) -> Self {
        Self {
            port: config.proxy.port,
            socks_port: config.proxy.socks_port,
            mixed_port: config.proxy.mixed_port,
            allow_lan: true,
            mode: "Rule".to_string(),
            log_level: "info".to_string(),
            external_controller: config.controller.bind_address(),
            secret,
        }
    }

    fn entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("port", self.port.into()),
            ("socks-port", self.socks_port.into()),
            ("mixed-port", self.mixed_port.into()),
            ("allow-lan", self.allow_lan.into()),
            ("mode", self.mode.as_str().into()),
            ("log-level", self.log_level.as_str().into()),
            ("external-controller", self.external_controller.as_str().into()),
            ("secret", self.secret.expose().into()),
        ]
    }
}

/// Check the document shape and return the number of proxies it declares.
pub fn validate(doc: &Value) -> AppResult<usize> {
    let root = doc.as_mapping().ok_or(AppError::InvalidField {
        field: "document",
        expected: "a mapping",
    })?;

    match root.get(REQUIRED_FIELD) {
        None => Err(AppError::MissingField {
            field: REQUIRED_FIELD,
            present: key_list(root),
        }),
        Some(Value::Sequence(items)) => Ok(items.len()),
        Some(_) => Err(AppError::InvalidField {
            field: REQUIRED_FIELD,
            expected: "a list",
        }),
    }
}

/// Apply the container overrides, filters and fixed policy to `doc`.
pub fn transform(doc: Value, overrides: &Overrides) -> AppResult<Value> {
    validate(&doc)?;
    let Value::Mapping(mut root) = doc else {
        // validate() rejects non-mappings
        return Err(AppError::InvalidField {
            field: "document",
            expected: "a mapping",
        });
    };

    for (key, value) in overrides.entries() {
        root.insert(key.into(), value);
    }
    root.insert("dns".into(), policy::dns_block());

    if let Some(Value::Sequence(groups)) = root.get_mut("proxy-groups") {
        for group in groups.iter_mut() {
            if let Value::Mapping(group) = group {
                filter_group_list(group, "proxies");
                filter_group_list(group, "all");
            }
        }
    }

    if let Some(Value::Sequence(proxies)) = root.get_mut(REQUIRED_FIELD) {
        retain_unmarked(proxies, proxy_label);
    }

    for key in UNSUPPORTED_KEYS {
        root.shift_remove(*key);
    }

    root.insert("rules".into(), policy::rules());

    Ok(Value::Mapping(root))
}

fn filter_group_list(group: &mut Mapping, key: &str) {
    if let Some(Value::Sequence(list)) = group.get_mut(key) {
        retain_unmarked(list, value_text);
    }
}

/// Drop every item whose label contains [`URL_TEST_MARKER`], keeping the
/// order of the rest.
pub fn retain_unmarked<T, F>(items: &mut Vec<T>, label: F)
where
    F: Fn(&T) -> String,
{
    items.retain(|item| !label(item).contains(URL_TEST_MARKER));
}

/// Text of a list entry as the daemon would display it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Proxy definitions are judged by their `name`.
fn proxy_label(value: &Value) -> String {
    match value.get("name") {
        Some(name) => value_text(name),
        None => value_text(value),
    }
}

fn key_list(root: &Mapping) -> String {
    root.keys()
        .map(value_text)
        .collect::<Vec<_>>()
        .join(", ")
}
