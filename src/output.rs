//! Operator-facing status lines and summaries.
//!
//! Diagnostics go through `tracing` to stderr; everything here is the
//! human-readable report printed to stdout.

use crate::config::AppConfig;
use crate::probe::{EgressReport, Verdict};
use crate::secret::ApiSecret;
use clashdock_types::{total_candidates, ProxyGroupSnapshot};
use std::fmt::Display;

const RULE: &str = "==================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Error,
    Warning,
    Processing,
}

impl Status {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Warning => "⚠️",
            Self::Processing => "🔄",
        }
    }
}

pub fn format_status(kind: Status, message: impl Display) -> String {
    format!("{} {}", kind.marker(), message)
}

pub fn status(kind: Status, message: impl Display) {
    println!("{}", format_status(kind, message));
}

pub fn info(message: impl Display) {
    status(Status::Info, message);
}

pub fn success(message: impl Display) {
    status(Status::Success, message);
}

pub fn error(message: impl Display) {
    status(Status::Error, message);
}

pub fn warning(message: impl Display) {
    status(Status::Warning, message);
}

pub fn processing(message: impl Display) {
    status(Status::Processing, message);
}

pub fn banner(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count().max(28)));
}

pub fn section(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", RULE);
}

/// Lines describing the selector groups, one per group, sorted by name.
pub fn group_lines(snapshot: &ProxyGroupSnapshot) -> Vec<String> {
    let mut names: Vec<&String> = snapshot.keys().collect();
    names.sort();

    let mut lines = vec![
        format!("🔗 Proxy groups: {}", snapshot.len()),
        format!("📡 Total candidates: {}", total_candidates(snapshot)),
    ];
    for name in names {
        let group = &snapshot[name];
        lines.push(format!(
            "   • {}: {} proxies (current: {})",
            name,
            group.all.len(),
            group.now.as_deref().unwrap_or("unknown")
        ));
    }
    lines
}

pub fn group_summary(snapshot: &ProxyGroupSnapshot) {
    section("📊 Proxy status:");
    for line in group_lines(snapshot) {
        println!("{}", line);
    }
}

/// Printed when the controller never answered.
pub fn controller_unavailable() {
    println!();
    println!("⚠️  Could not read proxy status from the controller");
    println!("Possible causes:");
    println!("  • Clash is still starting");
    println!("  • The controller port is not ready yet");
    println!("  • The configuration was rejected");
    println!("Try:");
    println!("  • clashdock status (again in a minute)");
    println!("  • docker compose logs clash");
}

pub fn access_lines(
    config: &AppConfig,
    public_ip: Option<&str>,
    secret: Option<&ApiSecret>,
) -> Vec<String> {
    let host = public_ip.unwrap_or("<server-ip>");
    let mut lines = vec![
        format!("YACD dashboard: http://{}:{}", host, config.dashboard.port),
        format!("Proxy port: {}:{} (HTTP/SOCKS5)", host, config.proxy.port),
        String::new(),
        "Enter the controller URL and secret in the dashboard:".to_string(),
        format!("Controller: {}", config.controller.base_url()),
    ];
    match secret {
        Some(secret) => lines.push(format!("Secret: {}", secret.expose())),
        None => lines.push("Secret: <not provisioned>".to_string()),
    }
    lines.push(String::new());
    lines.push("Terminal proxy:".to_string());
    lines.push(format!("export http_proxy={}", config.proxy.url()));
    lines.push(format!("export https_proxy={}", config.proxy.url()));
    lines
}

pub fn access_info(config: &AppConfig, public_ip: Option<&str>, secret: Option<&ApiSecret>) {
    section("🌐 Access:");
    for line in access_lines(config, public_ip, secret) {
        println!("{}", line);
    }
    println!("{}", RULE);
}

pub fn egress_summary(report: &EgressReport) {
    match report.verdict() {
        Verdict::Healthy => success(format!(
            "🎉 Connectivity check passed: all {} sites reachable",
            report.total
        )),
        Verdict::Failed => error("Connectivity check failed: no site reachable through the proxy"),
        Verdict::Degraded => warning(format!(
            "Connectivity check finished: {}/{} sites reachable",
            report.success, report.total
        )),
    }
}

pub fn management_hints() {
    println!();
    println!("💡 Show the secret:   clashdock secret");
    println!("💡 Check status:      clashdock status");
    println!("💡 Test connectivity: clashdock test");
    println!("💡 Uninstall:         clashdock uninstall");
}
