use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default settings file looked up in the working directory (`clashdock.toml`).
pub const SETTINGS_FILE: &str = "clashdock";

/// Files the launcher reads and writes, relative to the working directory
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Directory scanned for the operator's Clash configuration
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Persisted controller secret
    #[serde(default = "default_secret_file")]
    pub secret_file: PathBuf,
    /// Generated configuration mounted into the daemon container
    #[serde(default = "default_output_config")]
    pub output_config: PathBuf,
    /// GeoIP database copied into the daemon container
    #[serde(default = "default_geoip_db")]
    pub geoip_db: PathBuf,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_secret_file() -> PathBuf {
    PathBuf::from("clash_secret.txt")
}

fn default_output_config() -> PathBuf {
    PathBuf::from("config/config.yaml")
}

fn default_geoip_db() -> PathBuf {
    PathBuf::from("Country.mmdb")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            secret_file: default_secret_file(),
            output_config: default_output_config(),
            geoip_db: default_geoip_db(),
        }
    }
}

/// External controller (control plane) settings
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Host the launcher uses to reach the controller
    #[serde(default = "default_controller_host")]
    pub host: String,
    /// Address the daemon binds the controller to inside the container
    #[serde(default = "default_controller_bind")]
    pub bind: String,
    #[serde(default = "default_controller_port")]
    pub port: u16,
    /// Per-request timeout
    #[serde(default = "default_controller_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed pause between attempts
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,
}

fn default_controller_host() -> String {
    "127.0.0.1".to_string()
}

fn default_controller_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_controller_port() -> u16 {
    9090
}

fn default_controller_timeout() -> u64 {
    3
}

fn default_max_attempts() -> u32 {
    10
}

fn default_backoff() -> u64 {
    2
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: default_controller_host(),
            bind: default_controller_bind(),
            port: default_controller_port(),
            timeout_secs: default_controller_timeout(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff(),
        }
    }
}

/// Data-plane listen ports written into the generated configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Host the launcher uses to reach the proxy port
    #[serde(default = "default_proxy_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_socks_port")]
    pub socks_port: u16,
    #[serde(default = "default_http_port")]
    pub mixed_port: u16,
}

fn default_proxy_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    7890
}

fn default_socks_port() -> u16 {
    7891
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_proxy_host(),
            port: default_http_port(),
            socks_port: default_socks_port(),
            mixed_port: default_http_port(),
        }
    }
}

/// YACD dashboard settings
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

fn default_dashboard_port() -> u16 {
    8080
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: default_dashboard_port(),
        }
    }
}

/// A named URL fetched through the proxy during connectivity probing
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProbeSite {
    pub name: String,
    pub url: String,
}

impl ProbeSite {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Connectivity probe settings
#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_sites")]
    pub sites: Vec<ProbeSite>,
    #[serde(default = "default_site_timeout")]
    pub site_timeout_secs: u64,
    /// Fetched without the proxy; expected to fail when traffic is intercepted
    #[serde(default = "default_direct_target")]
    pub direct_target: String,
    #[serde(default = "default_direct_timeout")]
    pub direct_timeout_secs: u64,
    /// Pause before probing right after the services start
    #[serde(default = "default_warmup")]
    pub warmup_secs: u64,
    /// Pause before probing from `clashdock status`
    #[serde(default = "default_status_warmup")]
    pub status_warmup_secs: u64,
}

fn default_probe_sites() -> Vec<ProbeSite> {
    vec![
        ProbeSite::new("Google", "https://www.google.com"),
        ProbeSite::new("YouTube", "https://www.youtube.com"),
        ProbeSite::new("GitHub", "https://github.com"),
    ]
}

fn default_site_timeout() -> u64 {
    10
}

fn default_direct_target() -> String {
    "https://www.google.com".to_string()
}

fn default_direct_timeout() -> u64 {
    5
}

fn default_warmup() -> u64 {
    5
}

fn default_status_warmup() -> u64 {
    2
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            sites: default_probe_sites(),
            site_timeout_secs: default_site_timeout(),
            direct_target: default_direct_target(),
            direct_timeout_secs: default_direct_timeout(),
            warmup_secs: default_warmup(),
            status_warmup_secs: default_status_warmup(),
        }
    }
}

/// Container engine settings
#[derive(Debug, Deserialize, Clone)]
pub struct ComposeConfig {
    /// Engine CLI binary
    #[serde(default = "default_program")]
    pub program: String,
    /// Daemon container name
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default = "default_dashboard_container")]
    pub dashboard_container: String,
    /// Images removed on uninstall
    #[serde(default = "default_images")]
    pub images: Vec<String>,
    /// Directory inside the daemon container holding the GeoIP database
    #[serde(default = "default_container_config_dir")]
    pub container_config_dir: String,
}

fn default_program() -> String {
    "docker".to_string()
}

fn default_container() -> String {
    "clash".to_string()
}

fn default_dashboard_container() -> String {
    "yacd".to_string()
}

fn default_images() -> Vec<String> {
    vec![
        "dreamacro/clash:latest".to_string(),
        "haishanh/yacd:latest".to_string(),
    ]
}

fn default_container_config_dir() -> String {
    "/root/.config/clash".to_string()
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            container: default_container(),
            dashboard_container: default_dashboard_container(),
            images: default_images(),
            container_config_dir: default_container_config_dir(),
        }
    }
}

/// GeoIP database download
#[derive(Debug, Deserialize, Clone)]
pub struct GeoipConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_geoip_url")]
    pub url: String,
    #[serde(default = "default_geoip_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_geoip_url() -> String {
    "https://gh-proxy.com/https://github.com/Dreamacro/maxmind-geoip/releases/latest/download/Country.mmdb"
        .to_string()
}

fn default_geoip_timeout() -> u64 {
    30
}

impl Default for GeoipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_geoip_url(),
            timeout_secs: default_geoip_timeout(),
        }
    }
}

/// Public address lookup, used only for printing access URLs
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default = "default_ip_services")]
    pub ip_services: Vec<String>,
    #[serde(default = "default_discovery_timeout")]
    pub timeout_secs: u64,
}

fn default_ip_services() -> Vec<String> {
    [
        "https://api.ipify.org",
        "https://ifconfig.me",
        "https://icanhazip.com",
        "https://ipinfo.io/ip",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_discovery_timeout() -> u64 {
    5
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ip_services: default_ip_services(),
            timeout_secs: default_discovery_timeout(),
        }
    }
}

/// Root settings. Passed explicitly to every operation.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
    #[serde(default)]
    pub geoip: GeoipConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl AppConfig {
    /// Load settings from defaults, an optional settings file and the environment.
    ///
    /// An explicit `settings` path must exist; the default `clashdock.toml`
    /// is optional.
    pub fn load(settings: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match settings {
            Some(path) => File::from(path).required(true),
            None => File::with_name(SETTINGS_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            // e.g., CLASHDOCK__CONTROLLER__PORT, CLASHDOCK__PATHS__SECRET_FILE
            .add_source(
                Environment::with_prefix("CLASHDOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ControllerConfig {
    /// Base URL the launcher uses, e.g. `http://127.0.0.1:9090`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Helper to build an endpoint URL with proper slash handling
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url();
        let path = path.trim_start_matches('/');
        format!("{}/{}", base.trim_end_matches('/'), path)
    }

    /// Value for the daemon's `external-controller` key
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl PathsConfig {
    /// Directory holding the generated configuration and its backups
    pub fn output_dir(&self) -> PathBuf {
        self.output_config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
