use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tracker: TrackerConfig,
    pub preflight: PreflightConfig,
    pub browser: BrowserConfig,
    pub sink: SinkConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_true")]
    pub headless: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    pub db_path: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreflightConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub check_dns: bool,
    #[serde(default)]
    pub check_ssl: bool,
    #[serde(default = "default_dns_concurrency")]
    pub dns_concurrency: usize,
    #[serde(default = "default_ssl_concurrency")]
    pub ssl_concurrency: usize,
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_seconds: u64,
    #[serde(default = "default_ssl_timeout")]
    pub ssl_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub skip_dns_failed: bool,
    #[serde(default)]
    pub skip_ssl_failed: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_soft_timeout")]
    pub soft_timeout_seconds: u64,
    #[serde(default = "default_hard_timeout")]
    pub hard_timeout_seconds: u64,
    #[serde(default = "default_settle")]
    pub settle_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_crash_probe_hz")]
    pub crash_probe_hz: f64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_error_dir")]
    pub error_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_seconds: u64,
    #[serde(default = "default_progress_dir")]
    pub progress_dir: String,
    #[serde(default = "default_true")]
    pub skip_verification: bool,
}

fn default_true() -> bool {
    true
}
fn default_concurrency() -> usize {
    8
}
fn default_max_retries() -> u32 {
    2
}
fn default_dns_concurrency() -> usize {
    20
}
fn default_ssl_concurrency() -> usize {
    10
}
fn default_dns_timeout() -> u64 {
    3
}
fn default_ssl_timeout() -> u64 {
    5
}
fn default_soft_timeout() -> u64 {
    25
}
fn default_hard_timeout() -> u64 {
    65
}
fn default_settle() -> u64 {
    6
}
fn default_crash_probe_hz() -> f64 {
    4.0
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}
fn default_output_dir() -> String {
    "store".to_string()
}
fn default_error_dir() -> String {
    "errors".to_string()
}
fn default_batch_size() -> u64 {
    50
}
fn default_inter_batch_delay() -> u64 {
    5
}
fn default_progress_dir() -> String {
    ".".to_string()
}
