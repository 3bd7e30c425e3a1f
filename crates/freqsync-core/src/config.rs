use crate::error::{Result, SyncError};
use crate::types::FileKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "freqsync.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: String) -> Self {
        Self {
            level: WarnLevel::Warning,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: WarnLevel::Error,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Where tracked files are published.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    Github {
        owner: String,
        repo: String,
        #[serde(default = "default_branch")]
        branch: String,
        /// Overrides `https://api.github.com/repos/{owner}/{repo}`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_url: Option<String>,
        /// Overrides `https://raw.githubusercontent.com/{owner}/{repo}/refs/heads/{branch}`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_url: Option<String>,
    },
    /// A local mirror of the repository layout.
    Directory { path: PathBuf },
}

fn default_branch() -> String {
    "main".to_string()
}

impl SourceConfig {
    /// Locator used to fetch a single file at `remote_path`.
    pub fn file_locator(&self, remote_path: &str) -> String {
        let remote_path = remote_path.trim_start_matches('/');
        match self {
            SourceConfig::Github { .. } => {
                format!("{}/{}", self.raw_base().trim_end_matches('/'), remote_path)
            }
            SourceConfig::Directory { path } => path.join(remote_path).display().to_string(),
        }
    }

    /// Locator used to list the directory at `remote_path`.
    pub fn listing_locator(&self, remote_path: &str) -> String {
        let remote_path = remote_path.trim_matches('/');
        match self {
            SourceConfig::Github { branch, .. } => format!(
                "{}/contents/{}?ref={}",
                self.api_base().trim_end_matches('/'),
                remote_path,
                branch
            ),
            SourceConfig::Directory { path } => path.join(remote_path).display().to_string(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceConfig::Github {
                owner,
                repo,
                branch,
                ..
            } => format!("{owner}/{repo} ({branch})"),
            SourceConfig::Directory { path } => path.display().to_string(),
        }
    }

    fn api_base(&self) -> String {
        match self {
            SourceConfig::Github {
                owner,
                repo,
                api_url,
                ..
            } => api_url
                .clone()
                .unwrap_or_else(|| format!("https://api.github.com/repos/{owner}/{repo}")),
            SourceConfig::Directory { path } => path.display().to_string(),
        }
    }

    fn raw_base(&self) -> String {
        match self {
            SourceConfig::Github {
                owner,
                repo,
                branch,
                raw_url,
                ..
            } => raw_url.clone().unwrap_or_else(|| {
                format!("https://raw.githubusercontent.com/{owner}/{repo}/refs/heads/{branch}")
            }),
            SourceConfig::Directory { path } => path.display().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tracked file configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticFile {
    pub name: String,
    pub local_path: PathBuf,
    /// Path of the file inside the source repository.
    pub remote_path: String,
    #[serde(default = "default_static_kind")]
    pub kind: FileKind,
    #[serde(default)]
    pub version_check: bool,
}

fn default_static_kind() -> FileKind {
    FileKind::Strategy
}

/// A remote directory whose matching files are all tracked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DynamicFolder {
    pub name: String,
    pub local_path: PathBuf,
    pub remote_path: String,
    /// Allowed extensions including the leading dot, e.g. `.json`.
    #[serde(default)]
    pub file_extensions: Vec<String>,
}

impl DynamicFolder {
    /// Case-insensitive extension match against the allow-list.
    pub fn allows(&self, file_name: &str) -> bool {
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = format!(".{}", ext.to_lowercase());
        self.file_extensions
            .iter()
            .any(|allowed| allowed.to_lowercase() == ext)
    }
}

// ---------------------------------------------------------------------------
// RestartConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestartConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_stop_command")]
    pub stop_command: String,
    #[serde(default = "default_start_command")]
    pub start_command: String,
    /// Directory the commands run in (defaults to the config file's directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_stop_command() -> String {
    "docker compose down".to_string()
}

fn default_start_command() -> String {
    "docker compose up -d".to_string()
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stop_command: default_stop_command(),
            start_command: default_start_command(),
            working_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// HttpConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_host")]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
    #[serde(default = "default_proxy_protocol")]
    pub protocol: String,
}

fn default_proxy_host() -> String {
    "localhost".to_string()
}

fn default_proxy_port() -> u16 {
    9090
}

fn default_proxy_protocol() -> String {
    "http".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_proxy_host(),
            port: default_proxy_port(),
            protocol: default_proxy_protocol(),
        }
    }
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra headers sent with raw file requests.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("freqsync/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// ---------------------------------------------------------------------------
// TelegramConfig / ConcurrencyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    pub fn is_usable(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        self.enabled && filled(&self.bot_token) && filled(&self.chat_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcurrencyConfig {
    /// Maximum number of files compared at the same time.
    #[serde(default = "default_detect_concurrency")]
    pub detect: usize,
}

fn default_detect_concurrency() -> usize {
    4
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            detect: default_detect_concurrency(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_interval_minutes")]
    pub check_interval_minutes: u64,
    pub source: SourceConfig,
    #[serde(default)]
    pub static_files: Vec<StaticFile>,
    #[serde(default)]
    pub dynamic_folders: Vec<DynamicFolder>,
    #[serde(default)]
    pub restart: RestartConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

fn default_version() -> u32 {
    1
}

fn default_interval_minutes() -> u64 {
    60
}

impl Config {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            version: default_version(),
            check_interval_minutes: default_interval_minutes(),
            source,
            static_files: Vec::new(),
            dynamic_folders: Vec::new(),
            restart: RestartConfig::default(),
            http: HttpConfig::default(),
            telegram: TelegramConfig::default(),
            concurrency: ConcurrencyConfig::default(),
        }
    }

    /// Configuration written by `freqsync init`: the NostalgiaForInfinity X6
    /// strategy plus its `configs/` folder, one directory above the config.
    pub fn starter() -> Self {
        let mut cfg = Self::new(SourceConfig::Github {
            owner: "iterativv".to_string(),
            repo: "NostalgiaForInfinity".to_string(),
            branch: default_branch(),
            api_url: None,
            raw_url: None,
        });
        cfg.static_files.push(StaticFile {
            name: "NostalgiaForInfinityX6.py".to_string(),
            local_path: PathBuf::from("../NostalgiaForInfinityX6.py"),
            remote_path: "NostalgiaForInfinityX6.py".to_string(),
            kind: FileKind::Strategy,
            version_check: true,
        });
        cfg.dynamic_folders.push(DynamicFolder {
            name: "configs".to_string(),
            local_path: PathBuf::from("../configs"),
            remote_path: "configs".to_string(),
            file_extensions: [".json", ".toml", ".yaml", ".yml", ".txt", ".md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        });
        cfg
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    /// Load the config at `path` and resolve relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let mut cfg = Self::from_yaml(&data)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        cfg.resolve_paths(base);
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Make every relative local path absolute-ish by joining it onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for file in &mut self.static_files {
            resolve(&mut file.local_path);
        }
        for folder in &mut self.dynamic_folders {
            resolve(&mut folder.local_path);
        }
        if let SourceConfig::Directory { path } = &mut self.source {
            resolve(path);
        }
        match &mut self.restart.working_dir {
            Some(dir) => resolve(dir),
            None => self.restart.working_dir = Some(base.to_path_buf()),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        match &self.source {
            SourceConfig::Github {
                owner,
                repo,
                branch,
                ..
            } => {
                if owner.trim().is_empty() || repo.trim().is_empty() {
                    warnings.push(ConfigWarning::error(
                        "source.owner and source.repo must not be empty".to_string(),
                    ));
                }
                if branch.trim().is_empty() {
                    warnings.push(ConfigWarning::error(
                        "source.branch must not be empty".to_string(),
                    ));
                }
            }
            SourceConfig::Directory { path } => {
                if path.as_os_str().is_empty() {
                    warnings.push(ConfigWarning::error(
                        "source.path must not be empty".to_string(),
                    ));
                }
            }
        }

        if self.check_interval_minutes == 0 {
            warnings.push(ConfigWarning::error(
                "check_interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.http.timeout_seconds == 0 {
            warnings.push(ConfigWarning::error(
                "http.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.concurrency.detect == 0 {
            warnings.push(ConfigWarning::error(
                "concurrency.detect must be at least 1".to_string(),
            ));
        }

        for (i, file) in self.static_files.iter().enumerate() {
            if file.name.trim().is_empty()
                || file.remote_path.trim().is_empty()
                || file.local_path.as_os_str().is_empty()
            {
                warnings.push(ConfigWarning::error(format!(
                    "static_files[{i}] needs a name, local_path and remote_path"
                )));
            }
            if file.version_check && file.kind == FileKind::Config {
                warnings.push(ConfigWarning::warning(format!(
                    "static file '{}' requests version_check but is kind 'config'; it will be hash-checked",
                    file.name
                )));
            }
        }

        for folder in &self.dynamic_folders {
            if folder.remote_path.trim().is_empty() || folder.local_path.as_os_str().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "dynamic folder '{}' needs a local_path and remote_path",
                    folder.name
                )));
            }
            if folder.file_extensions.is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "dynamic folder '{}' has no file_extensions; nothing would be tracked",
                    folder.name
                )));
            }
            for ext in &folder.file_extensions {
                if !ext.starts_with('.') || ext.len() < 2 {
                    warnings.push(ConfigWarning::error(format!(
                        "dynamic folder '{}' has extension '{ext}'; extensions must look like '.json'",
                        folder.name
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for file in &self.static_files {
            if !seen.insert(&file.local_path) {
                warnings.push(ConfigWarning::warning(format!(
                    "local path '{}' is used by more than one static file",
                    file.local_path.display()
                )));
            }
        }

        if self.restart.enabled {
            if self.restart.stop_command.trim().is_empty() {
                warnings.push(ConfigWarning::error(
                    "restart is enabled but restart.stop_command is empty".to_string(),
                ));
            }
            if self.restart.start_command.trim().is_empty() {
                warnings.push(ConfigWarning::error(
                    "restart is enabled but restart.start_command is empty".to_string(),
                ));
            }
        }

        if self.http.proxy.enabled && self.http.proxy.host.trim().is_empty() {
            warnings.push(ConfigWarning::warning(
                "proxy is enabled but http.proxy.host is empty".to_string(),
            ));
        }

        if self.telegram.enabled && !self.telegram.is_usable() {
            warnings.push(ConfigWarning::warning(
                "telegram is enabled but bot_token or chat_id is missing; notifications will be skipped"
                    .to_string(),
            ));
        }

        warnings
    }

    /// Fail with [`SyncError::InvalidConfig`] if validation found any error.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors: Vec<String> = self
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SyncError::InvalidConfig(errors.join("; ")))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn github() -> SourceConfig {
        SourceConfig::Github {
            owner: "iterativv".to_string(),
            repo: "NostalgiaForInfinity".to_string(),
            branch: "main".to_string(),
            api_url: None,
            raw_url: None,
        }
    }

    #[test]
    fn starter_config_roundtrip() {
        let cfg = Config::starter();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert!(parsed.validate().is_empty());
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let yaml = "source:\n  type: github\n  owner: o\n  repo: r\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.check_interval_minutes, 60);
        assert_eq!(cfg.http.timeout_seconds, 30);
        assert!(!cfg.restart.enabled);
        assert_eq!(cfg.restart.stop_command, "docker compose down");
        assert_eq!(cfg.restart.start_command, "docker compose up -d");
        assert_eq!(cfg.concurrency.detect, 4);
        assert!(matches!(cfg.source, SourceConfig::Github { ref branch, .. } if branch == "main"));
    }

    #[test]
    fn github_locators() {
        let src = github();
        assert_eq!(
            src.file_locator("NostalgiaForInfinityX6.py"),
            "https://raw.githubusercontent.com/iterativv/NostalgiaForInfinity/refs/heads/main/NostalgiaForInfinityX6.py"
        );
        assert_eq!(
            src.listing_locator("configs"),
            "https://api.github.com/repos/iterativv/NostalgiaForInfinity/contents/configs?ref=main"
        );
    }

    #[test]
    fn github_locator_overrides() {
        let src = SourceConfig::Github {
            owner: "o".to_string(),
            repo: "r".to_string(),
            branch: "dev".to_string(),
            api_url: Some("http://127.0.0.1:9000/api/".to_string()),
            raw_url: Some("http://127.0.0.1:9000/raw".to_string()),
        };
        assert_eq!(src.file_locator("/a/b.json"), "http://127.0.0.1:9000/raw/a/b.json");
        assert_eq!(
            src.listing_locator("configs/"),
            "http://127.0.0.1:9000/api/contents/configs?ref=dev"
        );
    }

    #[test]
    fn directory_source_yaml() {
        let yaml = "source:\n  type: directory\n  path: mirror\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Directory {
                path: PathBuf::from("mirror")
            }
        );
    }

    #[test]
    fn folder_extension_match_is_case_insensitive() {
        let folder = DynamicFolder {
            name: "configs".to_string(),
            local_path: PathBuf::from("configs"),
            remote_path: "configs".to_string(),
            file_extensions: vec![".json".to_string(), ".YML".to_string()],
        };
        assert!(folder.allows("pairlist.json"));
        assert!(folder.allows("PAIRLIST.JSON"));
        assert!(folder.allows("a.yml"));
        assert!(!folder.allows("script.py"));
        assert!(!folder.allows("README"));
    }

    #[test]
    fn load_missing_config_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("freqsync.yaml")).unwrap_err();
        assert!(matches!(err, SyncError::ConfigNotFound(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn load_resolves_relative_paths_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("freqsync.yaml");
        Config::starter().save(&path).unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(
            cfg.static_files[0].local_path,
            dir.path().join("../NostalgiaForInfinityX6.py")
        );
        assert_eq!(cfg.dynamic_folders[0].local_path, dir.path().join("../configs"));
        assert_eq!(cfg.restart.working_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn validate_zero_interval_is_error() {
        let mut cfg = Config::new(github());
        cfg.check_interval_minutes = 0;
        let err = cfg.ensure_valid().unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(ref m) if m.contains("check_interval_minutes")));
    }

    #[test]
    fn validate_restart_requires_commands() {
        let mut cfg = Config::new(github());
        cfg.restart.enabled = true;
        cfg.restart.start_command = "  ".to_string();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("start_command")));
    }

    #[test]
    fn validate_restart_disabled_ignores_commands() {
        let mut cfg = Config::new(github());
        cfg.restart.stop_command.clear();
        assert!(cfg.ensure_valid().is_ok());
    }

    #[test]
    fn validate_bad_extension() {
        let mut cfg = Config::starter();
        cfg.dynamic_folders[0].file_extensions = vec!["json".to_string()];
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("extensions must look like")));
    }

    #[test]
    fn validate_empty_extension_list() {
        let mut cfg = Config::starter();
        cfg.dynamic_folders[0].file_extensions.clear();
        assert!(cfg.ensure_valid().is_err());
    }

    #[test]
    fn validate_version_check_on_config_kind_is_warning_only() {
        let mut cfg = Config::starter();
        cfg.static_files[0].kind = FileKind::Config;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("hash-checked")));
        assert!(cfg.ensure_valid().is_ok());
    }

    #[test]
    fn validate_duplicate_local_path_warning() {
        let mut cfg = Config::starter();
        let dup = cfg.static_files[0].clone();
        cfg.static_files.push(dup);
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.message.contains("more than one static file")));
    }

    #[test]
    fn telegram_usable_requires_token_and_chat() {
        let mut tg = TelegramConfig {
            enabled: true,
            bot_token: Some("123:abc".to_string()),
            chat_id: None,
        };
        assert!(!tg.is_usable());
        tg.chat_id = Some("42".to_string());
        assert!(tg.is_usable());
        tg.enabled = false;
        assert!(!tg.is_usable());
    }

    #[test]
    fn proxy_url() {
        let proxy = ProxyConfig::default();
        assert_eq!(proxy.url(), "http://localhost:9090");
    }
}
