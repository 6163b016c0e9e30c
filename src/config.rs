use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::client::{Auth, DEFAULT_TIMEOUT_SECONDS, JiraConfig};
use crate::coordinator::RefreshConfig;
use crate::error::{Error, Result};
use crate::models::FilterSpec;

/// フィルターごとの最大取得件数のデフォルト
pub const DEFAULT_MAX_RESULTS: u32 = 100;
/// リフレッシュ間隔（分）のデフォルト
pub const DEFAULT_REFRESH_MINUTES: u32 = 5;
/// リフレッシュ間隔の下限。APIへの過負荷を避ける
pub const MIN_REFRESH_MINUTES: u32 = 5;

/// アプリケーション設定
///
/// JSON設定ファイルまたは環境変数から読み込む。資格情報は検証済みの
/// 不透明な文字列として扱い、ここでは形式チェックしかしない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub base_url: String,
    /// Jira Cloudではメールアドレス
    pub username: String,
    pub api_token: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

fn default_verify_ssl() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_refresh_minutes() -> u32 {
    DEFAULT_REFRESH_MINUTES
}

impl Settings {
    /// 設定を読み込む
    ///
    /// 明示されたパス → デフォルトパスの既存ファイル → 環境変数の順で探す。
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path).await;
        }

        if let Ok(default_path) = Self::default_config_path() {
            if default_path.exists() {
                return Self::from_file(&default_path).await;
            }
        }

        Self::from_env()
    }

    /// デフォルトの設定ファイルパスを取得
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigurationMissing("設定ディレクトリが見つかりません".to_string()))?
            .join("jira-filters");
        Ok(config_dir.join("config.json"))
    }

    /// JSONファイルから設定を読み込む
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigurationMissing(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// 環境変数から設定を作成する（フィルターは呼び出し側が与える）
    pub fn from_env() -> Result<Self> {
        use std::env;

        let base_url = env::var("JIRA_URL")
            .map_err(|_| Error::ConfigurationMissing("JIRA_URL not found in environment".to_string()))?;

        let username = env::var("JIRA_USER")
            .or_else(|_| env::var("JIRA_EMAIL"))
            .map_err(|_| Error::ConfigurationMissing("JIRA_USER not found in environment".to_string()))?;

        let api_token = env::var("JIRA_API_TOKEN")
            .map_err(|_| Error::ConfigurationMissing("JIRA_API_TOKEN not found in environment".to_string()))?;

        Ok(Self {
            base_url,
            username,
            api_token,
            verify_ssl: default_verify_ssl(),
            timeout_seconds: default_timeout_seconds(),
            max_results: default_max_results(),
            refresh_minutes: default_refresh_minutes(),
            filters: Vec::new(),
        })
    }

    /// 致命的な設定不備を検出する。起動時に1回だけ呼ぶ
    pub fn validate(&self) -> Result<()> {
        require_value("base_url", &self.base_url)?;
        require_value("username", &self.username)?;
        require_value("api_token", &self.api_token)?;

        if self.filters.is_empty() {
            return Err(Error::InvalidConfiguration(
                "No filters configured".to_string(),
            ));
        }

        for spec in &self.filters {
            if spec.id.trim().is_empty() {
                return Err(Error::InvalidConfiguration(
                    "Filter with empty id in configuration".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// 下限を適用したリフレッシュ間隔（分）
    pub fn effective_refresh_minutes(&self) -> u32 {
        self.refresh_minutes.max(MIN_REFRESH_MINUTES)
    }

    /// 接続設定に変換する
    pub fn jira_config(&self) -> Result<JiraConfig> {
        let auth = Auth::Basic {
            username: self.username.clone(),
            api_token: self.api_token.clone(),
        };
        Ok(JiraConfig::new(self.base_url.clone(), auth)?
            .verify_ssl(self.verify_ssl)
            .timeout(Duration::from_secs(self.timeout_seconds)))
    }

    /// サイクル設定に変換する
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig::new()
            .max_results(self.max_results)
            .interval_minutes(self.effective_refresh_minutes())
    }
}

/// 必須値の存在とプレースホルダー混入をチェックする
fn require_value(key: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::ConfigurationMissing(format!(
            "Empty configuration value for: {}",
            key
        )));
    }
    // テンプレートのまま使われた設定値を弾く
    if trimmed.starts_with("your_") || trimmed.contains("your-") || trimmed.contains("your ") {
        return Err(Error::InvalidConfiguration(format!(
            "Configuration value for {} looks like a placeholder; please update it",
            key
        )));
    }
    Ok(())
}
