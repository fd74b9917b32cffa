//! 設定ファイルの読み込み。
//!
//! 解決順:
//! 1. 組み込みのデフォルト
//! 2. `$PGSH_CONFIG`、なければ `~/.config/pgsh/config.toml`（存在すれば）
//! 3. 環境変数 `PGSH_LOG`（ログレベルのみ上書き）
//!
//! ```toml
//! [log]
//! level = "debug"
//! file = "/tmp/pgsh.log"
//!
//! [prompt]
//! enabled = true
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// `off` / `error` / `warn` / `info` / `debug` / `trace`。
    #[serde(default = "default_level")]
    pub level: String,
    /// ログファイル。省略時は `~/.local/share/pgsh/pgsh.log`。
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct PromptConfig {
    /// false なら対話モードでも行番号プロンプトを出さない。
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// 設定ファイルと環境変数から読み込む。エラーは stderr に報告してデフォルトを使う。
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) => Self::load_file(&path),
            None => Self::default(),
        };
        config.apply_env(env::var("PGSH_LOG").ok());
        config
    }

    fn load_file(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match Self::from_toml_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("pgsh: config: {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `PGSH_LOG` の値でログレベルを上書きする。
    fn apply_env(&mut self, level: Option<String>) {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.log.level = level.trim().to_string();
        }
    }

    /// ログファイルのパス。設定がなければ `$HOME/.local/share/pgsh/pgsh.log`。
    pub fn log_file(&self) -> Option<PathBuf> {
        if let Some(file) = &self.log.file {
            return Some(file.clone());
        }
        let home = env::var_os("HOME")?;
        Some(Path::new(&home).join(".local/share/pgsh/pgsh.log"))
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("PGSH_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let home = env::var_os("HOME")?;
    Some(Path::new(&home).join(".config/pgsh/config.toml"))
}
