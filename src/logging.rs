//! ログ出力の初期化。
//!
//! シェルの stdout/stderr はユーザのコマンドのものなので、ログは常にファイルへ書く
//! （`simplelog::WriteLogger`）。ファイルを開けない場合やレベルが `off` の場合は
//! ロガーを登録せず、`log` マクロは何も出力しない。

use std::fs::{self, OpenOptions};
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::Config;

/// レベル文字列を解釈する。不正な値は `Warn` として扱う。
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Warn)
}

/// 設定に従ってロガーを登録する。失敗しても黙って続行する。
pub fn init(config: &Config) {
    let level = parse_level(&config.log.level);
    if level == LevelFilter::Off {
        return;
    }
    let Some(path) = config.log_file() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .build();
    let _ = WriteLogger::init(level, log_config, file);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" INFO "), LevelFilter::Info);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("loud"), LevelFilter::Warn);
    }
}
