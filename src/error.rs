//! エラー型。
//!
//! 失敗の種類ごとに enum を分け、ループ側で `pgsh: <message>` として表示する。
//! [`SetupError`] だけが致命的で、それ以外は現在のコマンドを破棄してループを継続する。

use std::io;
use std::path::PathBuf;

/// リダイレクトの構文エラー、またはターゲットファイルのオープン失敗。
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    /// `<` / `>` の直後にファイル名がない。
    #[error("syntax error: missing redirect target after `{0}`")]
    MissingTarget(String),
    /// `>>` 等の未対応演算子。
    #[error("syntax error: unknown redirection operator `{0}`")]
    UnknownOperator(String),
    /// 1 行に演算子が 2 回以上現れた。
    #[error("syntax error: multiple redirections are not supported")]
    MultipleRedirections,
    /// ターゲットファイルを開けなかった。子プロセスは作成されない。
    #[error("{}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RedirectError {
    /// 対応する終了ステータス。構文エラーは 2、オープン失敗は 1。
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::Open { .. } => 1,
            _ => 2,
        }
    }
}

/// 外部コマンド起動の失敗。
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// 引数に NUL バイトが含まれ、argv を構築できない。
    #[error("{0}: argument contains a NUL byte")]
    Argument(String),
    /// `fork(2)` の失敗。
    #[error("fork failed: {0}")]
    Fork(#[source] io::Error),
    /// 子プロセスの状態を回収できなかった。
    #[error("waitpid failed: {0}")]
    Wait(#[source] io::Error),
    /// リダイレクト先を開けなかった。子プロセスは作成されていない。
    #[error(transparent)]
    Redirect(#[from] RedirectError),
}

impl LaunchError {
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::Argument(_) => 126,
            Self::Fork(_) | Self::Wait(_) => 1,
            Self::Redirect(e) => e.exit_status(),
        }
    }
}

/// 起動時のプロセスグループ/ターミナル掌握の失敗。インタプリタは続行できない。
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("couldn't put the shell in its own process group: {0}")]
    ProcessGroup(#[source] io::Error),
    #[error("couldn't take control of the terminal: {0}")]
    Terminal(#[source] io::Error),
}
