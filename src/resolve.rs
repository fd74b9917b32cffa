//! コマンド解決: ビルトイン / パス指定 / `$PATH` 検索。
//!
//! - ビルトイン名に完全一致 → [`Resolution::Builtin`]
//! - `/`・`./`・`../` で始まる → そのままパスとして扱う（存在確認は exec 時）
//! - それ以外 → `$PATH` の各ディレクトリを順に調べ、実行権限のある最初の候補を返す
//!
//! ファイルシステムへの副作用はなく、`access(2)` と `stat(2)` による読み取りのみ。

use std::env;
use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::builtins;

/// [`resolve`] の結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// [`BUILTINS`](crate::builtins::BUILTINS) の index。
    Builtin(usize),
    /// exec に渡す実行ファイルのパス。
    Path(PathBuf),
    /// `$PATH` 未設定、または候補なし。
    NotFound,
}

/// 現在の `$PATH` を使ってコマンドを解決する。
pub fn resolve(command: &OsStr) -> Resolution {
    let path_var = env::var_os("PATH");
    resolve_in(command, path_var.as_deref())
}

/// `path_var` を検索パスとしてコマンドを解決する。`None` は `$PATH` 未設定を表す。
pub fn resolve_in(command: &OsStr, path_var: Option<&OsStr>) -> Resolution {
    if let Some(index) = builtins::lookup(command) {
        return Resolution::Builtin(index);
    }
    if is_explicit_path(command) {
        return Resolution::Path(PathBuf::from(command));
    }
    let Some(path_var) = path_var else {
        return Resolution::NotFound;
    };
    // 空要素はスキップする（カレントディレクトリとは解釈しない）
    for dir in path_var.as_bytes().split(|&b| b == b':').filter(|d| !d.is_empty()) {
        let candidate = Path::new(OsStr::from_bytes(dir)).join(command);
        if is_executable(&candidate) {
            return Resolution::Path(candidate);
        }
    }
    Resolution::NotFound
}

/// 明示的なパス指定（絶対パス、`./`、`../`）か。
fn is_explicit_path(command: &OsStr) -> bool {
    let bytes = command.as_bytes();
    bytes.starts_with(b"/") || bytes.starts_with(b"./") || bytes.starts_with(b"../")
}

/// 現在のユーザに実行権限があり、ディレクトリでないか。
fn is_executable(candidate: &Path) -> bool {
    let Ok(c_path) = CString::new(candidate.as_os_str().as_bytes()) else {
        return false;
    };
    if unsafe { libc::access(c_path.as_ptr(), libc::X_OK) } != 0 {
        return false;
    }
    !candidate.is_dir()
}
