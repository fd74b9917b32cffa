//! 外部コマンドの起動: fork → リダイレクト → プロセスグループ → ターミナル → exec。
//!
//! ## 処理の流れ
//!
//! | 段階 | 親プロセス | 子プロセス |
//! |------|-----------|-----------|
//! | fork 前 | リダイレクト先を開く、argv を構築 |: |
//! | fork 後 | `setpgid(child, child)`（競合を許容）、`tcsetpgrp` | `dup2` → `close`、`setpgid(0, 0)`、`tcsetpgrp`、SIG_DFL、`execv` |
//! | 待機 | `waitpid(WUNTRACED)` → ターミナルと termios を取り戻す |: |
//!
//! 子プロセス側では fork 後に確保を行わず、`libc` の呼び出しだけで exec まで進む。
//! exec に失敗した子は `_exit` で終了し、インタプリタのコードには戻らない。
//!
//! リダイレクト用の [`File`] は親が所有し、fork 直後（失敗時も含めて）Drop で 1 回だけ close される。

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use libc::pid_t;
use log::{debug, warn};

use crate::error::LaunchError;
use crate::job::{self, ForegroundJob};
use crate::redirect::Redirect;
use crate::shell::Shell;
use crate::signals::SignalPolicy;
use crate::tokenizer::Tokens;

// ── CStringVec ────────────────────────────────────────────────────

/// execv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
struct CStringVec {
    _strings: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl CStringVec {
    /// トークン列から構築する。NUL バイトを含むトークンがあればエラー。
    fn from_tokens(tokens: &Tokens) -> Result<Self, LaunchError> {
        let strings = tokens
            .iter()
            .map(|s| {
                CString::new(s.as_bytes())
                    .map_err(|_| LaunchError::Argument(s.to_string_lossy().into_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut ptrs: Vec<*const libc::c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        ptrs.push(std::ptr::null()); // NULL 終端
        Ok(Self {
            _strings: strings,
            ptrs,
        })
    }

    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }

    /// NULL 終端を除いた要素数。
    #[cfg(test)]
    fn len(&self) -> usize {
        self.ptrs.len() - 1
    }
}

// ── exec 失敗時のステータス ──────────────────────────────────────

/// exec 失敗時の終了ステータス。127 = not found, 126 = permission denied, 1 = その他。
fn exec_failure_status(errno: i32) -> i32 {
    match errno {
        libc::ENOENT => 127,
        libc::EACCES => 126,
        _ => 1,
    }
}

fn exec_failure_reason(errno: i32) -> &'static str {
    match errno {
        libc::ENOENT => "no such file or directory\n",
        libc::EACCES => "permission denied\n",
        libc::ENOEXEC => "exec format error\n",
        _ => "exec failed\n",
    }
}

// ── プロセスグループ ──────────────────────────────────────────────

/// 親側から子をそれ自身のプロセスグループに移す。
///
/// 子も exec 前に同じ `setpgid` を行うため、子が先に exec まで進んでいると
/// `EACCES` になる。この場合は子側の設定が済んでいるので成功として扱う。
fn assign_process_group(child: pid_t) -> io::Result<()> {
    if unsafe { libc::setpgid(child, child) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EACCES) {
        debug!("setpgid({}) raced with exec; child already in its group", child);
        return Ok(());
    }
    Err(err)
}

// ── 子プロセス ────────────────────────────────────────────────────

/// fork 後の子プロセス。戻らない。
///
/// ここでは確保を行わず、async-signal-safe な呼び出しだけを使う。
fn exec_child(
    path: &CString,
    argv: &CStringVec,
    redirect_fd: Option<(i32, i32)>,
    terminal_fd: Option<i32>,
    error_prefix: &[u8],
) -> ! {
    unsafe {
        if let Some((fd, slot)) = redirect_fd {
            if libc::dup2(fd, slot) < 0 {
                libc::_exit(1);
            }
            libc::close(fd);
        }

        libc::setpgid(0, 0);
        if let Some(tty) = terminal_fd {
            libc::tcsetpgrp(tty, libc::getpid());
        }
        SignalPolicy::DefaultForJob.apply();

        libc::execv(path.as_ptr(), argv.as_ptr());

        let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
        let reason = exec_failure_reason(errno);
        libc::write(
            libc::STDERR_FILENO,
            error_prefix.as_ptr() as *const libc::c_void,
            error_prefix.len(),
        );
        libc::write(
            libc::STDERR_FILENO,
            reason.as_ptr() as *const libc::c_void,
            reason.len(),
        );
        libc::_exit(exec_failure_status(errno));
    }
}

// ── launch 関数 ───────────────────────────────────────────────────

/// 外部コマンドをフォアグラウンドジョブとして実行し、終了（または停止）を待つ。
///
/// - `path`: 解決済みの実行ファイルパス
/// - `argv`: リダイレクト演算子を除いた引数（`argv[0]` はコマンド名）
/// - `redirect`: リダイレクト計画。開けなければプロセスを作らずにエラーを返す
///
/// 対話モードでは、待機前にターミナルをジョブのグループへ渡し、
/// 待機後に必ずシェルのグループへ戻して termios を復元する。
pub fn launch(
    shell: &Shell,
    path: &Path,
    argv: &Tokens,
    redirect: Option<&Redirect>,
) -> Result<ForegroundJob, LaunchError> {
    let path_bytes = path.as_os_str().as_bytes();
    let c_path = CString::new(path_bytes)
        .map_err(|_| LaunchError::Argument(path.display().to_string()))?;
    let c_argv = CStringVec::from_tokens(argv)?;
    // パスは表示用に変換せず、入力されたバイト列のまま stderr に書く
    let error_prefix = [&b"pgsh: "[..], path_bytes, &b": "[..]].concat();

    // fork 前に開く。失敗すればプロセスは作られない。
    let redirect_file: Option<(File, i32)> = match redirect {
        Some(r) => Some((r.open()?, r.direction.target_fd())),
        None => None,
    };
    let redirect_fd = redirect_file.as_ref().map(|(f, slot)| (f.as_raw_fd(), *slot));
    let terminal_fd = shell.interactive.then_some(shell.terminal_fd);

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        // redirect_file はここで Drop され close される
        return Err(LaunchError::Fork(io::Error::last_os_error()));
    }
    if pid == 0 {
        exec_child(&c_path, &c_argv, redirect_fd, terminal_fd, &error_prefix);
    }

    // 親側の fd は不要。子は dup2 済みの複製を使う。
    drop(redirect_file);
    debug!("launched {} as pid {}", path.display(), pid);

    if let Err(e) = assign_process_group(pid) {
        warn!("setpgid({}) failed: {}", pid, e);
    }
    if let Some(tty) = terminal_fd {
        job::give_terminal_to(tty, pid);
    }

    let outcome = job::wait_for_fg(pid);

    if let Some(tty) = terminal_fd {
        job::take_terminal_back(tty, shell.shell_pgid, shell.tmodes.as_ref());
    }

    let outcome = outcome.map_err(LaunchError::Wait)?;
    debug!("pid {} finished: {:?}", pid, outcome);
    Ok(ForegroundJob { pgid: pid, outcome })
}
