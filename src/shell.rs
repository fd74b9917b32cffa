//! インタプリタの実行状態と、起動時のターミナル/シグナル掌握。
//!
//! [`Shell`] はプロセス全体で 1 つだけ作られ、REPLループ・ビルトイン・launch に
//! 明示的に渡される。グローバル変数は使わない。
//!
//! ## 起動時の状態遷移
//!
//! ```text
//! Uninitialized ──isatty(0)──▶ ForegroundClaimed（対話モード）
//!               └────────────▶ Passive（非対話モード: ターミナル/シグナルに触れない）
//! ```
//!
//! 対話モードでは:
//! 1. ターミナルのフォアグラウンドグループが自分のグループになるまで SIGTTIN で自身を停止
//! 2. ジョブ制御シグナルを無視（[`SignalPolicy::SuppressedForInterpreter`]）
//! 3. 自身を新しいプロセスグループのリーダーにする（失敗は致命的）
//! 4. ターミナルを掌握し、termios を保存（フォアグラウンドジョブ終了ごとに復元）

use std::io;

use libc::pid_t;
use log::info;

use crate::error::SetupError;
use crate::job::{self, StoppedJob};
use crate::signals::SignalPolicy;

/// シェルの実行状態。REPLループ全体で共有される。
pub struct Shell {
    /// 標準入力がターミナルか。
    pub interactive: bool,
    /// ターミナルのファイルディスクリプタ（STDIN_FILENO）。
    pub terminal_fd: i32,
    /// シェル自身のプロセスグループ ID。
    pub shell_pgid: pid_t,
    /// 起動時に保存した termios。非対話モードでは `None`。
    pub tmodes: Option<libc::termios>,
    /// プロンプトに表示する行番号。0 始まりで 1 行処理するごとに増える。
    pub line_num: usize,
    /// Ctrl+Z で停止されたまま残っているジョブ。
    pub stopped: Vec<StoppedJob>,
    /// 設定ファイルの `prompt.enabled`。false なら対話モードでもプロンプトを出さない。
    pub show_prompt: bool,
    /// `exit` ビルトインで設定される終了コード。
    exit_request: Option<i32>,
}

impl Shell {
    /// ターミナルにもシグナルにも触れない非対話モードの状態を作る。
    pub fn passive() -> Self {
        Self {
            interactive: false,
            terminal_fd: libc::STDIN_FILENO,
            shell_pgid: unsafe { libc::getpgrp() },
            tmodes: None,
            line_num: 0,
            stopped: Vec::new(),
            show_prompt: true,
            exit_request: None,
        }
    }

    /// 標準入力を調べ、対話モードならターミナルとプロセスグループを掌握する。
    ///
    /// 自身のプロセスグループを設定できなかった場合は [`SetupError`] を返す。
    /// 呼び出し側はこれを致命的エラーとして扱い、プロセスを終了すること。
    pub fn init() -> Result<Self, SetupError> {
        let mut shell = Self::passive();
        shell.interactive = unsafe { libc::isatty(shell.terminal_fd) } == 1;
        if !shell.interactive {
            info!("stdin is not a terminal; running non-interactively");
            return Ok(shell);
        }

        // フォアグラウンドになるまで自分のグループごと停止して待つ。SIGCONT で再開する。
        loop {
            let pgrp = unsafe { libc::getpgrp() };
            let fg = job::foreground_pgid(shell.terminal_fd).map_err(SetupError::Terminal)?;
            if fg == pgrp {
                break;
            }
            unsafe {
                libc::kill(-pgrp, libc::SIGTTIN);
            }
        }

        SignalPolicy::SuppressedForInterpreter.apply();

        let pid = unsafe { libc::getpid() };
        // セッションリーダーは既にグループリーダーであり、setpgid は EPERM になる
        if unsafe { libc::getpgrp() } != pid && unsafe { libc::setpgid(pid, pid) } != 0 {
            return Err(SetupError::ProcessGroup(io::Error::last_os_error()));
        }
        shell.shell_pgid = pid;

        if unsafe { libc::tcsetpgrp(shell.terminal_fd, pid) } != 0 {
            return Err(SetupError::Terminal(io::Error::last_os_error()));
        }

        let mut tmodes: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(shell.terminal_fd, &mut tmodes) } != 0 {
            return Err(SetupError::Terminal(io::Error::last_os_error()));
        }
        shell.tmodes = Some(tmodes);

        info!("interactive shell started, pgid {}", pid);
        Ok(shell)
    }

    /// `exit` ビルトインから呼ばれ、REPLループを終了させる。
    pub fn request_exit(&mut self, code: i32) {
        self.exit_request = Some(code);
    }

    /// `exit` が要求されていればその終了コード。
    pub fn exit_request(&self) -> Option<i32> {
        self.exit_request
    }

    /// 次の入力行の前に表示するプロンプト。非対話モードでは `None`。
    pub fn prompt(&self) -> Option<String> {
        (self.interactive && self.show_prompt).then(|| format!("{}: ", self.line_num))
    }

    /// 停止ジョブを登録し、`[pgid]+  Stopped   cmd` を stderr に表示する。
    pub fn record_stopped(&mut self, pgid: pid_t, command: String) {
        eprintln!("\n[{}]+  Stopped   {}", pgid, command);
        self.stopped.push(StoppedJob { pgid, command });
    }

    /// 終了前の後始末: 停止ジョブを起こして SIGHUP で終了させる。
    pub fn shutdown(&mut self) {
        job::reap_stopped(&mut self.stopped);
        job::hangup_stopped(&self.stopped);
        self.stopped.clear();
    }
}
