//! ジョブの待機とターミナル制御ヘルパー。
//!
//! フォアグラウンド待機 ([`wait_for_fg`])、停止ジョブの reap ([`reap_stopped`])、
//! 終了時の後始末 ([`hangup_stopped`])、ターミナル制御 ([`give_terminal_to`] / [`take_terminal_back`])
//! を提供する。launch と shell の両方から利用する。

use std::io;

use libc::pid_t;
use log::{debug, warn};

// ── データ構造 ───────────────────────────────────────────────────────

/// `waitpid` で回収したジョブの状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// 正常終了。引数は終了コード。
    Exited(i32),
    /// シグナルで終了。引数はシグナル番号。
    Signaled(i32),
    /// SIGTSTP 等で停止。引数はシグナル番号。
    Stopped(i32),
}

impl JobOutcome {
    /// `waitpid` の raw status から変換する。
    pub fn from_raw(raw_status: i32) -> Self {
        if libc::WIFSTOPPED(raw_status) {
            Self::Stopped(libc::WSTOPSIG(raw_status))
        } else if libc::WIFSIGNALED(raw_status) {
            Self::Signaled(libc::WTERMSIG(raw_status))
        } else {
            Self::Exited(libc::WEXITSTATUS(raw_status))
        }
    }

    /// シェル形式の終了ステータス。シグナルによる終了・停止は 128 + シグナル番号。
    pub fn status(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(sig) | Self::Stopped(sig) => 128 + sig,
        }
    }
}

/// 待機を終えたフォアグラウンドジョブ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForegroundJob {
    /// プロセスグループ ID（= ジョブの PID）。
    pub pgid: pid_t,
    pub outcome: JobOutcome,
}

/// ターミナルから停止されたまま残っているジョブ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedJob {
    /// プロセスグループ ID（= ジョブの PID）。
    pub pgid: pid_t,
    /// 表示用コマンド文字列。
    pub command: String,
}

// ── 待機ヘルパー ─────────────────────────────────────────────────────

/// フォアグラウンドジョブ `pid` が終了または停止するまでブロックする。
///
/// `waitpid(pid, WUNTRACED)` を `EINTR` の間だけ再試行する。
/// 特定の PID を指定するので、他の子プロセスの状態を奪うことはない。
pub fn wait_for_fg(pid: pid_t) -> io::Result<JobOutcome> {
    loop {
        let mut raw_status: i32 = 0;
        let ret = unsafe { libc::waitpid(pid, &mut raw_status, libc::WUNTRACED) };
        if ret == pid {
            return Ok(JobOutcome::from_raw(raw_status));
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// 停止ジョブのうち、その後終了したものを非ブロッキングで reap して取り除く。
///
/// 外部から `kill` された停止ジョブがゾンビとして残らないよう、プロンプト表示前に呼ばれる。
pub fn reap_stopped(jobs: &mut Vec<StoppedJob>) {
    jobs.retain(|job| {
        let mut raw_status: i32 = 0;
        let ret = unsafe { libc::waitpid(job.pgid, &mut raw_status, libc::WNOHANG) };
        if ret == job.pgid {
            debug!("reaped stopped job {} ({:?})", job.pgid, JobOutcome::from_raw(raw_status));
            return false;
        }
        // ECHILD: 既に回収済み
        !(ret < 0 && io::Error::last_os_error().raw_os_error() == Some(libc::ECHILD))
    });
}

/// 停止ジョブに SIGHUP → SIGCONT を送り、停止したまま孤立するのを防ぐ。
///
/// EOF または `exit` でインタプリタが終了する直前に呼ばれる。
pub fn hangup_stopped(jobs: &[StoppedJob]) {
    for job in jobs {
        debug!("hanging up stopped job {}", job.pgid);
        unsafe {
            libc::kill(-job.pgid, libc::SIGHUP);
            libc::kill(-job.pgid, libc::SIGCONT);
        }
    }
}

// ── ターミナル制御ヘルパー ───────────────────────────────────────────

/// `tcsetpgrp` でターミナルのフォアグラウンドプロセスグループを `pgid` に設定する。
///
/// シェルが SIGTTOU を無視しているため、バックグラウンドからの呼び出しでもブロックしない。
/// 子が既に終了していると失敗するが、待機後の [`take_terminal_back`] で必ず取り戻すので無視する。
pub fn give_terminal_to(terminal_fd: i32, pgid: pid_t) {
    if unsafe { libc::tcsetpgrp(terminal_fd, pgid) } != 0 {
        warn!("tcsetpgrp({}) failed: {}", pgid, io::Error::last_os_error());
    } else {
        debug!("terminal handed to pgid {}", pgid);
    }
}

/// ターミナルをシェルのプロセスグループに戻し、保存済みの termios を復元する。
///
/// フォアグラウンドジョブの完了後・停止後に呼ばれ、シェルがターミナル入力を再び受け取れるようにする。
pub fn take_terminal_back(terminal_fd: i32, shell_pgid: pid_t, tmodes: Option<&libc::termios>) {
    unsafe {
        if libc::tcsetpgrp(terminal_fd, shell_pgid) != 0 {
            warn!("tcsetpgrp({}) failed: {}", shell_pgid, io::Error::last_os_error());
        }
        if let Some(tmodes) = tmodes {
            if libc::tcsetattr(terminal_fd, libc::TCSADRAIN, tmodes) != 0 {
                warn!("tcsetattr failed: {}", io::Error::last_os_error());
            }
        }
    }
    debug!("terminal reclaimed by pgid {}", shell_pgid);
}

/// ターミナルの現在のフォアグラウンドプロセスグループ。
pub fn foreground_pgid(terminal_fd: i32) -> io::Result<pid_t> {
    let pgid = unsafe { libc::tcgetpgrp(terminal_fd) };
    if pgid < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(pgid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_child(f: fn()) -> pid_t {
        unsafe {
            let pid = libc::fork();
            assert!(pid >= 0);
            if pid == 0 {
                f();
                libc::_exit(0);
            }
            pid
        }
    }

    #[test]
    fn outcome_status_codes() {
        assert_eq!(JobOutcome::Exited(0).status(), 0);
        assert_eq!(JobOutcome::Exited(7).status(), 7);
        assert_eq!(JobOutcome::Signaled(libc::SIGINT).status(), 130);
        assert_eq!(JobOutcome::Stopped(libc::SIGTSTP).status(), 128 + libc::SIGTSTP);
    }

    #[test]
    fn waits_for_exit_code() {
        let pid = spawn_child(|| unsafe { libc::_exit(5) });
        assert_eq!(wait_for_fg(pid).unwrap(), JobOutcome::Exited(5));
    }

    #[test]
    fn waits_for_signal_death() {
        let pid = spawn_child(|| unsafe {
            libc::signal(libc::SIGTERM, libc::SIG_DFL);
            libc::raise(libc::SIGTERM);
        });
        assert_eq!(wait_for_fg(pid).unwrap(), JobOutcome::Signaled(libc::SIGTERM));
    }

    #[test]
    fn stopped_job_is_reported_then_reaped() {
        let pid = spawn_child(|| unsafe {
            libc::raise(libc::SIGSTOP);
        });
        assert_eq!(wait_for_fg(pid).unwrap(), JobOutcome::Stopped(libc::SIGSTOP));

        let mut jobs = vec![StoppedJob { pgid: pid, command: "sleep".into() }];
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
        // SIGKILL 後の終了を回収できるまで待つ
        for _ in 0..200 {
            reap_stopped(&mut jobs);
            if jobs.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(jobs.is_empty());
    }

    #[test]
    fn waiting_on_unknown_pid_is_an_error() {
        assert!(wait_for_fg(i32::MAX - 1).is_err());
    }
}
