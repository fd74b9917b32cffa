//! 疑似端末（pty）上で `pgsh` を対話モードで動かす統合テスト。
//!
//! 子プロセスは新しいセッションを作り、pty のスレーブを制御端末にする。
//! マスター側から入力（^C / ^Z を含む）を書き込み、プロンプトと停止表示を読み取る。

#![cfg(target_os = "linux")]

use std::ffi::CStr;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);

/// pty のマスターを開き、スレーブのパスと共に返す。
fn open_pty() -> (File, PathBuf) {
    unsafe {
        let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
        assert!(master >= 0, "posix_openpt: {}", std::io::Error::last_os_error());
        assert_eq!(libc::grantpt(master), 0);
        assert_eq!(libc::unlockpt(master), 0);
        let mut name = [0 as libc::c_char; 128];
        assert_eq!(libc::ptsname_r(master, name.as_mut_ptr(), name.len()), 0);
        let path = PathBuf::from(CStr::from_ptr(name.as_ptr()).to_str().unwrap());
        (File::from_raw_fd(master), path)
    }
}

struct PtyShell {
    child: Child,
    master: File,
    rx: Receiver<Vec<u8>>,
    output: String,
    cursor: usize,
}

impl PtyShell {
    fn spawn(dir: &Path) -> Self {
        let (master, slave_path) = open_pty();
        let slave = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&slave_path)
            .unwrap();

        let mut command = Command::new(env!("CARGO_BIN_EXE_pgsh"));
        command
            .current_dir(dir)
            .env("PGSH_LOG", "off")
            .env("PGSH_CONFIG", "/nonexistent/pgsh/config.toml")
            .stdin(slave.try_clone().unwrap())
            .stdout(slave.try_clone().unwrap())
            .stderr(slave);
        // stdio の差し替え後に実行される。新しいセッションで stdin の pty を制御端末にする。
        unsafe {
            command.pre_exec(|| {
                if libc::setsid() < 0 || libc::ioctl(0, libc::TIOCSCTTY, 0) < 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        let child = command.spawn().unwrap();
        // スレーブ側の fd は子だけが持つ。子が終了すればマスターの read は EIO で終わる。
        drop(command);

        let mut reader = master.try_clone().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            child,
            master,
            rx,
            output: String::new(),
            cursor: 0,
        }
    }

    fn send(&mut self, input: &[u8]) {
        self.master.write_all(input).unwrap();
    }

    /// 前回の一致位置以降に `needle` が現れるまで待つ。
    fn expect(&mut self, needle: &str) {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            if let Some(pos) = self.output[self.cursor..].find(needle) {
                self.cursor += pos + needle.len();
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(chunk) => self.output.push_str(&String::from_utf8_lossy(&chunk)),
                Err(_) => panic!("waiting for {:?}, got {:?}", needle, self.output),
            }
        }
    }

    /// ターミナルのフォアグラウンドプロセスグループ。
    fn foreground_pgid(&self) -> libc::pid_t {
        unsafe { libc::tcgetpgrp(self.master.as_raw_fd()) }
    }

    fn wait_exit(&mut self) -> Option<i32> {
        let deadline = Instant::now() + TIMEOUT;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status.code();
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("pgsh did not exit; output {:?}", self.output);
    }
}

impl Drop for PtyShell {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn interactive_session_keeps_the_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = dir.path().canonicalize().unwrap();
    let cwd_line = cwd.display().to_string();
    let mut sh = PtyShell::spawn(&cwd);
    let shell_pgid = sh.child.id() as libc::pid_t;

    // 番号付きプロンプト
    sh.expect("0: ");
    assert_eq!(sh.foreground_pgid(), shell_pgid);
    sh.send(b"pwd\n");
    sh.expect(&cwd_line);
    sh.expect("1: ");

    // ^C はフォアグラウンドジョブにだけ届き、シェルは次の行を受け付ける
    sh.send(b"sleep 5\n");
    thread::sleep(Duration::from_millis(500));
    let interrupted = Instant::now();
    sh.send(b"\x03");
    sh.expect("2: ");
    assert!(interrupted.elapsed() < Duration::from_secs(4));
    assert_eq!(sh.foreground_pgid(), shell_pgid);
    sh.send(b"pwd\n");
    sh.expect(&cwd_line);
    sh.expect("3: ");

    // ^Z で止まったジョブは報告され、ターミナルはシェルに戻る
    sh.send(b"sleep 5\n");
    thread::sleep(Duration::from_millis(500));
    sh.send(b"\x1a");
    sh.expect("]+  Stopped   sleep 5");
    sh.expect("4: ");
    assert_eq!(sh.foreground_pgid(), shell_pgid);

    sh.send(b"exit\n");
    assert_eq!(sh.wait_exit(), Some(0));
}
