//! ジョブ制御シグナルの処理方針。
//!
//! シェル自身は SIGINT/SIGQUIT/SIGTSTP/SIGTTIN/SIGTTOU を無視し、
//! ターミナルから送られたシグナルがフォアグラウンドジョブにだけ届くようにする。
//! 子プロセスでは exec 前に SIG_DFL に戻す。
//!
//! 切り替えは起動時と fork 直後の 2 箇所だけで、[`SignalPolicy::apply`] が
//! 5 つのシグナルをまとめて設定する。

/// 対象となるジョブ制御シグナル。
pub const JOB_CONTROL_SIGNALS: [libc::c_int; 5] = [
    libc::SIGINT,
    libc::SIGQUIT,
    libc::SIGTSTP,
    libc::SIGTTIN,
    libc::SIGTTOU,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPolicy {
    /// インタプリタ用: すべて SIG_IGN。
    SuppressedForInterpreter,
    /// ジョブ用: すべて SIG_DFL。
    DefaultForJob,
}

impl SignalPolicy {
    fn handler(self) -> libc::sighandler_t {
        match self {
            Self::SuppressedForInterpreter => libc::SIG_IGN,
            Self::DefaultForJob => libc::SIG_DFL,
        }
    }

    /// 全ジョブ制御シグナルの disposition を設定する。
    ///
    /// `sigaction(2)` のみを使うため、fork 後の子プロセスからも呼べる。
    pub fn apply(self) {
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = self.handler();
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            for &sig in &JOB_CONTROL_SIGNALS {
                libc::sigaction(sig, &action, std::ptr::null_mut());
            }
        }
    }
}
