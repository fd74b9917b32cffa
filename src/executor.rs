//! 1 行分のコマンド実行: トークン化、ビルトイン判定、コマンド解決、リダイレクト計画、起動。
//!
//! - [`execute_line`]: 行を受け取り、ビルトインまたは外部コマンドとして実行
//! - ビルトイン: fork なしでプロセス内実行（リダイレクト指定は拒否）
//! - 外部コマンド: [`resolve`](crate::resolve) → [`redirect::plan`] → [`launch`]
//!   - 停止したジョブは [`Shell::record_stopped`] で登録する
//!
//! どの段階のエラーも stderr に `pgsh: ...` と報告するだけで、ループは継続する。

use std::io::Write;
use std::path::Path;

use log::debug;

use crate::builtins::BUILTINS;
use crate::job::JobOutcome;
use crate::launch::launch;
use crate::redirect;
use crate::resolve::{self, Resolution};
use crate::shell::Shell;
use crate::tokenizer::{self, Tokens};

/// 1 行を実行し、表示・ログ用の終了ステータスを返す。
///
/// 空行は何も実行せず 0 を返す。ビルトインの標準出力は `out` に書かれる。
/// `line` は入力されたバイト列そのままで、UTF-8 である必要はない。
pub fn execute_line(shell: &mut Shell, line: &[u8], out: &mut dyn Write) -> i32 {
    let tokens = tokenizer::tokenize(line);
    if tokens.is_empty() {
        debug!("empty input line; nothing to dispatch");
        return 0;
    }
    execute(shell, tokens, out)
}

/// トークン列を実行する。
pub fn execute(shell: &mut Shell, tokens: Tokens, out: &mut dyn Write) -> i32 {
    let Some(command) = tokens.get(0) else {
        return 0;
    };

    match resolve::resolve(command) {
        Resolution::Builtin(index) => execute_builtin(shell, index, &tokens, out),
        Resolution::Path(path) => execute_external(shell, &path, tokens),
        Resolution::NotFound => {
            eprintln!("pgsh: {}: command not found", command.to_string_lossy());
            127
        }
    }
}

/// ビルトインを fork なしで実行する。
fn execute_builtin(shell: &mut Shell, index: usize, tokens: &Tokens, out: &mut dyn Write) -> i32 {
    let builtin = &BUILTINS[index];
    if redirect::has_operator(tokens) {
        eprintln!("pgsh: {}: redirection is not supported for builtins", builtin.name);
        return 2;
    }
    debug!("builtin {}", builtin.name);
    let status = (builtin.run)(shell, tokens, out);
    let _ = out.flush();
    status
}

/// 外部コマンドをフォアグラウンドジョブとして実行する。
fn execute_external(shell: &mut Shell, path: &Path, mut tokens: Tokens) -> i32 {
    let display_cmd = tokens.join();

    let plan = match redirect::plan(&mut tokens) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("pgsh: {}", e);
            return e.exit_status();
        }
    };

    debug!("external {} argv={:?} redirect={:?}", path.display(), tokens, plan);
    match launch(shell, path, &tokens, plan.as_ref()) {
        Ok(job) => {
            if let JobOutcome::Stopped(_) = job.outcome {
                shell.record_stopped(job.pgid, display_cmd);
            }
            job.outcome.status()
        }
        Err(e) => {
            eprintln!("pgsh: {}", e);
            e.exit_status()
        }
    }
}
