//! ビルトインコマンドの実装。
//!
//! ビルトインはfork/execを経由せずプロセス内で直接実行される。
//! [`lookup`] が `Some(index)` を返せば [`BUILTINS`] のハンドラを呼び、
//! `None` なら外部コマンドとして [`resolve`](crate::resolve) に委ねる。
//!
//! ハンドラの戻り値は表示・ログ用のステータスで、ループの継続には影響しない。

use std::env;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

use crate::shell::Shell;
use crate::tokenizer::Tokens;

/// ビルトインのハンドラ。標準出力は `out` 経由で書く（テストで差し替えるため）。
pub type Handler = fn(&mut Shell, &Tokens, &mut dyn Write) -> i32;

/// ビルトインテーブルのエントリ。
pub struct Builtin {
    pub name: &'static str,
    pub help: &'static str,
    pub run: Handler,
}

/// 全ビルトイン。起動後に変更されることはない。
pub static BUILTINS: [Builtin; 4] = [
    Builtin { name: "?", help: "show this help menu", run: builtin_help },
    Builtin { name: "exit", help: "exit the command shell", run: builtin_exit },
    Builtin { name: "pwd", help: "print the current working directory", run: builtin_pwd },
    Builtin { name: "cd", help: "change the current working directory", run: builtin_cd },
];

/// 名前の完全一致でビルトインを線形探索し、テーブル上の index を返す。
pub fn lookup(name: &OsStr) -> Option<usize> {
    BUILTINS.iter().position(|b| name == b.name)
}

/// `?`: ビルトイン一覧とヘルプを表示する。慣例により 1 を返す。
fn builtin_help(_shell: &mut Shell, _tokens: &Tokens, out: &mut dyn Write) -> i32 {
    for b in &BUILTINS {
        let _ = writeln!(out, "{} - {}", b.name, b.help);
    }
    1
}

/// `exit [N]`: REPLループを即座に終了させる。N 省略時は 0。
fn builtin_exit(shell: &mut Shell, tokens: &Tokens, _out: &mut dyn Write) -> i32 {
    let code = match tokens.get(1) {
        Some(arg) => arg.to_str().and_then(|a| a.parse::<i32>().ok()).unwrap_or_else(|| {
            eprintln!("pgsh: exit: {}: numeric argument required", arg.to_string_lossy());
            2
        }),
        None => 0,
    };
    shell.request_exit(code);
    code
}

/// `pwd`: カレントディレクトリの絶対パスを表示する。
fn builtin_pwd(_shell: &mut Shell, _tokens: &Tokens, out: &mut dyn Write) -> i32 {
    match env::current_dir() {
        Ok(cwd) => {
            let _ = writeln!(out, "{}", cwd.display());
            0
        }
        Err(e) => {
            eprintln!("pgsh: pwd: {}", e);
            1
        }
    }
}

/// `cd <dir>`: カレントディレクトリを変更する。引数なしはエラー。
fn builtin_cd(_shell: &mut Shell, tokens: &Tokens, _out: &mut dyn Write) -> i32 {
    let Some(dir) = tokens.get(1) else {
        eprintln!("pgsh: cd: missing dir argument");
        return 1;
    };
    if let Err(e) = env::set_current_dir(dir) {
        eprintln!("pgsh: cd: {}: {}", Path::new(dir).display(), e);
        1
    } else {
        0
    }
}
