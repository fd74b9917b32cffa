//! pgsh: ジョブ制御付きの行指向コマンドインタプリタ
//!
//! REPLループ: プロンプト表示（対話モードのみ）→ 1 行読み取り → 実行 → ループ
//!
//! 終了条件は EOF（終了コード 0）と `exit` ビルトインのみ。
//! 起動時にプロセスグループを掌握できなければ終了コード 1 で終了する。

use std::io::{self, BufRead, Write};

use log::{debug, error};

use pgsh::config::Config;
use pgsh::executor;
use pgsh::job;
use pgsh::logging;
use pgsh::shell::Shell;

fn main() {
    let config = Config::load();
    logging::init(&config);

    let mut shell = match Shell::init() {
        Ok(shell) => shell,
        Err(e) => {
            error!("{}", e);
            eprintln!("pgsh: {}", e);
            std::process::exit(1);
        }
    };
    shell.show_prompt = config.prompt.enabled;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    // 行長の上限はない。バイト列は UTF-8 として解釈せずにそのまま渡す。
    let mut buf: Vec<u8> = Vec::new();

    loop {
        // 停止ジョブのうち、その後終了したものを reap
        job::reap_stopped(&mut shell.stopped);

        if let Some(prompt) = shell.prompt() {
            print!("{}", prompt);
            let _ = stdout.flush();
        }

        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("pgsh: read error: {}", e);
                break;
            }
        }

        let status = executor::execute_line(&mut shell, &buf, &mut stdout);
        debug!("line {} -> status {}", shell.line_num, status);
        shell.line_num += 1;

        if let Some(code) = shell.exit_request() {
            shell.shutdown();
            std::process::exit(code);
        }
    }

    shell.shutdown();
    std::process::exit(0);
}
