//! リダイレクト計画: `<` / `>` の検出と、演算子・ファイル名ペアの除去。
//!
//! [`plan`] は形式の検証だけを行い、ファイルは開かない。
//! オープンは [`Redirect::open`] で、[`launch`](crate::launch) が fork 前に呼ぶ。
//!
//! | 入力 | 結果 |
//! |------|------|
//! | `cat < in.txt` | argv = `cat`、stdin ← `in.txt` |
//! | `echo hi > out.txt` | argv = `echo hi`、stdout → `out.txt`（作成/切り詰め、0644） |
//! | `echo >` | [`RedirectError::MissingTarget`] |
//! | `echo a >> b` | [`RedirectError::UnknownOperator`] |
//! | `cat < a > b` | [`RedirectError::MultipleRedirections`] |

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use crate::error::RedirectError;
use crate::tokenizer::Tokens;

/// 置き換える標準ストリーム。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `<`: stdin を読み取り専用で開いたファイルにする。
    Input,
    /// `>`: stdout を作成/切り詰めしたファイルにする。
    Output,
}

impl Direction {
    /// 子プロセスで置き換える fd 番号。
    pub fn target_fd(self) -> i32 {
        match self {
            Self::Input => libc::STDIN_FILENO,
            Self::Output => libc::STDOUT_FILENO,
        }
    }
}

/// 1 行分のリダイレクト計画。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub direction: Direction,
    /// 入力されたバイト列そのままのファイル名。
    pub target: PathBuf,
}

impl Redirect {
    /// ターゲットファイルを開く。出力は `O_CREAT|O_TRUNC`（mode 0644）、入力は読み取り専用。
    pub fn open(&self) -> Result<File, RedirectError> {
        let result = match self.direction {
            Direction::Output => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o644)
                .open(&self.target),
            Direction::Input => File::open(&self.target),
        };
        result.map_err(|source| RedirectError::Open {
            path: self.target.clone(),
            source,
        })
    }
}

/// 演算子トークンの種類。
enum Operator {
    Known(Direction),
    Unknown,
}

fn classify(token: &OsStr) -> Option<Operator> {
    match token.as_bytes() {
        b"<" => Some(Operator::Known(Direction::Input)),
        b">" => Some(Operator::Known(Direction::Output)),
        // `>>`、`<<`、`<>` 等: 演算子文字だけで構成された未対応トークン
        t if !t.is_empty() && t.iter().all(|&b| b == b'<' || b == b'>') => Some(Operator::Unknown),
        _ => None,
    }
}

/// index 1 以降に演算子（未対応のものを含む）が含まれるか。
pub fn has_operator(tokens: &Tokens) -> bool {
    tokens.iter().skip(1).any(|t| classify(t).is_some())
}

/// トークン列からリダイレクトを取り出し、演算子とファイル名を `tokens` から取り除く。
///
/// 演算子がなければ `Ok(None)` で `tokens` は変更されない。
/// エラー時の `tokens` の状態は未規定（コマンドは実行されない）。
pub fn plan(tokens: &mut Tokens) -> Result<Option<Redirect>, RedirectError> {
    let mut found: Option<(usize, Direction)> = None;

    for (i, token) in tokens.iter().enumerate().skip(1) {
        let Some(operator) = classify(token) else {
            continue;
        };
        // 演算子の直後の演算子はファイル名にならない
        if let Some((prev, _)) = found {
            if prev + 1 == i {
                return Err(missing_target_error(tokens, prev));
            }
        }
        match operator {
            Operator::Unknown => {
                return Err(RedirectError::UnknownOperator(token.to_string_lossy().into_owned()));
            }
            Operator::Known(direction) => {
                if found.is_some() {
                    return Err(RedirectError::MultipleRedirections);
                }
                found = Some((i, direction));
            }
        }
    }

    let Some((index, direction)) = found else {
        return Ok(None);
    };

    let target = match tokens.get(index + 1) {
        Some(t) => PathBuf::from(t),
        None => return Err(missing_target_error(tokens, index)),
    };

    // 演算子とファイル名の 2 トークンを詰めて除去する
    let len = tokens.len();
    for i in index..len - 2 {
        let next = tokens.get(i + 2).unwrap_or_default().to_os_string();
        tokens.set(i, next);
    }
    tokens.truncate(len - 2);

    Ok(Some(Redirect { direction, target }))
}

fn missing_target_error(tokens: &Tokens, operator_index: usize) -> RedirectError {
    let op = tokens.get(operator_index).unwrap_or_default();
    RedirectError::MissingTarget(op.to_string_lossy().into_owned())
}
