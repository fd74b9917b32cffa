//! 1 行分の入力を単語列に分割するトークナイザ。
//!
//! 空白（スペース、タブ、CR、LF）で区切るだけで、クォート・エスケープ・glob は扱わない。
//! NUL バイトも区切り文字として扱うため、各トークンはそのまま `CString` に変換できる。
//!
//! 入力はバイト列のまま扱う。UTF-8 として不正なバイトも加工せずに
//! [`OsString`] に入れ、`execv` やファイルオープンにそのまま渡す。
//!
//! [`Tokens`] は長さ取得・添字参照・置換・切り詰めを提供する可変シーケンスで、
//! [`redirect`](crate::redirect) はこれを使ってリダイレクト演算子とファイル名を取り除く。

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

/// トークン列。index 0 がコマンド名。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    words: Vec<OsString>,
}

impl Tokens {
    pub fn new(words: Vec<OsString>) -> Self {
        Self { words }
    }

    /// トークン数。
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// `n` 番目のトークン。範囲外なら `None`。
    pub fn get(&self, n: usize) -> Option<&OsStr> {
        self.words.get(n).map(OsString::as_os_str)
    }

    /// `n` 番目のトークンを置き換える。範囲外なら何もせず `false` を返す。
    pub fn set(&mut self, n: usize, word: impl Into<OsString>) -> bool {
        match self.words.get_mut(n) {
            Some(slot) => {
                *slot = word.into();
                true
            }
            None => false,
        }
    }

    /// 長さを `min(len, self.len())` に縮める。
    pub fn truncate(&mut self, len: usize) {
        self.words.truncate(len);
    }

    pub fn iter(&self) -> impl Iterator<Item = &OsStr> {
        self.words.iter().map(OsString::as_os_str)
    }

    /// 表示・ログ用に空白 1 つで連結した文字列を返す。不正なバイトは置換文字になる。
    pub fn join(&self) -> String {
        self.words
            .iter()
            .map(|w| w.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_separator(b: &u8) -> bool {
    matches!(*b, b' ' | b'\t' | b'\r' | b'\n' | b'\0')
}

/// 行を単語に分割する。空行・空白のみの行は空の [`Tokens`] になる。
pub fn tokenize<L: AsRef<[u8]> + ?Sized>(line: &L) -> Tokens {
    let words = line
        .as_ref()
        .split(is_separator)
        .filter(|w| !w.is_empty())
        .map(|w| OsStr::from_bytes(w).to_os_string())
        .collect();
    Tokens { words }
}
