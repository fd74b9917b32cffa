//! pgsh ライブラリ: バイナリ・統合テスト・ベンチマーク用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`tokenizer`] | 1 行を空白区切りの単語列（[`tokenizer::Tokens`]）に分割 |
//! | [`builtins`] | ビルトイン（`?`, `exit`, `pwd`, `cd`）とテーブル検索 |
//! | [`resolve`] | コマンド解決（ビルトイン / パス指定 / `$PATH` 検索） |
//! | [`redirect`] | リダイレクト計画（`<` / `>` の検出と除去、ターゲットのオープン） |
//! | [`launch`] | 外部コマンド起動（fork、dup2、プロセスグループ、ターミナル移譲、execv、待機） |
//! | [`executor`] | 1 行の実行（ビルトイン判定 → 解決 → 計画 → 起動） |
//! | [`job`] | 待機・停止ジョブ管理・ターミナル制御ヘルパー |
//! | [`signals`] | ジョブ制御シグナルの処理方針（インタプリタ用 / ジョブ用） |
//! | [`shell`] | シェルの状態（対話フラグ、プロセスグループ、termios、行番号）と起動処理 |
//! | [`config`] | TOML 設定ファイルと環境変数 |
//! | [`logging`] | `simplelog` によるファイルへのログ出力 |
//! | [`error`] | エラー型 |

pub mod builtins;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod launch;
pub mod logging;
pub mod redirect;
pub mod resolve;
pub mod shell;
pub mod signals;
pub mod tokenizer;
