//! # コマンドライン引数の解釈
//!
//! 1 回の起動で 1 つのコマンドを実行する。
//!
//! ```text
//! schoolfee-console login <email> <password>
//! schoolfee-console logout
//! schoolfee-console me
//! schoolfee-console students [--search <text>] [--page <n>]
//! schoolfee-console dashboard
//! schoolfee-console receipt <payment_id> [--out <dir>]
//! schoolfee-console void <payment_id> <reason>
//! schoolfee-console export <collection|outstanding|class_wise> <csv|pdf|xlsx>
//!                          [--from <YYYY-MM-DD>] [--to <YYYY-MM-DD>] [--out <dir>]
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use schoolfee_domain::{
    payment::PaymentId,
    report::{ExportFormat, ReportKind},
};

/// 保存先を省略したときのディレクトリ
const DEFAULT_OUT_DIR: &str = ".";

pub const USAGE: &str = "\
使い方: schoolfee-console <command> [args]

  login <email> <password>      ログインしてトークンを保存する
  logout                        ログアウトしてトークンを破棄する
  me                            ログイン中のユーザーを表示する
  students [--search <text>] [--page <n>]
                                生徒一覧を表示する
  dashboard                     ダッシュボードの集計を表示する
  receipt <payment_id> [--out <dir>]
                                レシートをダウンロードする
  void <payment_id> <reason>    支払いを取り消す
  export <kind> <format> [--from <date>] [--to <date>] [--out <dir>]
                                レポートをエクスポートする";

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        email:    String,
        password: String,
    },
    Logout,
    Me,
    Students {
        search: Option<String>,
        page:   u32,
    },
    Dashboard,
    Receipt {
        payment_id: PaymentId,
        out_dir:    PathBuf,
    },
    Void {
        payment_id: PaymentId,
        reason:     String,
    },
    Export {
        kind:    ReportKind,
        format:  ExportFormat,
        from:    Option<NaiveDate>,
        to:      Option<NaiveDate>,
        out_dir: PathBuf,
    },
    Help,
}

impl Command {
    /// プログラム名を除いた引数から解釈する
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };
        let (positional, options) = split_options(rest)?;

        let command = match name.as_str() {
            "login" => {
                let [email, password] = exact::<2>(&positional, "login <email> <password>")?;
                Self::Login { email, password }
            }
            "logout" => Self::Logout,
            "me" => Self::Me,
            "students" => Self::Students {
                search: options.value("search"),
                page:   options
                    .value("page")
                    .map(|p| p.parse::<u32>().context("--page は正の整数で指定してください"))
                    .transpose()?
                    .unwrap_or(1),
            },
            "dashboard" => Self::Dashboard,
            "receipt" => {
                let [id] = exact::<1>(&positional, "receipt <payment_id>")?;
                Self::Receipt {
                    payment_id: parse_payment_id(&id)?,
                    out_dir:    options.out_dir(),
                }
            }
            "void" => {
                let Some((id, reason)) = positional.split_first() else {
                    bail!("支払い ID を指定してください: void <payment_id> <reason>");
                };
                Self::Void {
                    payment_id: parse_payment_id(id)?,
                    reason:     reason.join(" "),
                }
            }
            "export" => {
                let [kind, format] = exact::<2>(&positional, "export <kind> <format>")?;
                Self::Export {
                    kind:    kind
                        .parse()
                        .with_context(|| format!("不明なレポート種別です: {kind}"))?,
                    format:  format
                        .parse()
                        .with_context(|| format!("不明な出力形式です: {format}"))?,
                    from:    options.date("from")?,
                    to:      options.date("to")?,
                    out_dir: options.out_dir(),
                }
            }
            "help" | "--help" | "-h" => Self::Help,
            other => bail!("不明なコマンドです: {other}\n\n{USAGE}"),
        };

        Ok(command)
    }
}

/// `--key value` 形式のオプション
#[derive(Debug, Default)]
struct Options(Vec<(String, String)>);

impl Options {
    fn value(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn date(&self, key: &str) -> anyhow::Result<Option<NaiveDate>> {
        self.value(key)
            .map(|v| {
                NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                    .with_context(|| format!("--{key} は YYYY-MM-DD で指定してください: {v}"))
            })
            .transpose()
    }

    fn out_dir(&self) -> PathBuf {
        PathBuf::from(self.value("out").unwrap_or_else(|| DEFAULT_OUT_DIR.to_string()))
    }
}

fn split_options(args: &[String]) -> anyhow::Result<(Vec<String>, Options)> {
    let mut positional = Vec::new();
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.strip_prefix("--") {
            Some(key) => {
                let Some(value) = iter.next() else {
                    bail!("--{key} の値がありません");
                };
                options.0.push((key.to_string(), value.clone()));
            }
            None => positional.push(arg.clone()),
        }
    }

    Ok((positional, options))
}

fn exact<const N: usize>(positional: &[String], usage: &str) -> anyhow::Result<[String; N]> {
    <[String; N]>::try_from(positional.to_vec())
        .map_err(|_| anyhow::anyhow!("引数の数が正しくありません: {usage}"))
}

fn parse_payment_id(value: &str) -> anyhow::Result<PaymentId> {
    let id = value
        .parse::<i64>()
        .with_context(|| format!("支払い ID は整数で指定してください: {value}"))?;
    Ok(PaymentId::new(id))
}
