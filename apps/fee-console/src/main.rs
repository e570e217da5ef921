//! # 学費管理コンソール
//!
//! 学費管理 API クライアントを組み込んだ運用者向けのコマンドラインツール。
//!
//! ## 環境変数
//!
//! `.env` ファイルがあれば読み込む。
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `SCHOOLFEE_API_URL` | No | バックエンドのベース URL（デフォルト: `http://localhost:5000/api`） |
//! | `SCHOOLFEE_TIMEOUT_SECS` | No | リクエストのタイムアウト秒数（デフォルト: `30`） |
//! | `SCHOOLFEE_LOGIN_ROUTE` | No | セッション切れ時に案内するルート（デフォルト: `/login`） |
//! | `SCHOOLFEE_TOKEN_FILE` | No | トークンの保存先（デフォルト: `.schoolfee/tokens.json`） |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//! | `RUST_LOG` | No | ログレベル（デフォルト: `info,schoolfee=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p schoolfee-console -- login bursar@school.test s3cret
//! cargo run -p schoolfee-console -- students --search Amina
//! ```

mod command;

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    sync::Arc,
};

use anyhow::Context as _;
use command::{Command, USAGE};
use schoolfee_client::{
    ApiClient,
    ClientConfig,
    ClientError,
    FileTokenStore,
    TracingEvents,
    api::{AuthApi, DashboardApi, PaymentsApi, ReportsApi, StudentsApi},
};
use schoolfee_domain::{
    auth::LoginCredentials,
    payment::VoidPayment,
    report::ReportPeriod,
    student::StudentFilter,
};
use schoolfee_shared::{
    PageRequest,
    observability::{TracingConfig, init_tracing},
};

/// トークンファイルの既定パス
const DEFAULT_TOKEN_FILE: &str = ".schoolfee/tokens.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let _app_span = init_tracing(TracingConfig::from_env("fee-console"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = ClientConfig::from_env().context("クライアント設定の読み込みに失敗しました")?;
    let token_file =
        std::env::var("SCHOOLFEE_TOKEN_FILE").unwrap_or_else(|_| DEFAULT_TOKEN_FILE.to_string());
    tracing::debug!(
        base_url = %config.base_url,
        token_file = %token_file,
        "クライアントを初期化します"
    );

    let client = ApiClient::builder(config)
        .token_store(Arc::new(FileTokenStore::new(token_file)))
        .events(Arc::new(TracingEvents))
        .build()
        .context("HTTP クライアントの初期化に失敗しました")?;

    match run(&client, command).await {
        Err(ClientError::SessionExpired) => {
            anyhow::bail!(
                "セッションが切れました。`login` で再ログインしてください（{}）",
                client.config().login_route
            )
        }
        result => result.map_err(|e| anyhow::anyhow!(e.to_api_error())),
    }
}

/// コマンドを実行して結果を標準出力に書く
async fn run(client: &ApiClient, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let credentials = LoginCredentials::new(email, password)?;
            let response = client.login(&credentials).await?;
            match response.data {
                Some(user) => println!("ログインしました: {} ({})", user.email, user.role),
                None => println!("ログインしました"),
            }
        }
        Command::Logout => {
            client.logout().await?;
            println!("ログアウトしました");
        }
        Command::Me => {
            let user = client.me().await?.data;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Students { search, page } => {
            let filter = StudentFilter {
                page: PageRequest::new(page, PageRequest::DEFAULT_LIMIT),
                search,
                ..StudentFilter::default()
            };
            let page = client.list_students(&filter).await?.data;
            for student in &page.items {
                println!(
                    "{:>6}  {:<12}  {:<30}  {}",
                    student.id,
                    student.admission_number,
                    student.full_name(),
                    student.class_name.as_deref().unwrap_or("-")
                );
            }
            if let Some(pagination) = page.pagination {
                println!(
                    "{} / {} ページ（全 {} 件）",
                    pagination.page, pagination.total_pages, pagination.total
                );
            }
        }
        Command::Dashboard => {
            let stats = client.dashboard_stats().await?.data;
            let summary = stats.summary();
            println!("生徒数:       {}", stats.total_students);
            println!("クラス数:     {}", stats.total_classes);
            println!("請求額:       {}", summary.expected);
            println!("徴収額:       {}", summary.collected);
            println!("未収額:       {}", summary.outstanding);
            println!("徴収率:       {:.1}%", summary.collection_rate);
            println!(
                "本日:         {}（{} 件）",
                stats.collected_today, stats.payments_today
            );
            if let Some(overdue) = summary.overdue_amount {
                println!("期日超過:     {overdue}");
            }
        }
        Command::Receipt {
            payment_id,
            out_dir,
        } => {
            let path = format!("/payments/receipt/{payment_id}");
            let saved = client
                .download_to(&path, &Default::default(), &out_dir)
                .await?;
            println!("レシートを保存しました: {}", saved.display());
        }
        Command::Void { payment_id, reason } => {
            let payment = client
                .void_payment(payment_id, &VoidPayment::new(reason)?)
                .await?
                .data;
            println!("支払い {} を取り消しました（{}）", payment.id, payment.status);
        }
        Command::Export {
            kind,
            format,
            from,
            to,
            out_dir,
        } => {
            let period = ReportPeriod::new(from, to)?;
            let export = client.export_report(kind, format, &period).await?;
            // サーバーが返したファイル名のディレクトリ部分は使わない
            let file_name = export
                .file_name
                .as_deref()
                .and_then(|name| Path::new(name).file_name())
                .map_or_else(
                    || OsString::from(format!("{kind}-report.{format}")),
                    OsStr::to_os_string,
                );
            tokio::fs::create_dir_all(&out_dir).await?;
            let target = out_dir.join(file_name);
            tokio::fs::write(&target, &export.bytes).await?;
            println!("レポートを保存しました: {}", target.display());
        }
        Command::Help => println!("{USAGE}"),
    }

    Ok(())
}
