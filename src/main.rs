use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::error;

use jira_filters::config::Settings;
use jira_filters::coordinator::{AggregationCoordinator, RefreshCycle};
use jira_filters::error::{Error, Result};
use jira_filters::models::FilterSpec;
use jira_filters::render;
use jira_filters::JiraClient;

/// 保存済みフィルターの結果を取得してJSONまたはテーブルで出力する
#[derive(Parser, Debug)]
#[command(name = "jira-filters")]
#[command(about = "Fetch Jira filter results and output combined JSON keyed by filter id")]
struct Cli {
    /// Filter ID or comma-separated list of filter IDs (e.g., 12345 or 12345,67890)
    #[arg(short, long, value_delimiter = ',')]
    filters: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum issues per filter to return (overrides config max_results)
    #[arg(short, long)]
    max_results: Option<u32>,

    /// Human-readable table output
    #[arg(short, long)]
    pretty: bool,

    /// Keep running and re-emit results on the configured refresh interval
    #[arg(short, long)]
    watch: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenv::dotenv().ok();

    // 標準出力はJSONペイロード専用。ログは標準エラーへ流す
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        match &err {
            // 起動時の設定不備は診断メッセージだけを出して終了する
            Error::InvalidConfiguration(_) | Error::ConfigurationMissing(_) => {
                error!("{}", err);
            }
            // 実行時の異常は生のパニックではなくJSONのエラーオブジェクトで報告する
            _ => {
                error!("Unexpected error: {}", err);
                let error_output = serde_json::json!({
                    "error": err.to_string(),
                    "source": "error",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                });
                println!("{}", error_output);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).await?;

    // コマンドラインのフィルター指定は設定ファイルより優先する
    if !cli.filters.is_empty() {
        settings.filters = cli
            .filters
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(FilterSpec::new)
            .collect();
    }
    if let Some(max_results) = cli.max_results {
        settings.max_results = max_results;
    }

    settings.validate()?;

    let client = JiraClient::new(settings.jira_config()?)?;
    let coordinator = AggregationCoordinator::new(
        client,
        settings.filters.clone(),
        settings.refresh_config(),
    );

    if cli.watch {
        let interval = Duration::from_secs(u64::from(settings.effective_refresh_minutes()) * 60);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let cycle = coordinator.refresh_once().await;
            emit(&cycle, cli.pretty)?;
        }
    }

    let cycle = coordinator.refresh_once().await;
    emit(&cycle, cli.pretty)
}

fn emit(cycle: &RefreshCycle, pretty: bool) -> Result<()> {
    if pretty {
        render::print_pretty(cycle);
    } else {
        println!("{}", render::to_json_document(cycle)?);
    }
    Ok(())
}
