//! 신호 엔진 CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use signal_core::{
    init_logging, AccuracyMetric, AlignedSignalSet, EngineConfig, LogConfig, Symbol, Timeframe,
    TradeRecommendation,
};
use signal_engine::{CsvMarketData, SignalService, Trigger};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "signal-engine")]
#[command(about = "Multi-timeframe technical analysis signal engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error). 지정하면 설정 파일보다 우선
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 주기적으로 활성 심볼의 신호 재계산
    Run {
        /// 시작 시 활성 심볼 (기본: 설정의 첫 심볼)
        #[arg(long)]
        symbol: Option<String>,
    },

    /// 한 사이클 실행 후 결과를 JSON으로 출력
    Once {
        /// 대상 심볼 (예: "BTC/USDT")
        #[arg(long)]
        symbol: String,

        /// 추천에 사용할 타임프레임 (예: "4h")
        #[arg(long)]
        timeframe: Option<String>,
    },
}

/// `once` 출력.
#[derive(Serialize)]
struct CycleReport {
    aligned: AlignedSignalSet,
    recommendation: Option<TradeRecommendation>,
    accuracy: Vec<(Timeframe, AccuracyMetric)>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("Signal Engine 시작");

    let provider = Arc::new(CsvMarketData::new(&config.data.csv_dir));
    tracing::debug!(csv_dir = %config.data.csv_dir, "CSV 데이터 디렉토리");
    let service = Arc::new(SignalService::new(config, provider)?);

    match cli.command {
        Commands::Run { symbol } => {
            if let Some(symbol) = symbol {
                let symbol: Symbol = symbol.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                service.switch_symbol(symbol).await;
            }

            let shutdown = CancellationToken::new();
            let runner = tokio::spawn(service.clone().run(shutdown.clone()));

            tokio::signal::ctrl_c()
                .await
                .context("Ctrl-C 핸들러 설치 실패")?;
            tracing::info!("종료 신호 수신");
            shutdown.cancel();
            runner.await.context("스케줄러 태스크 종료 실패")?;
        }
        Commands::Once { symbol, timeframe } => {
            let symbol: Symbol = symbol.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let timeframe = timeframe
                .map(|tf| tf.parse::<Timeframe>())
                .transpose()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            let outcome = service.trigger(&symbol, Trigger::Manual).await?;
            tracing::info!(symbol = %symbol, outcome = ?outcome, "사이클 완료");

            let mut accuracy = Vec::new();
            for tf in service.timeframes() {
                accuracy.push((*tf, service.accuracy(&symbol, *tf).await));
            }
            let report = CycleReport {
                aligned: service.aligned_signal_set(&symbol).await.as_ref().clone(),
                recommendation: service.trade_recommendation(&symbol, timeframe).await,
                accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    tracing::info!("Signal Engine 종료");
    Ok(())
}
