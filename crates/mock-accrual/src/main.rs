//! Mock Accrual CLI
//!
//! 启动模拟积分计算系统，可选预置订单脚本文件。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mock_accrual::{MockAccrualState, OrderScript, RateLimitConfig};
use serde::Deserialize;
use tracing::info;

/// 模拟积分计算系统
#[derive(Parser, Debug)]
#[command(name = "mock-accrual")]
#[command(version, about = "模拟积分计算系统")]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 服务端口
    #[arg(short, long, default_value = "8081")]
    port: u16,

    /// 每分钟允许的查询次数，0 表示不限流
    #[arg(long, default_value = "0")]
    rate_limit: u32,

    /// 预置订单脚本（JSON 数组，元素形如 {"order":"...","kind":"reply","status":"PROCESSED","accrual":500}）
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    order: String,
    #[serde(flatten)]
    script: OrderScript,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let rate_limit = (cli.rate_limit > 0).then(|| RateLimitConfig::per_minute(cli.rate_limit));
    let state = Arc::new(MockAccrualState::new(rate_limit));

    if let Some(path) = &cli.seed {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("读取脚本文件失败: {}", path.display()))?;
        let entries: Vec<SeedEntry> = serde_json::from_str(&raw).context("解析脚本文件失败")?;
        for entry in entries {
            state.scripts.register(&entry.order, entry.script);
        }
        info!(count = state.scripts.count(), "订单脚本已预置");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let (_, handle) = mock_accrual::serve(addr, state).await?;

    tokio::select! {
        _ = handle => {}
        result = tokio::signal::ctrl_c() => {
            result.context("安装 Ctrl+C 处理器失败")?;
            info!("收到 Ctrl+C，Mock 积分服务退出");
        }
    }
    Ok(())
}
