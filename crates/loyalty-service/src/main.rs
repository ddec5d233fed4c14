//! Gophermart 积分核心服务入口
//!
//! 启动顺序：加载配置 -> 初始化可观测性 -> 连接数据库并执行迁移 ->
//! 启动积分对账 Worker -> 在服务地址上提供健康检查，直到收到关闭信号。

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gophermart_shared::{
    config::{AppConfig, ConfigOverrides},
    database::Database,
    observability,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use loyalty::{
    accrual::{AccrualClient, ReconciliationWorker},
    health::health_routes,
    repository::{OrderRepository, SettlementRepository},
};

/// 命令行参数，优先级高于环境变量和配置文件
#[derive(Parser, Debug)]
#[command(name = "gophermart")]
#[command(version, about = "Gophermart 积分核心服务")]
struct Args {
    /// 服务监听地址，如 localhost:8080
    #[arg(short = 'a', long)]
    run_address: Option<String>,

    /// PostgreSQL 连接串
    #[arg(short = 'd', long)]
    database_uri: Option<String>,

    /// 积分计算系统地址
    #[arg(short = 'r', long)]
    accrual_address: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            run_address: args.run_address,
            database_uri: args.database_uri,
            accrual_address: args.accrual_address,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. 加载配置：配置文件 -> GOPHERMART__ 环境变量 -> 旧版环境变量 -> 命令行
    let mut config = AppConfig::load("gophermart").context("加载配置失败")?;
    ConfigOverrides::from_env()
        .merge(args.into())
        .apply(&mut config)?;
    config.validate()?;

    // 2. 可观测性
    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        server = %config.server_addr(),
        accrual = %config.accrual.base_url,
        "Starting gophermart..."
    );

    // 3. 数据库：连接失败在重试耗尽后终止启动
    let db = Database::connect_with_retry(&config.database)
        .await
        .context("数据库连接失败")?;
    db.health_check().await.context("数据库健康检查失败")?;
    sqlx::migrate!("../../migrations")
        .run(db.pool())
        .await
        .context("数据库迁移失败")?;
    info!("Database connection established, migrations applied");

    // 4. 积分对账 Worker
    let pool = db.pool().clone();
    let orders = Arc::new(OrderRepository::new(pool.clone()));
    let settlement = Arc::new(SettlementRepository::new(pool.clone()));
    let client = AccrualClient::new(&config.accrual).context("创建积分系统客户端失败")?;

    let worker = ReconciliationWorker::new(
        Arc::new(client),
        orders,
        settlement,
        config.accrual.poll_interval(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    // 5. 健康检查端点
    let app = health_routes(Arc::new(db.clone()));
    let listener = TcpListener::bind(config.server_addr())
        .await
        .with_context(|| format!("绑定地址失败: {}", config.server_addr()))?;
    info!("HTTP server listening on {}", config.server_addr());

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 6. 通知 Worker 退出并等待其完成当前订单
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        error!(error = %e, "积分对账 Worker 异常退出");
    }

    db.close().await;
    serve_result.context("HTTP 服务异常退出")?;

    info!("Service shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 监听 Ctrl+C 和 SIGTERM 信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "安装 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "安装 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
