//! theme-mapper 命令行入口：启动HTTP服务、驱动批量映射、单条分类

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use theme_mapper::{
    AppState, BatchDriver, BatchRequest, BatchRunner, ConfigManager, GlobalConfig,
    InMemoryProductStore, MappingMode, PostgrestProductStore, ProductStore,
    init_classifier_with_config, serve,
};

/// 商品内容主题映射工具
#[derive(Parser, Debug)]
#[command(name = "theme-mapper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Supabase项目地址
    #[arg(long, global = true, env = "THEME_MAPPER_STORE_URL")]
    store_url: Option<String>,

    /// service_role密钥
    #[arg(long, global = true, env = "THEME_MAPPER_SERVICE_KEY", hide_env_values = true)]
    service_key: Option<String>,

    /// 自定义规则文件（JSON）
    #[arg(long, global = true, env = "THEME_MAPPER_RULE_FILE")]
    rule_file: Option<PathBuf>,

    /// 输出详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动HTTP服务
    Serve {
        /// 监听地址
        #[arg(long, env = "THEME_MAPPER_LISTEN")]
        listen: Option<SocketAddr>,
    },
    /// 循环执行批处理直到完成
    Run {
        #[arg(long, value_enum, default_value_t = ModeArg::UnmappedOnly)]
        mode: ModeArg,
        /// 每批商品数
        #[arg(long)]
        batch_size: Option<usize>,
        /// 从该id之后继续（用于中断后恢复）
        #[arg(long)]
        last_processed_id: Option<i64>,
        /// 使用本地JSON商品文件代替远程存储
        #[arg(long)]
        input: Option<PathBuf>,
        /// 本地模式下写出结果的文件
        #[arg(long, requires = "input")]
        output: Option<PathBuf>,
        /// 批次间隔（毫秒）
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
        /// 本次最多执行的批次数
        #[arg(long)]
        max_batches: Option<u64>,
    },
    /// 对单个商品分类并输出主题
    Classify {
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    UnmappedOnly,
    All,
}

impl From<ModeArg> for MappingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::UnmappedOnly => MappingMode::UnmappedOnly,
            ModeArg::All => MappingMode::All,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info,tower_http=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(cli: &Cli) -> anyhow::Result<GlobalConfig> {
    let base = GlobalConfig::from_env().context("读取环境变量配置失败")?;
    let mut builder = ConfigManager::custom()
        .store_url(cli.store_url.clone().unwrap_or(base.store_url))
        .service_key(cli.service_key.clone().unwrap_or(base.service_key))
        .product_table(base.product_table)
        .bulk_update_rpc(base.bulk_update_rpc)
        .http_timeout(base.http_timeout)
        .default_batch_size(base.default_batch_size)
        .listen_addr(base.listen_addr)
        .rule_file(cli.rule_file.clone().or(base.rule_file))
        .verbose(cli.verbose);

    if let Command::Serve { listen: Some(addr) } = &cli.command {
        builder = builder.listen_addr(*addr);
    }
    Ok(builder.build()?)
}

async fn drive<S: ProductStore + ?Sized>(
    runner: &BatchRunner<S>,
    request: BatchRequest,
    driver: &BatchDriver,
) -> anyhow::Result<()> {
    match driver.run_to_completion(runner, request).await {
        Ok(summary) => {
            info!(
                "驱动结束：完成{}批，共分类{}条商品，最后游标{:?}，{}",
                summary.batches,
                summary.processed,
                summary.last_processed_id,
                if summary.is_complete() { "已全部完成" } else { "尚有待处理商品" }
            );
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("批量主题映射中止")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    let classifier = init_classifier_with_config(&config)
        .await
        .context("规则库初始化失败")?
        .clone();

    match cli.command {
        Command::Serve { .. } => {
            if config.service_key.is_empty() {
                warn!("未设置service_key，PostgREST请求将以匿名身份发送");
            }
            let store: Arc<dyn ProductStore> = Arc::new(PostgrestProductStore::new(&config)?);
            let runner = BatchRunner::from_config(store, classifier, &config);
            serve(config.listen_addr, Arc::new(AppState::new(runner))).await?;
        }
        Command::Run {
            mode,
            batch_size,
            last_processed_id,
            input,
            output,
            delay_ms,
            max_batches,
        } => {
            let request = BatchRequest {
                mode: mode.into(),
                batch_size,
                last_processed_id,
                batch_number: None,
            };
            let driver = BatchDriver::new()
                .with_delay(Duration::from_millis(delay_ms))
                .with_max_batches(max_batches);

            match input {
                Some(path) => {
                    let store = Arc::new(InMemoryProductStore::from_json_file(&path).await?);
                    let runner = BatchRunner::from_config(Arc::clone(&store), classifier, &config);
                    let result = drive(&runner, request, &driver).await;
                    if let Some(output) = output {
                        store.save_json_file(&output).await?;
                        info!("结果已写入{}", output.display());
                    }
                    result?;
                }
                None => {
                    let store = Arc::new(PostgrestProductStore::new(&config)?);
                    let runner = BatchRunner::from_config(store, classifier, &config);
                    drive(&runner, request, &driver).await?;
                }
            }
        }
        Command::Classify {
            name,
            category,
            subcategory,
        } => {
            let classification =
                classifier.classify_detailed(&name, category.as_deref(), subcategory.as_deref());
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
    }

    Ok(())
}
