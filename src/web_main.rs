//! Web 服务器主程序入口

use clap::Parser;
use tracing_subscriber::EnvFilter;

use faq_lingo::config::ConfigManager;
use faq_lingo::env::{self, EnvVar};
use faq_lingo::web::{WebConfig, WebServer};

/// 多语言 FAQ 服务
#[derive(Debug, Parser)]
#[command(name = "faq-web", version, about = "Multilingual FAQ server")]
struct Args {
    /// 绑定地址
    #[arg(short, long)]
    bind: Option<String>,

    /// 端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 输出环境变量文档后退出
    #[arg(long)]
    env_docs: bool,

    /// 生成示例配置文件后退出
    #[arg(long, value_name = "PATH")]
    example_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.env_docs {
        println!("{}", env::generate_env_docs());
        return Ok(());
    }

    if let Some(path) = &args.example_config {
        ConfigManager::generate_example_config(path)?;
        println!("示例配置已写入: {}", path);
        return Ok(());
    }

    init_tracing();

    let faq_config = ConfigManager::load(args.config.as_deref())?.into_config();

    let mut web_config = WebConfig::from_env()?;
    if let Some(bind) = args.bind {
        web_config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        web_config.port = port;
    }
    web_config.config_path = args.config;

    WebServer::new(web_config, faq_config).start().await?;
    Ok(())
}

fn init_tracing() {
    let level = env::core::LogLevel::get().unwrap_or_else(|e| {
        eprintln!("警告: {}", e);
        "info".to_string()
    });
    let filter = EnvFilter::try_new(format!("faq_lingo={level},faq_web={level},tower_http={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
