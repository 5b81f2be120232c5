//! ai-router 命令行入口

use ai_router::logger::init_tracing;
use ai_router::{
    BatchTranslator, ChatMessage, Dispatcher, ProviderStatus, RouterConfig,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// 多 Provider AI 请求路由
#[derive(Parser, Debug)]
#[command(name = "ai-router")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// 配置文件路径（YAML）
    #[arg(short, long, global = true, env = "AI_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 发送一条对话
    Chat {
        text: String,
        /// 逻辑用户 ID（用于限流）
        #[arg(short, long, default_value = "cli")]
        user: String,
        /// 系统提示
        #[arg(short, long)]
        system: Option<String>,
        /// 偏好模型
        #[arg(short, long)]
        model: Option<String>,
    },
    /// 批量翻译
    Translate {
        /// 目标语言代码，如 fa、en
        #[arg(long = "to")]
        to: String,
        #[arg(short, long, default_value = "cli")]
        user: String,
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// 显示 Provider 状态
    Providers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = RouterConfig::load(args.config.as_deref()).context("加载配置失败")?;
    let dispatcher = Arc::new(Dispatcher::from_config(&config).context("创建 HTTP 客户端失败")?);

    match args.command {
        Command::Chat {
            text,
            user,
            system,
            model,
        } => {
            let messages = [ChatMessage::user(text)];
            let reply = dispatcher
                .send_with_model(&messages, system.as_deref(), &user, model.as_deref())
                .await?;
            tracing::info!(
                provider = %reply.provider,
                model = %reply.model,
                latency_ms = reply.latency.as_millis() as u64,
                "完成"
            );
            println!("{}", reply.content);
        }
        Command::Translate { to, user, texts } => {
            let translator = BatchTranslator::new(dispatcher.clone());
            for line in translator.translate_all(&texts, &to, &user).await {
                println!("{line}");
            }
        }
        Command::Providers => print_statuses(&dispatcher.provider_statuses()),
    }

    Ok(())
}

fn print_statuses(statuses: &[ProviderStatus]) {
    println!(
        "{:<14} {:>8} {:>6} {:>7} {:>10} {:>9} {:>8}",
        "PROVIDER", "PRIORITY", "KEYS", "USABLE", "AVAILABLE", "SUCCESS", "SCORE"
    );
    for s in statuses {
        println!(
            "{:<14} {:>8} {:>6} {:>7} {:>10} {:>8.0}% {:>8.2}",
            s.id.as_str(),
            s.priority,
            s.keys,
            s.usable_keys,
            if s.available { "yes" } else { "no" },
            s.success_rate * 100.0,
            s.score,
        );
    }
}
