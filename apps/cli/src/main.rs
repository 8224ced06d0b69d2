//! # Robstride CLI
//!
//! 通过串口 USB-CAN 适配器控制 Robstride 关节电机的命令行工具。
//!
//! ```bash
//! # 写出默认配置，之后按需编辑
//! robstride-cli config init --port /dev/ttyUSB0
//!
//! # 位置控制台：127,1.57,10 / 127,r
//! robstride-cli console
//!
//! # 速度控制台：127,10
//! robstride-cli velocity --max-current 23
//!
//! # 编码器监视
//! robstride-cli encoder --motor 127 --interval-ms 100
//!
//! # 原始十六进制控制台
//! robstride-cli raw --baud 250000
//!
//! # 关节意图控制台（文本行协议 + ACK）
//! robstride-cli intent --policy confirmed
//! ```
//!
//! 日志级别通过 `RUST_LOG` 调整，例如 `RUST_LOG=robstride_driver=debug`
//! 可以看到每一帧的 "Sent:" / "Received:"。

use anyhow::Result;
use clap::{Parser, Subcommand};
use robstride_driver::DriverConfig;
use std::path::PathBuf;

mod commands;
mod input;
mod parse;
mod settings;

use commands::{ConfigCommand, EncoderCommand, VelocityCommand};
use settings::LinkArgs;

/// Robstride CLI - 电机串口控制工具
#[derive(Parser, Debug)]
#[command(name = "robstride-cli")]
#[command(about = "Command-line consoles for Robstride motors over a serial USB-CAN adapter", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/robstride/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    link: LinkArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 位置控制台
    Console,

    /// 速度控制台
    Velocity {
        #[command(flatten)]
        args: VelocityCommand,
    },

    /// 编码器监视
    Encoder {
        #[command(flatten)]
        args: EncoderCommand,
    },

    /// 原始十六进制控制台
    Raw,

    /// 关节意图控制台（键盘手柄）
    Intent,

    /// 列出可用串口
    Ports,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("robstride_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // init 从默认值开始，其余命令读取配置文件
    let mut config = if matches!(cli.command, Commands::Config(ConfigCommand::Init { .. })) {
        DriverConfig::default()
    } else {
        settings::load(cli.config.as_deref())?
    };
    cli.link.apply(&mut config);

    match cli.command {
        Commands::Config(cmd) => cmd.execute(cli.config.as_deref(), &config),
        Commands::Console => commands::console::run(&config),
        Commands::Velocity { args } => args.execute(&config),
        Commands::Encoder { args } => args.execute(&config),
        Commands::Raw => commands::raw::run(&config),
        Commands::Intent => commands::intent::run(&config),
        Commands::Ports => commands::ports::run(),
    }
}
