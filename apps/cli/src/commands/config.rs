//! 配置管理命令

use crate::settings;
use anyhow::{Context, Result};
use clap::Subcommand;
use robstride_driver::DriverConfig;
use std::path::{Path, PathBuf};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效配置（文件 + 命令行覆盖）
    Show,

    /// 写出配置文件（默认值 + 命令行覆盖）
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: Option<&Path>, effective: &DriverConfig) -> Result<()> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => settings::default_path()?,
        };

        match self {
            ConfigCommand::Show => {
                let content = toml::to_string_pretty(effective).context("序列化配置失败")?;
                println!("# {}", path.display());
                println!("{}", content);
            },

            ConfigCommand::Init { force } => {
                if path.exists() && !force {
                    anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
                }
                settings::save(effective, &path)?;
                println!("✅ 已写入 {}", path.display());
            },

            ConfigCommand::Path => {
                println!("{}", path.display());
            },
        }

        Ok(())
    }
}
