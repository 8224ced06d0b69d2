//! 配置文件与命令行覆盖
//!
//! 配置文件为 TOML，三个表对应 `DriverConfig` 的三部分：
//!
//! ```toml
//! [link]
//! port = "/dev/ttyUSB0"
//! baud_rate = 921600
//! motors = [1, 127]
//!
//! [delivery]
//! ack_timeout_ms = 500
//! retry_limit = 3
//! policy = "confirmed"
//!
//! [session]
//! settle_ms = 100
//! speed_limit = 44.0
//! ```
//!
//! 缺省字段使用默认值；命令行参数优先于文件。

use anyhow::{Context, Result};
use clap::Args;
use robstride_driver::{DeliveryPolicy, DriverConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径：`<config_dir>/robstride/config.toml`
pub fn default_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("robstride");
    path.push("config.toml");
    Ok(path)
}

/// 加载配置
///
/// 显式指定的文件必须存在；默认位置的文件不存在时使用默认配置。
pub fn load(path: Option<&Path>) -> Result<DriverConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_path()?, false),
    };

    if !path.exists() {
        if explicit {
            anyhow::bail!("配置文件不存在: {}", path.display());
        }
        return Ok(DriverConfig::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
    Ok(config)
}

/// 保存配置（自动创建目录）
pub fn save(config: &DriverConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("创建配置目录失败")?;
    }
    let content = toml::to_string_pretty(config).context("序列化配置失败")?;
    fs::write(path, content).context("写入配置文件失败")?;
    Ok(())
}

fn parse_policy(s: &str) -> Result<DeliveryPolicy, String> {
    match s.to_ascii_lowercase().as_str() {
        "confirmed" => Ok(DeliveryPolicy::Confirmed),
        "optimistic" => Ok(DeliveryPolicy::Optimistic),
        other => Err(format!("未知策略 '{}'（可选 confirmed / optimistic）", other)),
    }
}

/// 链路相关的命令行覆盖
#[derive(Args, Debug, Default, Clone)]
pub struct LinkArgs {
    /// 串口设备（覆盖配置）
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// 波特率（覆盖配置）
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// 电机 ID 列表，逗号分隔（覆盖配置）
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub motors: Option<Vec<u8>>,

    /// 确认超时（毫秒）
    #[arg(long, global = true)]
    pub ack_timeout_ms: Option<u64>,

    /// 投递策略：confirmed / optimistic
    #[arg(long, global = true, value_parser = parse_policy)]
    pub policy: Option<DeliveryPolicy>,
}

impl LinkArgs {
    pub fn apply(&self, config: &mut DriverConfig) {
        if let Some(port) = &self.port {
            config.link.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.link.baud_rate = baud;
        }
        if let Some(motors) = &self.motors {
            config.link.motors = motors.clone();
        }
        if let Some(ms) = self.ack_timeout_ms {
            config.delivery.ack_timeout_ms = ms;
        }
        if let Some(policy) = self.policy {
            config.delivery.policy = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DriverConfig::default();
        config.link.port = "COM7".to_string();
        config.link.motors = vec![127];
        config.delivery.policy = DeliveryPolicy::Optimistic;
        save(&config, &path).unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[link]\nport = \"/dev/ttyACM0\"\n\n[delivery]\npolicy = \"optimistic\"\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.link.port, "/dev/ttyACM0");
        assert_eq!(config.link.baud_rate, 921_600);
        assert_eq!(config.delivery.policy, DeliveryPolicy::Optimistic);
        assert_eq!(config.delivery.retry_limit, 3);
        assert_eq!(config.session.settle_ms, 100);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[link\nport = ").unwrap();
        assert!(load(Some(&path)).is_err());
    }

    #[test]
    fn test_args_override() {
        let mut config = DriverConfig::default();
        let args = LinkArgs {
            port: Some("COM17".to_string()),
            baud: Some(250_000),
            motors: Some(vec![1]),
            ack_timeout_ms: Some(200),
            policy: Some(DeliveryPolicy::Optimistic),
        };
        args.apply(&mut config);
        assert_eq!(config.link.port, "COM17");
        assert_eq!(config.link.baud_rate, 250_000);
        assert_eq!(config.link.motors, vec![1]);
        assert_eq!(config.delivery.ack_timeout_ms, 200);
        assert_eq!(config.delivery.policy, DeliveryPolicy::Optimistic);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(parse_policy("Confirmed").unwrap(), DeliveryPolicy::Confirmed);
        assert!(parse_policy("maybe").is_err());
    }
}
