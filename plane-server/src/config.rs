//! 服务端配置

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use protocol::PLACEMENT_TIME_LIMIT_MS;

/// 服务端配置
///
/// 所有字段均有默认值，配置文件里只需写要覆盖的项
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 布阵时间限制（毫秒）
    pub placement_limit_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            placement_limit_ms: PLACEMENT_TIME_LIMIT_MS,
        }
    }
}

impl ServerConfig {
    /// 从 JSON 配置文件加载
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {:?}", path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {:?}", path))?;
        Ok(config)
    }

    /// 监听地址字符串
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
