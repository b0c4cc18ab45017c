//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

/// 规则文档中特殊规则列表的默认键名
pub const DEFAULT_RULES_KEY: &str = "special_rules";

/// 引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // 是否启用特殊规则（关闭时所有评估均返回 NoMatch）
    pub enabled: bool,
    // 规则文件路径（None 表示无特殊规则）
    pub rules_path: Option<PathBuf>,
    // 规则文档中特殊规则列表的键名
    pub rules_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules_path: None,
            rules_key: DEFAULT_RULES_KEY.to_string(),
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> EngineConfig {
        EngineConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: EngineConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rules_path = Some(path.into());
        self
    }

    pub fn rules_key(mut self, key: impl Into<String>) -> Self {
        self.config.rules_key = key.into();
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
