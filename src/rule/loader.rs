//! 规则加载管理器
//! 负责从JSON/YAML文档中读取特殊规则列表并编译为规则集

use std::path::Path;
use tracing::{debug, warn};

use super::model::SpecialRule;
use crate::compiler::{RuleCompiler, RuleSet};
use crate::config::EngineConfig;
use crate::error::{RuleResult, SpecialRuleError};

/// 规则文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFileType {
    Json,
    Yaml,
}

impl RuleFileType {
    /// 根据文件扩展名判断规则文件类型
    pub fn from_path(path: &Path) -> RuleResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(RuleFileType::Json),
            Some("yaml") | Some("yml") => Ok(RuleFileType::Yaml),
            _ => Err(SpecialRuleError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 按配置加载规则集（未配置规则文件时返回空规则集）
    pub async fn load(config: &EngineConfig) -> RuleResult<RuleSet> {
        let Some(path) = config.rules_path.as_ref() else {
            debug!("未配置特殊规则文件，使用空规则集");
            return Ok(RuleSet::empty());
        };

        Self::load_file(path, &config.rules_key).await
    }

    /// 从本地文件加载规则集
    pub async fn load_file(path: impl AsRef<Path>, rules_key: &str) -> RuleResult<RuleSet> {
        let path = path.as_ref();
        let file_type = RuleFileType::from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        debug!("读取特殊规则文件成功：{}，{} 字节", path.display(), content.len());

        let rules = Self::parse_str(&content, file_type, rules_key)?;
        RuleCompiler::compile(&rules)
    }

    pub fn from_json_str(content: &str, rules_key: &str) -> RuleResult<RuleSet> {
        let rules = Self::parse_str(content, RuleFileType::Json, rules_key)?;
        RuleCompiler::compile(&rules)
    }

    pub fn from_yaml_str(content: &str, rules_key: &str) -> RuleResult<RuleSet> {
        let rules = Self::parse_str(content, RuleFileType::Yaml, rules_key)?;
        RuleCompiler::compile(&rules)
    }

    /// 解析规则文档为原始规则列表（不编译）
    ///
    /// 文档可以是规则数组，也可以是在 `rules_key` 下存放规则数组的映射。
    pub fn parse_str(
        content: &str,
        file_type: RuleFileType,
        rules_key: &str,
    ) -> RuleResult<Vec<SpecialRule>> {
        match file_type {
            RuleFileType::Json => Self::parse_json(content, rules_key),
            RuleFileType::Yaml => Self::parse_yaml(content, rules_key),
        }
    }

    fn parse_json(content: &str, rules_key: &str) -> RuleResult<Vec<SpecialRule>> {
        use serde_json::Value;

        let document: Value = serde_json::from_str(content)?;
        let records = match document {
            Value::Array(records) => records,
            Value::Object(mut map) => match map.remove(rules_key) {
                Some(Value::Array(records)) => records,
                Some(Value::Null) | None => return Ok(Self::missing_rules(rules_key)),
                Some(_) => return Err(Self::not_a_list(rules_key)),
            },
            Value::Null => return Ok(Self::missing_rules(rules_key)),
            _ => {
                return Err(SpecialRuleError::RuleParseError(
                    "rule document must be a list or a mapping".to_string(),
                ));
            }
        };

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value(record).map_err(|e| SpecialRuleError::MalformedRecord {
                    index,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn parse_yaml(content: &str, rules_key: &str) -> RuleResult<Vec<SpecialRule>> {
        use serde_yaml::Value;

        let document: Value = serde_yaml::from_str(content)?;
        let records = match document {
            Value::Sequence(records) => records,
            Value::Mapping(mut map) => match map.remove(rules_key) {
                Some(Value::Sequence(records)) => records,
                Some(Value::Null) | None => return Ok(Self::missing_rules(rules_key)),
                Some(_) => return Err(Self::not_a_list(rules_key)),
            },
            Value::Null => return Ok(Self::missing_rules(rules_key)),
            _ => {
                return Err(SpecialRuleError::RuleParseError(
                    "rule document must be a list or a mapping".to_string(),
                ));
            }
        };

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_yaml::from_value(record).map_err(|e| SpecialRuleError::MalformedRecord {
                    index,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn missing_rules(rules_key: &str) -> Vec<SpecialRule> {
        warn!("规则文档中不存在 `{}` 列表，使用空规则集", rules_key);
        Vec::new()
    }

    fn not_a_list(rules_key: &str) -> SpecialRuleError {
        SpecialRuleError::RuleParseError(format!("`{}` must be a list of rule records", rules_key))
    }
}
