//! 全局错误类型定义
//! 所有错误均在规则加载期产生，规则评估期不存在可恢复错误

use std::io::Error as IoError;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use serde_yaml::Error as SerdeYamlError;
use thiserror::Error;

/// 规则结构校验失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// 缺少 subject_pattern
    #[error("missing subject pattern")]
    MissingSubjectPattern,
    /// validation_type 不在支持列表内
    #[error("unknown validation type `{0}`")]
    UnknownValidationType(String),
    /// validation_type 要求的匹配条件为空
    #[error("missing criteria required by the validation type")]
    MissingCriteria,
    /// state_transition 不是 up/down
    #[error("invalid state transition `{0}` (expected `up` or `down`)")]
    InvalidTransition(String),
}

#[derive(Error, Debug)]
pub enum SpecialRuleError {
    // 编译相关错误
    #[error("Invalid pattern in rule #{index} ({field}): `{pattern}`: {source}")]
    InvalidPattern {
        index: usize,
        field: String,
        pattern: String,
        #[source]
        source: RegexError,
    },

    // 校验相关错误
    #[error("Invalid rule #{index} ({field}): {reason}")]
    Validation {
        index: usize,
        field: String,
        reason: ValidationReason,
    },
    #[error("Malformed rule record #{index}: {message}")]
    MalformedRecord { index: usize, message: String },

    // 规则文档相关错误
    #[error("Rule parse failed: {0}")]
    RuleParseError(String),
    #[error("Unsupported rule file format: {0}")]
    UnsupportedFormat(String),

    // 序列化/反序列化错误
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("YAML parse failed: {0}")]
    YamlError(#[from] SerdeYamlError),

    // 基础错误
    #[error("IO operation failed: {0}")]
    IoError(#[from] IoError),
}

impl SpecialRuleError {
    /// 出错规则在规则集中的下标（文档级错误返回 None）
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            SpecialRuleError::InvalidPattern { index, .. }
            | SpecialRuleError::Validation { index, .. }
            | SpecialRuleError::MalformedRecord { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_compile_error(&self) -> bool {
        matches!(self, SpecialRuleError::InvalidPattern { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, SpecialRuleError::Validation { .. })
    }

    /// 校验失败原因（仅 Validation 错误）
    pub fn validation_reason(&self) -> Option<&ValidationReason> {
        match self {
            SpecialRuleError::Validation { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

// 全局Result类型
pub type RuleResult<T> = Result<T, SpecialRuleError>;
