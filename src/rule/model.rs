//! 规则数据模型定义
//! 仅存储用户编写的原始规则数据，无任何业务逻辑，支持序列化/反序列化

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize, de};

/// 规则校验方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationType {
    All,
    StatusCode,
    Headers,
    Body,
    #[serde(alias = "headers+body")]
    HeadersBody,
}

impl ValidationType {
    /// 解析配置中的校验方式（忽略首尾空白与大小写）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(ValidationType::All),
            "status_code" => Some(ValidationType::StatusCode),
            "headers" => Some(ValidationType::Headers),
            "body" => Some(ValidationType::Body),
            "headers_body" | "headers+body" => Some(ValidationType::HeadersBody),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationType::All => "all",
            ValidationType::StatusCode => "status_code",
            ValidationType::Headers => "headers",
            ValidationType::Body => "body",
            ValidationType::HeadersBody => "headers_body",
        }
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 规则命中后强制给出的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateTransition {
    Up,
    Down,
}

impl StateTransition {
    /// 解析配置中的状态（忽略首尾空白与大小写）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(StateTransition::Up),
            "down" => Some(StateTransition::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateTransition::Up => "up",
            StateTransition::Down => "down",
        }
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 模式列表：兼容单个字符串与字符串数组两种写法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternList {
    One(String),
    Many(Vec<String>),
}

impl PatternList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            PatternList::One(pattern) => std::slice::from_ref(pattern),
            PatternList::Many(patterns) => patterns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl Default for PatternList {
    fn default() -> Self {
        PatternList::Many(Vec::new())
    }
}

impl From<Vec<String>> for PatternList {
    fn from(patterns: Vec<String>) -> Self {
        PatternList::Many(patterns)
    }
}

impl From<&str> for PatternList {
    fn from(pattern: &str) -> Self {
        PatternList::One(pattern.to_string())
    }
}

/// 状态码条目：兼容整数与整数字符串两种写法
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusCodeEntry {
    Code(u16),
    Text(String),
}

/// 解析状态码列表，非数字字符串在加载期即报错
fn deserialize_status_codes<'de, D>(deserializer: D) -> Result<Option<Vec<u16>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<StatusCodeEntry>> = Option::deserialize(deserializer)?;
    entries
        .map(|entries| {
            entries
                .into_iter()
                .map(|entry| match entry {
                    StatusCodeEntry::Code(code) => Ok(code),
                    StatusCodeEntry::Text(text) => text
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| de::Error::custom(format!("invalid status code `{}`", text))),
                })
                .collect::<Result<Vec<u16>, D::Error>>()
        })
        .transpose()
}

/// 用户编写的特殊规则记录（special_rules 列表中的一项）
///
/// 校验方式与状态保留为原始字符串，由编译器统一校验并给出带规则下标的错误。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecialRule {
    #[serde(default)]
    pub subject_pattern: Option<String>,
    #[serde(default)]
    pub validation_type: Option<String>,
    #[serde(default)]
    pub state_transition: Option<String>,

    // 匹配条件（缺省即不启用）
    #[serde(
        default,
        deserialize_with = "deserialize_status_codes",
        skip_serializing_if = "Option::is_none"
    )]
    pub required_status_code: Option<Vec<u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_headers_patterns: Option<BTreeMap<String, PatternList>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_body_patterns: Option<PatternList>,
}

impl SpecialRule {
    /// 已声明的状态码（缺省为空）
    pub fn status_codes(&self) -> &[u16] {
        self.required_status_code.as_deref().unwrap_or(&[])
    }

    /// 已声明的Header模式（缺省为空）
    pub fn header_patterns(&self) -> impl Iterator<Item = (&String, &PatternList)> {
        self.required_headers_patterns.iter().flatten()
    }

    pub fn has_header_patterns(&self) -> bool {
        self.required_headers_patterns
            .as_ref()
            .is_some_and(|headers| !headers.is_empty())
    }

    /// 已声明的Body模式（缺省为空）
    pub fn body_patterns(&self) -> &[String] {
        self.required_body_patterns
            .as_ref()
            .map(PatternList::as_slice)
            .unwrap_or(&[])
    }
}
