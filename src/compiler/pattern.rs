//! 编译后模式模型
//! 正则编译后的结构，构建完成后只读，可在线程间自由共享

use std::collections::BTreeSet;
use std::sync::Arc;
use regex::{Error as RegexError, Regex, RegexBuilder};

use crate::rule::{StateTransition, ValidationType};

/// 编译后的正则模式
///
/// 保留原始模式文本用于诊断；匹配为搜索语义（子串命中即可），
/// 除非模式自身使用 `(?i)` 等内联标志，否则区分大小写。
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// 原样编译模式文本，不做任何转义
    pub fn new(source: &str) -> Result<Self, RegexError> {
        let regex = RegexBuilder::new(source).build()?;
        Ok(Self { regex })
    }

    /// 原始模式文本
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    #[inline]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

/// 状态码条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodeCriterion {
    codes: BTreeSet<u16>,
}

impl StatusCodeCriterion {
    pub(crate) fn new(codes: BTreeSet<u16>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &BTreeSet<u16> {
        &self.codes
    }
}

/// Header条件：Header名（小写） -> 模式列表
#[derive(Debug, Clone)]
pub struct HeaderCriterion {
    headers: Vec<(String, Vec<Pattern>)>,
}

impl HeaderCriterion {
    pub(crate) fn new(headers: Vec<(String, Vec<Pattern>)>) -> Self {
        Self { headers }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Pattern])> {
        self.headers
            .iter()
            .map(|(name, patterns)| (name.as_str(), patterns.as_slice()))
    }

    pub fn pattern_count(&self) -> usize {
        self.headers.iter().map(|(_, patterns)| patterns.len()).sum()
    }
}

/// Body条件
#[derive(Debug, Clone)]
pub struct BodyCriterion {
    patterns: Vec<Pattern>,
}

impl BodyCriterion {
    pub(crate) fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// 校验策略：每种校验方式只携带它需要的条件
#[derive(Debug, Clone)]
pub enum Validation {
    StatusCode(StatusCodeCriterion),
    Headers(HeaderCriterion),
    Body(BodyCriterion),
    /// 至少一侧存在
    HeadersBody {
        headers: Option<HeaderCriterion>,
        body: Option<BodyCriterion>,
    },
    /// 至少一项存在
    All {
        status_code: Option<StatusCodeCriterion>,
        headers: Option<HeaderCriterion>,
        body: Option<BodyCriterion>,
    },
}

impl Validation {
    pub fn validation_type(&self) -> ValidationType {
        match self {
            Validation::StatusCode(_) => ValidationType::StatusCode,
            Validation::Headers(_) => ValidationType::Headers,
            Validation::Body(_) => ValidationType::Body,
            Validation::HeadersBody { .. } => ValidationType::HeadersBody,
            Validation::All { .. } => ValidationType::All,
        }
    }
}

/// 编译后的特殊规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub(crate) index: usize,
    pub(crate) subject: Pattern,
    pub(crate) validation: Validation,
    pub(crate) transition: StateTransition,
}

impl CompiledRule {
    /// 规则在原始列表中的下标
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn subject_pattern(&self) -> &Pattern {
        &self.subject
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub fn state_transition(&self) -> StateTransition {
        self.transition
    }
}

/// 编译后的规则集
///
/// 保持用户编写顺序，不去重、不重排；克隆只增加引用计数。
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Arc<[CompiledRule]>,
}

impl RuleSet {
    pub(crate) fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules: rules.into() }
    }

    /// 空规则集（所有评估均返回 NoMatch）
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CompiledRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a CompiledRule;
    type IntoIter = std::slice::Iter<'a, CompiledRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
