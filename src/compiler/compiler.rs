//! 规则编译器核心
//! 负责将用户编写的原始规则校验并编译为可执行的规则集

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::debug;

use super::pattern::{
    BodyCriterion, CompiledRule, HeaderCriterion, Pattern, RuleSet, StatusCodeCriterion, Validation,
};
use crate::error::{RuleResult, SpecialRuleError, ValidationReason};
use crate::rule::{SpecialRule, StateTransition, ValidationType};

const SUBJECT_FIELD: &str = "subject_pattern";
const VALIDATION_TYPE_FIELD: &str = "validation_type";
const TRANSITION_FIELD: &str = "state_transition";
const STATUS_CODE_FIELD: &str = "required_status_code";
const HEADERS_FIELD: &str = "required_headers_patterns";
const BODY_FIELD: &str = "required_body_patterns";

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译整个规则集
    ///
    /// 任意一条规则失败即整体失败，不会返回部分生效的规则集。
    pub fn compile(rules: &[SpecialRule]) -> RuleResult<RuleSet> {
        let start = Instant::now();
        let mut stats = CompileStats::default();
        let mut compiled_rules = Vec::with_capacity(rules.len());

        for (index, rule) in rules.iter().enumerate() {
            let compiled = Self::compile_rule_with_stats(index, rule, &mut stats)?;
            compiled_rules.push(compiled);
        }

        debug!("规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "编译统计：规则{}条、状态码{}个、Header模式{}条、Body模式{}条",
            compiled_rules.len(),
            stats.status_code_count,
            stats.header_count,
            stats.body_count
        );

        Ok(RuleSet::new(compiled_rules))
    }

    /// 编译单条规则（index 为规则在列表中的下标，用于错误定位）
    pub fn compile_rule(index: usize, rule: &SpecialRule) -> RuleResult<CompiledRule> {
        Self::compile_rule_with_stats(index, rule, &mut CompileStats::default())
    }

    fn compile_rule_with_stats(
        index: usize,
        rule: &SpecialRule,
        stats: &mut CompileStats,
    ) -> RuleResult<CompiledRule> {
        // 1. 编译主体模式
        let subject_source = rule
            .subject_pattern
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .ok_or_else(|| {
                validation_error(index, SUBJECT_FIELD, ValidationReason::MissingSubjectPattern)
            })?;
        let subject = Self::compile_single_pattern(index, SUBJECT_FIELD, subject_source)?;

        // 2. 校验方式
        let raw_type = rule.validation_type.as_deref().unwrap_or_default();
        let validation_type = ValidationType::parse(raw_type).ok_or_else(|| {
            validation_error(
                index,
                VALIDATION_TYPE_FIELD,
                ValidationReason::UnknownValidationType(raw_type.to_string()),
            )
        })?;

        // 3. 校验方式要求的条件必须非空
        Self::check_required_criteria(index, validation_type, rule)?;

        // 4. 编译所有已声明的条件
        let status_code = Self::compile_status_codes(rule.status_codes(), stats);
        let headers = Self::compile_header_patterns(index, rule, stats)?;
        let body = Self::compile_body_patterns(index, rule.body_patterns(), stats)?;
        let validation = Self::build_validation(index, validation_type, status_code, headers, body)?;

        // 5. 状态转换
        let raw_transition = rule.state_transition.as_deref().unwrap_or_default();
        let transition = StateTransition::parse(raw_transition).ok_or_else(|| {
            validation_error(
                index,
                TRANSITION_FIELD,
                ValidationReason::InvalidTransition(raw_transition.to_string()),
            )
        })?;

        Ok(CompiledRule {
            index,
            subject,
            validation,
            transition,
        })
    }

    fn check_required_criteria(
        index: usize,
        validation_type: ValidationType,
        rule: &SpecialRule,
    ) -> RuleResult<()> {
        let has_status = !rule.status_codes().is_empty();
        let has_headers = rule.has_header_patterns();
        let has_body = !rule.body_patterns().is_empty();

        let (satisfied, field) = match validation_type {
            ValidationType::StatusCode => (has_status, STATUS_CODE_FIELD),
            ValidationType::Headers => (has_headers, HEADERS_FIELD),
            ValidationType::Body => (has_body, BODY_FIELD),
            ValidationType::HeadersBody => (
                has_headers || has_body,
                "required_headers_patterns|required_body_patterns",
            ),
            ValidationType::All => (
                has_status || has_headers || has_body,
                "required_status_code|required_headers_patterns|required_body_patterns",
            ),
        };

        if satisfied {
            Ok(())
        } else {
            Err(validation_error(index, field, ValidationReason::MissingCriteria))
        }
    }

    /// 按校验方式组装策略，单条件类型丢弃无关条件
    fn build_validation(
        index: usize,
        validation_type: ValidationType,
        status_code: Option<StatusCodeCriterion>,
        headers: Option<HeaderCriterion>,
        body: Option<BodyCriterion>,
    ) -> RuleResult<Validation> {
        let missing = |field: &str| validation_error(index, field, ValidationReason::MissingCriteria);

        let validation = match validation_type {
            ValidationType::StatusCode => {
                Validation::StatusCode(status_code.ok_or_else(|| missing(STATUS_CODE_FIELD))?)
            }
            ValidationType::Headers => {
                Validation::Headers(headers.ok_or_else(|| missing(HEADERS_FIELD))?)
            }
            ValidationType::Body => Validation::Body(body.ok_or_else(|| missing(BODY_FIELD))?),
            ValidationType::HeadersBody => Validation::HeadersBody { headers, body },
            ValidationType::All => Validation::All {
                status_code,
                headers,
                body,
            },
        };

        Ok(validation)
    }

    fn compile_status_codes(codes: &[u16], stats: &mut CompileStats) -> Option<StatusCodeCriterion> {
        let codes: BTreeSet<u16> = codes.iter().copied().collect();
        if codes.is_empty() {
            return None;
        }
        stats.status_code_count += codes.len();
        Some(StatusCodeCriterion::new(codes))
    }

    /// 编译Header模式（Header名统一转小写）
    fn compile_header_patterns(
        index: usize,
        rule: &SpecialRule,
        stats: &mut CompileStats,
    ) -> RuleResult<Option<HeaderCriterion>> {
        let mut headers: Vec<(String, Vec<Pattern>)> = Vec::new();

        for (name, pattern_list) in rule.header_patterns() {
            let header_name = name.trim().to_ascii_lowercase();
            let field = format!("{}.{}", HEADERS_FIELD, header_name);
            if pattern_list.is_empty() {
                return Err(validation_error(index, &field, ValidationReason::MissingCriteria));
            }

            let mut patterns = Vec::with_capacity(pattern_list.as_slice().len());
            for source in pattern_list.as_slice() {
                patterns.push(Self::compile_single_pattern(index, &field, source)?);
            }
            stats.header_count += patterns.len();

            // 大小写不同的同名Header合并
            match headers.iter_mut().find(|(existing, _)| *existing == header_name) {
                Some((_, existing)) => existing.extend(patterns),
                None => headers.push((header_name, patterns)),
            }
        }

        if headers.is_empty() {
            Ok(None)
        } else {
            Ok(Some(HeaderCriterion::new(headers)))
        }
    }

    fn compile_body_patterns(
        index: usize,
        sources: &[String],
        stats: &mut CompileStats,
    ) -> RuleResult<Option<BodyCriterion>> {
        if sources.is_empty() {
            return Ok(None);
        }

        let patterns = sources
            .iter()
            .map(|source| Self::compile_single_pattern(index, BODY_FIELD, source))
            .collect::<RuleResult<Vec<_>>>()?;
        stats.body_count += patterns.len();

        Ok(Some(BodyCriterion::new(patterns)))
    }

    /// 编译单个正则模式，失败时附带规则下标与原始模式文本
    fn compile_single_pattern(index: usize, field: &str, source: &str) -> RuleResult<Pattern> {
        Pattern::new(source).map_err(|source_err| SpecialRuleError::InvalidPattern {
            index,
            field: field.to_string(),
            pattern: source.to_string(),
            source: source_err,
        })
    }
}

fn validation_error(index: usize, field: &str, reason: ValidationReason) -> SpecialRuleError {
    SpecialRuleError::Validation {
        index,
        field: field.to_string(),
        reason,
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    status_code_count: usize,
    header_count: usize,
    body_count: usize,
}
