//! 条件评估器：状态码 / Header / Body 三类条件及其组合
//! 所有评估均为纯函数，响应字段缺失时视为不匹配而非错误

use crate::compiler::{BodyCriterion, HeaderCriterion, StatusCodeCriterion, Validation};
use super::response::ResponseDescriptor;

/// 单类响应条件
pub trait Criterion {
    fn matches(&self, response: &ResponseDescriptor) -> bool;
}

impl Criterion for StatusCodeCriterion {
    fn matches(&self, response: &ResponseDescriptor) -> bool {
        response
            .status_code()
            .is_some_and(|code| self.codes().contains(&code))
    }
}

impl Criterion for HeaderCriterion {
    /// 每个声明的Header都必须存在，且其值命中该Header下任意一条模式
    fn matches(&self, response: &ResponseDescriptor) -> bool {
        self.iter().all(|(name, patterns)| {
            response
                .header(name)
                .is_some_and(|value| patterns.iter().any(|pattern| pattern.is_match(value)))
        })
    }
}

impl Criterion for BodyCriterion {
    fn matches(&self, response: &ResponseDescriptor) -> bool {
        match response.body() {
            Some(body) if !body.is_empty() => {
                self.patterns().iter().any(|pattern| pattern.is_match(body))
            }
            _ => false,
        }
    }
}

/// 可选条件：未声明时返回 None，由组合逻辑决定如何处理
fn evaluate_optional<C: Criterion>(criterion: Option<&C>, response: &ResponseDescriptor) -> Option<bool> {
    criterion.map(|c| c.matches(response))
}

impl Validation {
    /// 判断响应是否满足该校验策略
    pub fn is_satisfied(&self, response: &ResponseDescriptor) -> bool {
        match self {
            Validation::StatusCode(criterion) => criterion.matches(response),
            Validation::Headers(criterion) => criterion.matches(response),
            Validation::Body(criterion) => criterion.matches(response),
            Validation::HeadersBody { headers, body } => {
                evaluate_optional(headers.as_ref(), response).unwrap_or(false)
                    || evaluate_optional(body.as_ref(), response).unwrap_or(false)
            }
            // 未声明的条件不参与合取
            Validation::All {
                status_code,
                headers,
                body,
            } => {
                evaluate_optional(status_code.as_ref(), response).unwrap_or(true)
                    && evaluate_optional(headers.as_ref(), response).unwrap_or(true)
                    && evaluate_optional(body.as_ref(), response).unwrap_or(true)
            }
        }
    }
}
