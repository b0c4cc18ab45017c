//! 编译模块：将原始规则编译为可执行的正则模式
pub mod pattern;
pub mod compiler;

pub use self::pattern::{
    BodyCriterion, CompiledRule, HeaderCriterion, Pattern, RuleSet, StatusCodeCriterion, Validation,
};
pub use self::compiler::RuleCompiler;
