//! rspecialrules - 可用性检测特殊规则引擎
//!
//! 根据HTTP响应（状态码 / Header / Body）与用户自定义规则，
//! 覆盖被检测主体（域名、URL、IP）的默认 up/down 判定。

// 导出全局错误类型
pub use self::error::{RuleResult, SpecialRuleError, ValidationReason};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, EngineConfig, DEFAULT_RULES_KEY};

// 导出规则模块核心接口
pub use self::rule::{
    PatternList, RuleFileType, RuleLoader, SpecialRule, StateTransition, ValidationType,
};

// 导出编译模块核心接口
pub use self::compiler::{
    BodyCriterion, CompiledRule, HeaderCriterion, Pattern, RuleCompiler, RuleSet,
    StatusCodeCriterion, Validation,
};

// 导出引擎模块核心接口
pub use self::engine::{Criterion, Decision, ResponseDescriptor, RuleEngine, RuleMatch};

// 导出工具模块核心接口
pub use self::utils::HeaderConverter;

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod compiler;
pub mod engine;
pub mod utils;
