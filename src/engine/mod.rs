//! 引擎模块：响应描述、条件评估与规则命中逻辑
pub mod response;
pub mod evaluator;
pub mod engine;

// 导出核心接口
pub use self::response::ResponseDescriptor;
pub use self::evaluator::Criterion;
pub use self::engine::{Decision, RuleEngine, RuleMatch};
