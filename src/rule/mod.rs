//! 规则模块：负责原始规则的数据模型定义与加载
pub mod model;
pub mod loader;

// 导出核心接口
pub use self::model::{PatternList, SpecialRule, StateTransition, ValidationType};
pub use self::loader::{RuleFileType, RuleLoader};
