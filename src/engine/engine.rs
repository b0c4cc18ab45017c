//! 规则引擎核心：按编写顺序扫描规则集，首个完全命中的规则决定状态
use std::fmt;
use tracing::{debug, trace};

use super::response::ResponseDescriptor;
use crate::compiler::{CompiledRule, RuleSet};
use crate::config::EngineConfig;
use crate::error::RuleResult;
use crate::rule::{RuleLoader, StateTransition};

/// 评估结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// 命中规则，强制转换为指定状态
    Transition(StateTransition),
    /// 无规则命中，由调用方默认逻辑决定最终状态
    NoMatch,
}

impl Decision {
    pub fn transition(&self) -> Option<StateTransition> {
        match self {
            Decision::Transition(transition) => Some(*transition),
            Decision::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Decision::Transition(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Transition(transition) => write!(f, "{}", transition),
            Decision::NoMatch => write!(f, "no match"),
        }
    }
}

impl From<Option<RuleMatch>> for Decision {
    fn from(matched: Option<RuleMatch>) -> Self {
        matched.map_or(Decision::NoMatch, |m| Decision::Transition(m.transition))
    }
}

/// 命中详情
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    /// 命中规则在规则集中的下标
    pub index: usize,
    pub transition: StateTransition,
}

/// 特殊规则引擎
///
/// 构建后只读，可在任意线程间共享并发调用 `evaluate`。
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rule_set: RuleSet,
    enabled: bool,
}

impl RuleEngine {
    pub fn new(rule_set: RuleSet) -> Self {
        Self {
            rule_set,
            enabled: true,
        }
    }

    pub fn with_config(rule_set: RuleSet, config: &EngineConfig) -> Self {
        Self {
            rule_set,
            enabled: config.enabled,
        }
    }

    /// 按配置加载规则文件并创建引擎
    pub async fn from_config(config: &EngineConfig) -> RuleResult<Self> {
        let rule_set = RuleLoader::load(config).await?;
        Ok(Self::with_config(rule_set, config))
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 评估主体与响应，返回状态转换或 NoMatch
    pub fn evaluate(&self, subject: &str, response: &ResponseDescriptor) -> Decision {
        self.evaluate_detailed(subject, response).into()
    }

    /// 评估并返回命中的规则下标
    ///
    /// 主体不匹配的规则不会评估任何响应条件。
    pub fn evaluate_detailed(&self, subject: &str, response: &ResponseDescriptor) -> Option<RuleMatch> {
        self.scan(subject, |rule| rule.validation().is_satisfied(response))
    }

    /// 按编写顺序扫描规则：主体命中后才调用 `criteria_met`，首个返回 true 的规则胜出
    fn scan<F>(&self, subject: &str, mut criteria_met: F) -> Option<RuleMatch>
    where
        F: FnMut(&CompiledRule) -> bool,
    {
        if !self.enabled {
            return None;
        }

        for rule in &self.rule_set {
            if !rule.subject_pattern().is_match(subject) {
                trace!(
                    "主体未命中：subject={}，规则#{}，模式={}",
                    subject,
                    rule.index(),
                    rule.subject_pattern().source()
                );
                continue;
            }

            if criteria_met(rule) {
                debug!(
                    "特殊规则命中：subject={}，规则#{}，校验方式={}，状态={}",
                    subject,
                    rule.index(),
                    rule.validation().validation_type(),
                    rule.state_transition()
                );
                return Some(RuleMatch {
                    index: rule.index(),
                    transition: rule.state_transition(),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Once;

    use super::*;
    use crate::compiler::RuleCompiler;
    use crate::config::ConfigManager;
    use crate::rule::{PatternList, SpecialRule};

    static INIT: Once = Once::new();

    fn init_tracing() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    fn rule(subject: &str, validation_type: &str, transition: &str) -> SpecialRule {
        SpecialRule {
            subject_pattern: Some(subject.to_string()),
            validation_type: Some(validation_type.to_string()),
            state_transition: Some(transition.to_string()),
            ..Default::default()
        }
    }

    fn header_patterns(name: &str, pattern: &str) -> Option<BTreeMap<String, PatternList>> {
        Some(BTreeMap::from([(name.to_string(), PatternList::from(pattern))]))
    }

    fn engine(rules: Vec<SpecialRule>) -> RuleEngine {
        init_tracing();
        RuleEngine::new(RuleCompiler::compile(&rules).unwrap())
    }

    #[test]
    fn test_status_code_rule() {
        let mut raw = rule(r"^example\.org$", "status_code", "down");
        raw.required_status_code = Some(vec![404]);
        let engine = engine(vec![raw]);

        let not_found = ResponseDescriptor::new().with_status_code(404);
        assert_eq!(
            engine.evaluate("example.org", &not_found),
            Decision::Transition(StateTransition::Down)
        );

        let ok = ResponseDescriptor::new().with_status_code(200);
        assert_eq!(engine.evaluate("example.org", &ok), Decision::NoMatch);
    }

    #[test]
    fn test_headers_rule() {
        let mut raw = rule(r"^example\.org$", "headers", "down");
        raw.required_headers_patterns = header_patterns("server", "nginx");
        let engine = engine(vec![raw]);

        let nginx = ResponseDescriptor::new().with_header("Server", "nginx/1.18");
        assert_eq!(
            engine.evaluate("example.org", &nginx),
            Decision::Transition(StateTransition::Down)
        );

        let apache = ResponseDescriptor::new().with_header("server", "apache");
        assert_eq!(engine.evaluate("example.org", &apache), Decision::NoMatch);
    }

    #[test]
    fn test_body_rule() {
        let mut raw = rule(r"^example\.org$", "body", "up");
        raw.required_body_patterns = Some("Hello, World!".into());
        let engine = engine(vec![raw]);

        let hello = ResponseDescriptor::new().with_body("<h1>Hello, World!</h1>");
        assert_eq!(
            engine.evaluate("example.org", &hello),
            Decision::Transition(StateTransition::Up)
        );

        let goodbye = ResponseDescriptor::new().with_body("Goodbye");
        assert_eq!(engine.evaluate("example.org", &goodbye), Decision::NoMatch);
    }

    #[test]
    fn test_headers_body_rule_or_semantics() {
        let mut raw = rule(r"^example\.org$", "headers_body", "down");
        raw.required_headers_patterns = header_patterns("server", "nginx");
        raw.required_body_patterns = Some("Hello, World!".into());
        let engine = engine(vec![raw]);

        let response = ResponseDescriptor::new()
            .with_header("server", "apache")
            .with_body("Hello, World!");
        assert_eq!(
            engine.evaluate("example.org", &response),
            Decision::Transition(StateTransition::Down)
        );
    }

    #[test]
    fn test_all_rule_and_semantics() {
        let mut raw = rule(r"^example\.org$", "all", "down");
        raw.required_status_code = Some(vec![403]);
        raw.required_headers_patterns = header_patterns("server", "gunicorn");
        let engine = engine(vec![raw]);

        let gunicorn = ResponseDescriptor::new()
            .with_status_code(403)
            .with_header("server", "gunicorn");
        assert_eq!(
            engine.evaluate("example.org", &gunicorn),
            Decision::Transition(StateTransition::Down)
        );

        let apache = ResponseDescriptor::new()
            .with_status_code(403)
            .with_header("server", "apache");
        assert_eq!(engine.evaluate("example.org", &apache), Decision::NoMatch);
    }

    #[test]
    fn test_first_match_wins() {
        let mut first = rule("example", "status_code", "up");
        first.required_status_code = Some(vec![503]);
        let mut second = rule(r"^example\.org$", "status_code", "down");
        second.required_status_code = Some(vec![503]);
        let engine = engine(vec![first, second]);

        let response = ResponseDescriptor::new().with_status_code(503);
        assert_eq!(
            engine.evaluate_detailed("example.org", &response),
            Some(RuleMatch {
                index: 0,
                transition: StateTransition::Up
            })
        );
    }

    #[test]
    fn test_subject_gating_skips_criteria() {
        // 第一条规则的条件会命中，但主体不匹配，必须跳过
        let mut other = rule(r"^other\.org$", "body", "up");
        other.required_body_patterns = Some("Hello".into());
        let mut target = rule(r"^example\.org$", "body", "down");
        target.required_body_patterns = Some("Hello".into());
        let engine = engine(vec![other, target]);

        let response = ResponseDescriptor::new().with_body("Hello");
        assert_eq!(
            engine.evaluate_detailed("example.org", &response),
            Some(RuleMatch {
                index: 1,
                transition: StateTransition::Down
            })
        );
        assert_eq!(engine.evaluate("unrelated.net", &response), Decision::NoMatch);
    }

    #[test]
    fn test_criteria_only_checked_for_matching_subjects() {
        let mut other = rule(r"^other\.org$", "status_code", "up");
        other.required_status_code = Some(vec![200]);
        let mut first = rule(r"^example\.org$", "status_code", "down");
        first.required_status_code = Some(vec![404]);
        let mut unrelated = rule(r"^unrelated\.net$", "status_code", "up");
        unrelated.required_status_code = Some(vec![200]);
        let mut last = rule(r"example", "status_code", "up");
        last.required_status_code = Some(vec![200]);
        let engine = engine(vec![other, first, unrelated, last]);

        let mut checked = Vec::new();
        let matched = engine.scan("example.org", |rule| {
            checked.push(rule.index());
            false
        });
        assert_eq!(matched, None);
        assert_eq!(checked, vec![1, 3]);

        checked.clear();
        let matched = engine.scan("nothing.io", |rule| {
            checked.push(rule.index());
            true
        });
        assert_eq!(matched, None);
        assert!(checked.is_empty());
    }

    #[test]
    fn test_failed_criteria_falls_through() {
        let mut first = rule(r"^example\.org$", "status_code", "down");
        first.required_status_code = Some(vec![404]);
        let mut second = rule(r"^example\.org$", "status_code", "up");
        second.required_status_code = Some(vec![200]);
        let engine = engine(vec![first, second]);

        let response = ResponseDescriptor::new().with_status_code(200);
        assert_eq!(
            engine.evaluate("example.org", &response),
            Decision::Transition(StateTransition::Up)
        );
    }

    #[test]
    fn test_absent_response_fields_never_match() {
        let mut raw = rule(".*", "all", "down");
        raw.required_status_code = Some(vec![404]);
        raw.required_body_patterns = Some("gone".into());
        let engine = engine(vec![raw]);

        assert_eq!(engine.evaluate("example.org", &ResponseDescriptor::new()), Decision::NoMatch);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut raw = rule(r"^example\.org$", "status_code", "down");
        raw.required_status_code = Some(vec![404]);
        let engine = engine(vec![raw]);
        let response = ResponseDescriptor::new().with_status_code(404);

        let first = engine.evaluate("example.org", &response);
        let second = engine.evaluate("example.org", &response);
        assert_eq!(first, second);
        assert_eq!(engine.rule_set().len(), 1);
    }

    #[test]
    fn test_disabled_engine_never_matches() {
        let mut raw = rule(".*", "status_code", "down");
        raw.required_status_code = Some(vec![404]);
        let rule_set = RuleCompiler::compile(&[raw]).unwrap();
        let config = ConfigManager::custom().enabled(false).build();
        let engine = RuleEngine::with_config(rule_set, &config);

        let response = ResponseDescriptor::new().with_status_code(404);
        assert!(!engine.is_enabled());
        assert_eq!(engine.evaluate("example.org", &response), Decision::NoMatch);
    }

    #[test]
    fn test_empty_rule_set() {
        let engine = RuleEngine::new(RuleSet::empty());
        let response = ResponseDescriptor::new().with_status_code(404);
        assert_eq!(engine.evaluate("example.org", &response), Decision::NoMatch);
    }

    #[test]
    fn test_concurrent_evaluation() {
        let mut raw = rule(r"\.org$", "status_code", "down");
        raw.required_status_code = Some(vec![404]);
        let engine = engine(vec![raw]);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let engine = &engine;
                    scope.spawn(move || {
                        let status = if i % 2 == 0 { 404 } else { 200 };
                        let response = ResponseDescriptor::new().with_status_code(status);
                        (i, engine.evaluate(&format!("site{}.org", i), &response))
                    })
                })
                .collect();

            for handle in handles {
                let (i, decision) = handle.join().unwrap();
                assert_eq!(decision.is_match(), i % 2 == 0);
            }
        });
    }

    #[test]
    fn test_decision_helpers() {
        let down = Decision::Transition(StateTransition::Down);
        assert_eq!(down.transition(), Some(StateTransition::Down));
        assert_eq!(down.to_string(), "down");
        assert_eq!(Decision::NoMatch.transition(), None);
        assert_eq!(Decision::NoMatch.to_string(), "no match");
    }
}
