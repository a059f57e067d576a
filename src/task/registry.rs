use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::task::{TaskKind, TaskSpec};

/// How a command string selects its task.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// The first whitespace-delimited token must be a keyword
    #[default]
    LeadingToken,
    /// The first keyword found anywhere in the command wins, in registry order
    Substring,
}

impl Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::LeadingToken => write!(f, "leading-token"),
            MatchPolicy::Substring => write!(f, "substring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub kind: TaskKind,
    pub spec: &'static TaskSpec,

    /// The command with its keyword replaced by the task's command phrase, trimmed
    pub remainder: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRegistry {
    policy: MatchPolicy,
}

impl TaskRegistry {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn specs(&self) -> impl Iterator<Item = &'static TaskSpec> {
        TaskKind::ALL.into_iter().map(TaskKind::spec)
    }

    /// Returns `None` when no keyword selects a task.
    pub fn resolve(&self, command: &str) -> Option<Resolution> {
        let spec = match self.policy {
            MatchPolicy::LeadingToken => {
                let leading = command.split_whitespace().next()?;
                self.specs().find(|spec| spec.keyword == leading)?
            }
            MatchPolicy::Substring => self.specs().find(|spec| command.contains(spec.keyword))?,
        };

        let remainder = command
            .replacen(spec.keyword, spec.command_phrase, 1)
            .trim()
            .to_string();

        Some(Resolution {
            kind: spec.kind,
            spec,
            remainder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_keyword() {
        let registry = TaskRegistry::default();
        for kind in TaskKind::ALL {
            let command = format!("{} 안녕하세요", kind.keyword());
            let resolution = registry.resolve(&command).unwrap();
            assert_eq!(resolution.kind, kind);
            assert_eq!(resolution.spec, kind.spec());
            assert_eq!(
                resolution.remainder,
                format!("{} 안녕하세요", kind.spec().command_phrase)
            );
        }
    }

    #[test]
    fn missing_keyword_is_not_found() {
        for policy in [MatchPolicy::LeadingToken, MatchPolicy::Substring] {
            let registry = TaskRegistry::new(policy);
            assert_eq!(registry.resolve("translate this please"), None);
            assert_eq!(registry.resolve(""), None);
            assert_eq!(registry.resolve("   "), None);
        }
    }

    #[test]
    fn leading_token_requires_exact_first_token() {
        let registry = TaskRegistry::new(MatchPolicy::LeadingToken);
        assert_eq!(registry.resolve("please t-to-en 안녕"), None);
        assert_eq!(registry.resolve("t-to-english 안녕"), None);
        let resolution = registry.resolve("  t-to-en\n안녕").unwrap();
        assert_eq!(resolution.kind, TaskKind::TranslateToEnglish);
    }

    #[test]
    fn substring_policy_uses_registry_order() {
        let registry = TaskRegistry::new(MatchPolicy::Substring);
        // t-to-ko is declared before t-to-en, so it wins regardless of position
        let resolution = registry.resolve("t-to-en then t-to-ko hello").unwrap();
        assert_eq!(resolution.kind, TaskKind::TranslateToKorean);
        assert_eq!(
            resolution.remainder,
            format!("t-to-en then {} hello", TaskKind::TranslateToKorean.spec().command_phrase)
        );

        let resolution = registry.resolve("please g-check this").unwrap();
        assert_eq!(resolution.kind, TaskKind::GrammarCheck);
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let registry = TaskRegistry::new(MatchPolicy::LeadingToken);
        let resolution = registry.resolve("g-check g-check").unwrap();
        assert_eq!(
            resolution.remainder,
            format!("{} g-check", TaskKind::GrammarCheck.spec().command_phrase)
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let registry = TaskRegistry::default();
        let first = registry.resolve("t-to-ko Good morning");
        let second = registry.resolve("t-to-ko Good morning");
        assert_eq!(first, second);
    }

    #[test]
    fn command_phrases_do_not_resolve() {
        for policy in [MatchPolicy::LeadingToken, MatchPolicy::Substring] {
            let registry = TaskRegistry::new(policy);
            for spec in registry.specs() {
                assert_eq!(registry.resolve(spec.command_phrase), None);
            }
        }
    }

    #[test]
    fn policy_parses_from_kebab_case() {
        assert_eq!(
            MatchPolicy::from_str("substring", false).unwrap(),
            MatchPolicy::Substring
        );
        assert_eq!(
            MatchPolicy::from_str("leading-token", false).unwrap(),
            MatchPolicy::LeadingToken
        );
        assert!(MatchPolicy::from_str("longest", false).is_err());
        assert_eq!(MatchPolicy::Substring.to_string(), "substring");
    }
}
