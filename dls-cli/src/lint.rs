// Lint rules for batch analysis
//
// The lint pass is a consumer of the analysis core, not part of it: its
// findings are warnings and infos that merge into the report but never
// into a file's analysis error list. Rules are text-based and configured
// from a JSON file naming enabled/disabled rules and per-rule settings.

use dls_core::diagnostic::Severity;
use dls_core::source::{Position, ZeroRange, ZeroSpan};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Lint configuration file:
/// `{ "disabled_rules": [...], "rule_configs": { "long-lines": { "max_length": 120 } } }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LintConfig {
    #[serde(default)]
    pub enabled_rules: Vec<String>,
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub rule_configs: HashMap<String, RuleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    pub max_length: Option<usize>,
    pub indent_width: Option<usize>,
    pub enabled: Option<bool>,
}

/// One lint finding; never error severity
#[derive(Debug, Clone, Serialize)]
pub struct LintFinding {
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
    pub span: ZeroSpan,
}

const TRAILING_WHITESPACE: &str = "trailing-whitespace";
const LONG_LINES: &str = "long-lines";
const INDENTATION: &str = "indentation";

/// Applies the rule set to file contents
pub struct LintEngine {
    config: LintConfig,
    max_line_length: usize,
    indent_width: usize,
}

impl LintEngine {
    pub fn new(config: LintConfig) -> Self {
        let max_line_length = config
            .rule_configs
            .get(LONG_LINES)
            .and_then(|rule| rule.max_length)
            .unwrap_or(100);
        let indent_width = config
            .rule_configs
            .get(INDENTATION)
            .and_then(|rule| rule.indent_width)
            .unwrap_or(4);
        Self {
            config,
            max_line_length,
            indent_width,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: LintConfig = serde_json::from_str(&text)?;
        Ok(Self::new(config))
    }

    fn rule_enabled(&self, name: &str) -> bool {
        if let Some(rule) = self.config.rule_configs.get(name) {
            if let Some(enabled) = rule.enabled {
                return enabled;
            }
        }
        if self.config.disabled_rules.iter().any(|r| r == name) {
            return false;
        }
        // an explicit enabled list restricts the set
        if !self.config.enabled_rules.is_empty() {
            return self.config.enabled_rules.iter().any(|r| r == name);
        }
        true
    }

    /// Run every enabled rule over one file's text
    pub fn lint_file(&self, file: &Path, content: &str) -> Vec<LintFinding> {
        let mut findings = Vec::new();
        for (line_index, line) in content.lines().enumerate() {
            let line_number = line_index as u32;
            if self.rule_enabled(TRAILING_WHITESPACE) {
                let trimmed = line.trim_end();
                if trimmed.len() != line.len() {
                    findings.push(LintFinding {
                        rule: TRAILING_WHITESPACE,
                        severity: Severity::Info,
                        message: "trailing whitespace".to_string(),
                        span: line_span(file, line_number, trimmed.len(), line.len()),
                    });
                }
            }
            if self.rule_enabled(LONG_LINES) && line.chars().count() > self.max_line_length {
                findings.push(LintFinding {
                    rule: LONG_LINES,
                    severity: Severity::Warning,
                    message: format!("line exceeds {} characters", self.max_line_length),
                    span: line_span(file, line_number, 0, line.len()),
                });
            }
            if self.rule_enabled(INDENTATION) {
                let indent = line.len() - line.trim_start_matches(' ').len();
                if !line.trim().is_empty()
                    && !line.starts_with('\t')
                    && indent % self.indent_width != 0
                {
                    findings.push(LintFinding {
                        rule: INDENTATION,
                        severity: Severity::Warning,
                        message: format!(
                            "indentation is not a multiple of {}",
                            self.indent_width
                        ),
                        span: line_span(file, line_number, 0, indent),
                    });
                }
            }
        }
        findings
    }
}

fn line_span(file: &Path, line: u32, start_col: usize, end_col: usize) -> ZeroSpan {
    ZeroSpan::in_file(
        file,
        ZeroRange::new(
            Position::new(line, start_col as u32),
            Position::new(line, end_col as u32),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_whitespace_and_long_lines() {
        let engine = LintEngine::new(LintConfig::default());
        let content = format!("device d;   \n{}\n", "x".repeat(120));
        let findings = engine.lint_file(Path::new("a.dml"), &content);
        assert!(findings.iter().any(|d| d.rule == TRAILING_WHITESPACE));
        assert!(findings
            .iter()
            .any(|d| d.message.contains("exceeds 100 characters")));
    }

    #[test]
    fn test_disabled_rule() {
        let config = LintConfig {
            disabled_rules: vec![TRAILING_WHITESPACE.to_string()],
            ..Default::default()
        };
        let engine = LintEngine::new(config);
        let findings = engine.lint_file(Path::new("a.dml"), "device d;   \n");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_configured_line_length() {
        let mut rule_configs = HashMap::new();
        rule_configs.insert(
            LONG_LINES.to_string(),
            RuleConfig {
                max_length: Some(10),
                ..Default::default()
            },
        );
        let config = LintConfig {
            rule_configs,
            ..Default::default()
        };
        let engine = LintEngine::new(config);
        let findings = engine.lint_file(Path::new("a.dml"), "device long_name;\n");
        assert!(findings.iter().any(|d| d.message.contains("exceeds 10")));
    }

    #[test]
    fn test_indentation_rule() {
        let engine = LintEngine::new(LintConfig::default());
        let findings = engine.lint_file(Path::new("a.dml"), "bank b {\n   register r;\n}\n");
        assert!(findings.iter().any(|d| d.rule == INDENTATION));
    }

    #[test]
    fn test_lint_findings_are_never_errors() {
        let engine = LintEngine::new(LintConfig::default());
        let findings = engine.lint_file(Path::new("a.dml"), "device d;    \n");
        assert!(findings.iter().all(|d| d.severity != Severity::Error));
    }
}
