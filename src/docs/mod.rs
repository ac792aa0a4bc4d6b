//! Structure checks for the repository's issue template and changelog.

pub mod changelog;
pub mod issue_template;

use crate::utils::error::{Result, ScanError};
use regex::Regex;
use std::fmt;
use std::path::Path;

pub use changelog::Changelog;
pub use issue_template::IssueTemplate;

/// 文件結構問題，行號從 1 開始
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub document: String,
    pub line: Option<usize>,
    pub message: String,
}

impl LintIssue {
    pub fn new(document: &str, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            document: document.to_string(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.document, line, self.message),
            None => write!(f, "{}: {}", self.document, self.message),
        }
    }
}

/// Markdown 標題（# 到 ######）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub line: usize,
}

pub(crate) fn parse_heading(line: &str, line_no: usize) -> Option<Heading> {
    let trimmed = line.trim_end();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some(Heading {
        level,
        text: rest.trim().to_string(),
        line: line_no,
    })
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ScanError::ProcessingError {
        message: format!("invalid pattern {}: {}", pattern, e),
    })
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ScanError::DocumentError {
        document: path.display().to_string(),
        message: e.to_string(),
    })
}

/// 讀取並檢查兩份文件，回傳所有問題
pub fn lint_files(template: &Path, changelog: &Path) -> Result<Vec<LintIssue>> {
    let template_name = template.display().to_string();
    let changelog_name = changelog.display().to_string();

    let mut issues = IssueTemplate::parse(&template_name, &read_document(template)?)?.lint();
    issues.extend(Changelog::parse(&changelog_name, &read_document(changelog)?)?.lint());
    Ok(issues)
}
