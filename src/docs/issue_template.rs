use super::{compile, parse_heading, Heading, LintIssue};
use crate::utils::error::{Result, ScanError};

pub const REQUIRED_KEYS: [&str; 4] = ["name", "about", "title", "labels"];

pub const REQUIRED_HEADINGS: [&str; 5] = [
    "Description du Bug",
    "Steps to Reproduce",
    "Expected Behavior",
    "Actual Behavior",
    "Screenshots/Logs",
];

pub const STEPS_HEADING: &str = "Steps to Reproduce";
pub const EXPECTED_STEPS: usize = 4;

/// GitHub issue 範本：front matter 與本文標題
#[derive(Debug, Clone)]
pub struct IssueTemplate {
    document: String,
    front_matter: Vec<(String, String)>,
    headings: Vec<Heading>,
    body_start: usize,
    lines: Vec<String>,
}

impl IssueTemplate {
    pub fn parse(document: &str, text: &str) -> Result<Self> {
        let doc_error = |message: String| ScanError::DocumentError {
            document: document.to_string(),
            message,
        };

        let lines: Vec<String> = text
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::to_string)
            .collect();

        if lines.first().map(|l| l.trim()) != Some("---") {
            return Err(doc_error("front matter must start with '---' on the first line".to_string()));
        }
        let closing = lines
            .iter()
            .skip(1)
            .position(|l| l.trim() == "---")
            .map(|i| i + 1)
            .ok_or_else(|| doc_error("front matter is not closed with '---'".to_string()))?;

        let mut front_matter = Vec::new();
        for (index, line) in lines[1..closing].iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = trimmed.split_once(':').ok_or_else(|| {
                doc_error(format!("line {}: expected 'key: value', got '{}'", index + 2, trimmed))
            })?;
            front_matter.push((key.trim().to_string(), unquote(value.trim()).to_string()));
        }

        let headings = lines
            .iter()
            .enumerate()
            .skip(closing + 1)
            .filter_map(|(i, line)| parse_heading(line, i + 1))
            .collect();

        Ok(Self {
            document: document.to_string(),
            front_matter,
            headings,
            body_start: closing + 1,
            lines,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.front_matter
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn front_matter(&self) -> &[(String, String)] {
        &self.front_matter
    }

    /// 標題文字去除前置 emoji 與符號
    pub fn heading_names(&self) -> Vec<&str> {
        self.headings.iter().map(|h| normalize_heading(&h.text)).collect()
    }

    /// Steps to Reproduce 區段下的編號步驟數
    pub fn step_count(&self) -> Result<Option<usize>> {
        let Some(heading) = self
            .headings
            .iter()
            .find(|h| normalize_heading(&h.text) == STEPS_HEADING)
        else {
            return Ok(None);
        };

        let numbered = compile(r"^\d+[.)]\s+\S")?;
        let count = self
            .lines
            .iter()
            .skip(heading.line)
            .take_while(|line| parse_heading(line, 0).is_none())
            .filter(|line| numbered.is_match(line.trim_start()))
            .count();
        Ok(Some(count))
    }

    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        for key in REQUIRED_KEYS {
            match self.get(key) {
                None => issues.push(LintIssue::new(
                    &self.document,
                    Some(1),
                    format!("missing front matter key '{}'", key),
                )),
                Some(value) if value.trim().is_empty() => issues.push(LintIssue::new(
                    &self.document,
                    Some(1),
                    format!("front matter key '{}' is empty", key),
                )),
                Some(_) => {}
            }
        }

        let names = self.heading_names();
        for required in REQUIRED_HEADINGS {
            let found: Vec<usize> = names
                .iter()
                .zip(&self.headings)
                .filter(|(name, _)| **name == required)
                .map(|(_, h)| h.line)
                .collect();
            match found.len() {
                0 => issues.push(LintIssue::new(
                    &self.document,
                    None,
                    format!("missing section '{}'", required),
                )),
                1 => {}
                _ => issues.push(LintIssue::new(
                    &self.document,
                    found.get(1).copied(),
                    format!("section '{}' appears {} times", required, found.len()),
                )),
            }
        }

        match self.step_count() {
            Ok(Some(count)) if count != EXPECTED_STEPS => issues.push(LintIssue::new(
                &self.document,
                None,
                format!(
                    "'{}' should list {} numbered steps, found {}",
                    STEPS_HEADING, EXPECTED_STEPS, count
                ),
            )),
            Ok(_) => {}
            Err(e) => issues.push(LintIssue::new(&self.document, None, e.to_string())),
        }

        if self.body_start >= self.lines.len() {
            issues.push(LintIssue::new(&self.document, None, "template body is empty"));
        }

        issues
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn normalize_heading(text: &str) -> &str {
    text.trim_start_matches(|c: char| !c.is_alphanumeric()).trim()
}
