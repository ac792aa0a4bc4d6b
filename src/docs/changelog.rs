use super::{compile, parse_heading, LintIssue};
use crate::utils::error::{Result, ScanError};
use chrono::NaiveDate;
use std::collections::HashSet;

pub const CATEGORIES: [&str; 8] = [
    "Added",
    "Changed",
    "Deprecated",
    "Removed",
    "Fixed",
    "Security",
    "Features",
    "Technical Details",
];

pub const UNRELEASED: &str = "Unreleased";

/// `### Added` 之類的分類區段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub line: usize,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    Unreleased,
    Version {
        version: (u64, u64, u64),
        date: Option<NaiveDate>,
    },
    /// 標題格式不符
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub header: String,
    pub line: usize,
    pub release: Release,
    pub sections: Vec<Section>,
}

impl VersionEntry {
    pub fn version_string(&self) -> Option<String> {
        match self.release {
            Release::Version {
                version: (major, minor, patch),
                ..
            } => Some(format!("{}.{}.{}", major, minor, patch)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Changelog {
    document: String,
    title: Option<String>,
    entries: Vec<VersionEntry>,
    orphan_sections: Vec<Section>,
}

impl Changelog {
    pub fn parse(document: &str, text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(ScanError::DocumentError {
                document: document.to_string(),
                message: "changelog is empty".to_string(),
            });
        }

        let header_re = compile(r"^\[(\d+)\.(\d+)\.(\d+)\]\s+-\s+(\d{4}-\d{2}-\d{2})$")?;
        let unreleased_re = compile(r"(?i)^\[unreleased\]$")?;

        let mut title = None;
        let mut entries: Vec<VersionEntry> = Vec::new();
        let mut orphan_sections = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            match parse_heading(line, line_no) {
                Some(heading) if heading.level == 1 => {
                    title.get_or_insert(heading.text);
                }
                Some(heading) if heading.level == 2 => {
                    let release = parse_release(&heading.text, &header_re, &unreleased_re);
                    entries.push(VersionEntry {
                        header: heading.text,
                        line: line_no,
                        release,
                        sections: Vec::new(),
                    });
                }
                Some(heading) if heading.level == 3 => {
                    let section = Section {
                        name: heading
                            .text
                            .trim_start_matches(|c: char| !c.is_alphanumeric())
                            .trim()
                            .to_string(),
                        line: line_no,
                        items: 0,
                    };
                    match entries.last_mut() {
                        Some(entry) => entry.sections.push(section),
                        None => orphan_sections.push(section),
                    }
                }
                Some(_) => {}
                None => {
                    let trimmed = line.trim_start();
                    if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
                        let current = entries
                            .last_mut()
                            .and_then(|entry| entry.sections.last_mut())
                            .or_else(|| orphan_sections.last_mut());
                        if let Some(section) = current {
                            section.items += 1;
                        }
                    }
                }
            }
        }

        Ok(Self {
            document: document.to_string(),
            title,
            entries,
            orphan_sections,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    /// 最新的已發佈版本
    pub fn latest_version(&self) -> Option<String> {
        self.entries.iter().find_map(VersionEntry::version_string)
    }

    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let issue = |line: usize, message: String| LintIssue::new(&self.document, Some(line), message);

        if self.title.is_none() {
            issues.push(LintIssue::new(&self.document, None, "missing '# Changelog' title"));
        }
        if self.entries.is_empty() {
            issues.push(LintIssue::new(&self.document, None, "no version entries"));
        }

        for section in &self.orphan_sections {
            issues.push(issue(
                section.line,
                format!("section '{}' is not under a version header", section.name),
            ));
        }

        let mut seen = HashSet::new();
        let mut previous: Option<(&VersionEntry, (u64, u64, u64), Option<NaiveDate>)> = None;

        for (index, entry) in self.entries.iter().enumerate() {
            match &entry.release {
                Release::Invalid => issues.push(issue(
                    entry.line,
                    format!(
                        "version header '{}' must look like '[x.y.z] - YYYY-MM-DD' or '[{}]'",
                        entry.header, UNRELEASED
                    ),
                )),
                Release::Unreleased => {
                    if !seen.insert(UNRELEASED.to_string()) {
                        issues.push(issue(entry.line, format!("'{}' appears more than once", UNRELEASED)));
                    } else if index > 0 {
                        issues.push(issue(
                            entry.line,
                            format!("'{}' must be the first entry", UNRELEASED),
                        ));
                    }
                }
                Release::Version { version, date } => {
                    let name = entry.version_string().unwrap_or_default();
                    if date.is_none() {
                        issues.push(issue(
                            entry.line,
                            format!("version {} has an invalid release date", name),
                        ));
                    }
                    if !seen.insert(name.clone()) {
                        issues.push(issue(entry.line, format!("version {} appears more than once", name)));
                    } else if let Some((prev, prev_version, prev_date)) = previous {
                        if *version >= prev_version {
                            issues.push(issue(
                                entry.line,
                                format!(
                                    "version {} is listed after {}; newest versions come first",
                                    name,
                                    prev.version_string().unwrap_or_default()
                                ),
                            ));
                        } else if let (Some(date), Some(prev_date)) = (date, prev_date) {
                            if *date > prev_date {
                                issues.push(issue(
                                    entry.line,
                                    format!("version {} is dated after the newer {}", name, prev_date),
                                ));
                            }
                        }
                    }
                    previous = Some((entry, *version, *date));
                }
            }

            for section in &entry.sections {
                if !CATEGORIES.contains(&section.name.as_str()) {
                    issues.push(issue(
                        section.line,
                        format!("unknown section '{}'", section.name),
                    ));
                }
            }
        }

        issues
    }
}

fn parse_release(text: &str, header_re: &regex::Regex, unreleased_re: &regex::Regex) -> Release {
    if unreleased_re.is_match(text) {
        return Release::Unreleased;
    }
    let Some(caps) = header_re.captures(text) else {
        return Release::Invalid;
    };

    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    match (part(1), part(2), part(3)) {
        (Some(major), Some(minor), Some(patch)) => Release::Version {
            version: (major, minor, patch),
            date: caps
                .get(4)
                .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()),
        },
        _ => Release::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "# Changelog

## [Unreleased]

### Changed
- Tweak output

## [1.1.0] - 2026-03-02

### ✨ Features
- Continuous mode

### Fixed
- KuCoin symbol mapping

## [1.0.0] - 2026-02-14

### Added
- Initial scanner
- Five exchanges

### Technical Details
- Rate limiting between requests
";

    fn messages(text: &str) -> Vec<String> {
        Changelog::parse("CHANGELOG.md", text)
            .unwrap()
            .lint()
            .into_iter()
            .map(|i| i.message)
            .collect()
    }

    #[test]
    fn test_parse_entries_and_sections() {
        let changelog = Changelog::parse("CHANGELOG.md", CHANGELOG).unwrap();

        assert_eq!(changelog.title(), Some("Changelog"));
        assert_eq!(changelog.entries().len(), 3);
        assert_eq!(changelog.entries()[0].release, Release::Unreleased);
        assert_eq!(changelog.latest_version(), Some("1.1.0".to_string()));

        let first_release = &changelog.entries()[1];
        assert_eq!(first_release.sections[0].name, "Features");
        assert_eq!(first_release.sections[0].items, 1);
        assert_eq!(changelog.entries()[2].sections[0].items, 2);
        assert!(changelog.lint().is_empty());
    }

    #[test]
    fn test_bad_header_and_date() {
        let text = CHANGELOG
            .replace("## [1.1.0] - 2026-03-02", "## 1.1.0 (March)")
            .replace("2026-02-14", "2026-02-30");

        assert_eq!(
            messages(&text),
            vec![
                "version header '1.1.0 (March)' must look like '[x.y.z] - YYYY-MM-DD' or '[Unreleased]'"
                    .to_string(),
                "version 1.0.0 has an invalid release date".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_and_orphan_sections() {
        let text = format!("# Changelog\n\n### Added\n- too early\n{}", &CHANGELOG[12..])
            .replace("### Fixed", "### Misc");

        let found = messages(&text);
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("'Added' is not under a version header"));
        assert!(found[1].contains("unknown section 'Misc'"));
    }

    #[test]
    fn test_order_and_duplicates() {
        let swapped = "# Changelog\n\n## [1.0.0] - 2026-02-14\n### Added\n- a\n\n## [1.1.0] - 2026-03-02\n### Fixed\n- b\n";
        let found = messages(swapped);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("newest versions come first"));

        let duplicated = "# Changelog\n\n## [1.0.0] - 2026-02-14\n### Added\n- a\n\n## [1.0.0] - 2026-02-14\n### Added\n- a\n";
        let found = messages(duplicated);
        assert_eq!(found, vec!["version 1.0.0 appears more than once".to_string()]);

        let late_unreleased = "# Changelog\n\n## [1.0.0] - 2026-02-14\n### Added\n- a\n\n## [Unreleased]\n";
        let found = messages(late_unreleased);
        assert_eq!(found, vec!["'Unreleased' must be the first entry".to_string()]);
    }

    #[test]
    fn test_date_must_not_increase() {
        let text = "# Changelog\n\n## [1.1.0] - 2026-01-01\n### Fixed\n- a\n\n## [1.0.0] - 2026-02-01\n### Added\n- b\n";
        let found = messages(text);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("dated after"));
    }

    #[test]
    fn test_empty_changelog_is_an_error() {
        assert!(Changelog::parse("CHANGELOG.md", "  \n").is_err());
    }
}
