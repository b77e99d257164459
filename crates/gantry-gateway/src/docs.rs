//! Description parsing for route and method doc text.
//!
//! Doc text is free-form. A line such as ``* `minPrice` - The minimal price.``
//! (a `-` or `:` separator, `*` or `-` bullet) starts the description of the
//! named parameter; following lines continue it. Markdown headings are skipped.
//! Everything before the first parameter line is the summary.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn parameter_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^[*-]\s+`(?P<name>[^`]+)`\s*(?:[-:]\s*)?(?P<text>.*)$")
            .expect("parameter line pattern is valid")
    })
}

/// Summary and per-parameter descriptions extracted from doc text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptions {
    summary: String,
    parameters: HashMap<String, String>,
}

impl Descriptions {
    pub fn parse(doc: &str) -> Self {
        let mut descriptions = Descriptions::default();
        let mut current: Option<String> = None;

        for line in doc.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let content = match parameter_line().captures(line) {
                Some(captures) => {
                    let name = captures["name"].trim().to_string();
                    descriptions.parameters.entry(name.clone()).or_default();
                    current = Some(name);
                    captures["text"].trim().to_string()
                }
                None => line.to_string(),
            };

            let target = match &current {
                Some(name) => descriptions.parameters.entry(name.clone()).or_default(),
                None => &mut descriptions.summary,
            };
            append(target, &content);
        }

        descriptions
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Description of `name`, empty when undocumented
    pub fn parameter(&self, name: &str) -> &str {
        self.parameters.get(name).map(String::as_str).unwrap_or("")
    }
}

fn append(target: &mut String, content: &str) {
    if content.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(content);
}
