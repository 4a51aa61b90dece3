use std::fmt::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::assessment::{Lang, RiskAssessment, Stance};
use crate::error::ErrorInfo;

pub mod export;

pub use export::{capture, export_to_file, EXPORT_FILENAME};

/// Column width used for terminal output.
pub const REPORT_WIDTH: usize = 78;

/// Format styles supported by [`render_report`].
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// One evidence row: label per the title-or-source rule, link and stance tag,
/// optionally followed by the quoted snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceEntry {
    pub label: String,
    pub url: String,
    pub stance: Stance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl EvidenceEntry {
    pub fn line(&self) -> String {
        format!("- {} <{}> ({})", self.label, self.url, self.stance)
    }

    /// Snippet collapsed onto one line, indented under its entry.
    pub fn snippet_line(&self) -> Option<String> {
        let snippet = self.snippet.as_deref()?;
        let words: Vec<&str> = snippet.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        Some(format!("    \"{}\"", words.join(" ")))
    }
}

/// Display-ready report for a successful assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub lang: Lang,
    pub score: u8,
    pub high_risk: bool,
    pub score_line: String,
    pub rationales: Vec<String>,
    pub explanation_md: String,
    pub evidence_heading: String,
    pub evidence: Vec<EvidenceEntry>,
    pub lesson_md: Option<String>,
}

impl ReportDocument {
    /// Lay the report out as plain lines no wider than `width` characters.
    pub fn lines(&self, width: usize) -> Vec<String> {
        let width = width.max(1);
        let mut out = Vec::new();
        out.extend(wrap(&self.score_line, width));
        for rationale in &self.rationales {
            out.extend(wrap(&format!("  * {rationale}"), width));
        }
        out.push(String::new());
        for line in markdown_to_plain(&self.explanation_md) {
            out.extend(wrap(&line, width));
        }
        out.push(String::new());
        out.extend(wrap(&format!("{}:", self.evidence_heading), width));
        for entry in &self.evidence {
            out.extend(wrap(&entry.line(), width));
            if let Some(snippet) = entry.snippet_line() {
                out.extend(wrap(&snippet, width));
            }
        }
        if let Some(lesson) = &self.lesson_md {
            out.push(String::new());
            for line in markdown_to_plain(lesson) {
                out.extend(wrap(&line, width));
            }
        }
        out
    }
}

/// Visible region of a laid-out report, in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub columns: usize,
    pub rows: usize,
    /// First laid-out line shown at the top of the viewport.
    pub scroll: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            columns: 72,
            rows: 48,
            scroll: 0,
        }
    }
}

/// A report as it currently appears inside a viewport. Lines scrolled out of
/// view are not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub viewport: Viewport,
    pub visible: Vec<String>,
    pub total_lines: usize,
}

impl RenderedReport {
    pub fn is_truncated(&self) -> bool {
        self.viewport.scroll > 0 || self.viewport.scroll + self.visible.len() < self.total_lines
    }
}

/// Renders assessments and exports what is on screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportView {
    lang: Lang,
}

impl ReportView {
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    pub fn set_lang(&mut self, lang: Lang) {
        self.lang = lang;
    }

    pub fn render(&self, assessment: &RiskAssessment) -> ReportDocument {
        let strings = self.lang.strings();
        let score = assessment.risk.score;
        let high_risk = assessment.risk.is_high();
        let mut score_line = format!("{}: {}/100", strings.risk_score, score);
        if high_risk {
            score_line.push_str(&format!(" ({})", strings.high_risk));
        }

        ReportDocument {
            lang: self.lang,
            score,
            high_risk,
            score_line,
            rationales: assessment.risk.rationales.clone(),
            explanation_md: assessment.explanation_md.clone(),
            evidence_heading: strings.evidence.to_string(),
            evidence: assessment
                .evidence
                .iter()
                .map(|item| EvidenceEntry {
                    label: item.display_label().to_string(),
                    url: item.url.clone(),
                    stance: item.stance,
                    snippet: item.snippet.clone(),
                })
                .collect(),
            lesson_md: assessment.lesson().map(str::to_string),
        }
    }

    pub fn layout(&self, document: &ReportDocument, viewport: Viewport) -> RenderedReport {
        let lines = document.lines(viewport.columns);
        let total_lines = lines.len();
        let visible = lines
            .into_iter()
            .skip(viewport.scroll)
            .take(viewport.rows)
            .collect();
        RenderedReport {
            viewport,
            visible,
            total_lines,
        }
    }

    /// Write the captured viewport to `dir/misinfo-report.pdf`.
    pub fn export_to_file(
        &self,
        rendered: &RenderedReport,
        dir: &Path,
    ) -> Result<PathBuf, ErrorInfo> {
        export_to_file(rendered, dir)
    }
}

/// Produce a report string from a `ReportDocument` using the desired format.
pub fn render_report(document: &ReportDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => {
            let mut out = String::new();
            for line in document.lines(REPORT_WIDTH) {
                writeln!(out, "{line}")?;
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
    }
}

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}#{1,6}\s+").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|__|`").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)[*+]\s+").unwrap());

/// Flatten markdown into display lines: headings and emphasis markers are
/// dropped, links become `text (url)`, bullets become `- `.
pub fn markdown_to_plain(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .map(|line| {
            let line = HEADING.replace(line, "");
            let line = BULLET.replace(&line, "$1- ");
            let line = LINK.replace_all(&line, "$1 ($2)");
            EMPHASIS.replace_all(&line, "").trim_end().to_string()
        })
        .collect()
}

/// Greedy word wrap. Leading indentation is kept on the first line; later
/// lines hang under the text, past any `- ` or `* ` bullet marker.
fn wrap(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let body = line.trim_start();
    let mut lead = line.chars().count() - body.chars().count();
    let mut hang = lead;
    if body.starts_with("- ") || body.starts_with("* ") {
        hang += 2;
    }
    if hang >= width {
        lead = 0;
        hang = 0;
    }

    let mut out = Vec::new();
    let mut start = lead;
    let mut current = " ".repeat(lead);
    let mut current_len = lead;
    for word in body.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        if current_len > start && current_len + 1 + word.len() > width {
            out.push(std::mem::replace(&mut current, " ".repeat(hang)));
            start = hang;
            current_len = hang;
        }
        while current_len + word.len() > width {
            let rest = word.split_off(width - current_len);
            current.extend(word.iter());
            out.push(std::mem::replace(&mut current, " ".repeat(hang)));
            start = hang;
            current_len = hang;
            word = rest;
        }
        if current_len > start {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > start {
        out.push(current);
    }
    out
}
