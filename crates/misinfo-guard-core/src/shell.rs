use std::{fmt, path::Path, path::PathBuf, str::FromStr};

use serde::Serialize;
use tracing::debug;

use crate::assessment::{Lang, ReturnLevel};
use crate::controller::{Completion, Submission, SubmissionController, SubmissionState, Transition};
use crate::error::ErrorInfo;
use crate::quiz::{Feedback, QuizEngine, QuizOption, QuizView};
use crate::report::{RenderedReport, ReportDocument, ReportView, Viewport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Results,
    TeachMe,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tab::Results => "results",
            Tab::TeachMe => "teach-me",
        })
    }
}

impl FromStr for Tab {
    type Err = ErrorInfo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "results" | "result" => Ok(Tab::Results),
            "teach-me" | "teach_me" | "teachme" | "teach" => Ok(Tab::TeachMe),
            other => Err(ErrorInfo::validation(format!(
                "unknown tab `{other}` (expected results or teach-me)"
            ))),
        }
    }
}

/// Input-side status shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub loading: bool,
    /// Inline error for a failed check or rejected input.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<'a> {
    /// `None` until a check has succeeded.
    Results(Option<ReportDocument>),
    TeachMe(QuizView<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView<'a> {
    pub active_tab: Tab,
    pub form: FormView,
    pub panel: Panel<'a>,
}

/// Composes the submission controller with the tabbed result views.
#[derive(Debug)]
pub struct PresentationShell {
    lang: Lang,
    active_tab: Tab,
    controller: SubmissionController,
    report: ReportView,
    quiz: QuizEngine,
}

impl Default for PresentationShell {
    fn default() -> Self {
        Self::new(Lang::default())
    }
}

impl PresentationShell {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            active_tab: Tab::Results,
            controller: SubmissionController::new(),
            report: ReportView::new(lang),
            quiz: QuizEngine::new(lang),
        }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    /// Switch labels and the `lang` sent with the next submission.
    pub fn set_lang(&mut self, lang: Lang) {
        self.lang = lang;
        self.report.set_lang(lang);
        self.quiz.set_lang(lang);
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn state(&self) -> &SubmissionState {
        self.controller.current_state()
    }

    pub fn return_level(&self) -> Option<ReturnLevel> {
        self.controller.return_level()
    }

    pub fn set_return_level(&mut self, level: Option<ReturnLevel>) {
        self.controller.set_return_level(level);
    }

    pub fn submit(&mut self, text: &str) -> Result<Submission, ErrorInfo> {
        self.controller.submit(text, self.lang)
    }

    /// Feed a dispatched result back in. A fresh success brings the Results
    /// tab forward and invalidates the previous quiz attempt.
    pub fn complete(&mut self, completion: Completion) -> Transition {
        let transition = self.controller.complete(completion);
        if transition == Transition::Succeeded {
            debug!("new assessment; showing results");
            self.active_tab = Tab::Results;
            self.quiz.reset();
        }
        transition
    }

    pub fn select_answer(&mut self, option: QuizOption) {
        self.quiz.select(option);
    }

    pub fn submit_quiz(&mut self) -> Feedback {
        self.quiz.submit()
    }

    pub fn report(&self) -> Option<ReportDocument> {
        self.state()
            .assessment()
            .map(|assessment| self.report.render(assessment))
    }

    pub fn rendered_report(&self, viewport: Viewport) -> Option<RenderedReport> {
        self.report()
            .map(|document| self.report.layout(&document, viewport))
    }

    /// Export the current report. Leaves every other piece of state alone.
    pub fn export_report(&self, dir: &Path, viewport: Viewport) -> Result<PathBuf, ErrorInfo> {
        let rendered = self
            .rendered_report(viewport)
            .ok_or_else(|| ErrorInfo::export("no report to export yet"))?;
        self.report.export_to_file(&rendered, dir)
    }

    pub fn view(&self) -> ShellView<'_> {
        let strings = self.lang.strings();
        let state = self.state();
        let error = match (state, self.controller.validation_error()) {
            (_, Some(invalid)) => Some(invalid.message.clone()),
            (SubmissionState::Failed(err), None) => {
                Some(format!("{}: {}", strings.error_prefix, err.message))
            }
            _ => None,
        };
        let form = FormView {
            loading: state.is_loading(),
            error,
        };
        let panel = match self.active_tab {
            Tab::Results => Panel::Results(self.report()),
            Tab::TeachMe => {
                let lesson = state.assessment().and_then(|assessment| assessment.lesson());
                Panel::TeachMe(self.quiz.view(lesson))
            }
        };
        ShellView {
            active_tab: self.active_tab,
            form,
            panel,
        }
    }
}
