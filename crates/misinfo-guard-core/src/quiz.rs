use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::assessment::Lang;
use crate::error::ErrorInfo;

/// One of the two fixed answers. `First` is the correct one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuizOption {
    First,
    Second,
}

impl QuizOption {
    pub const CORRECT: QuizOption = QuizOption::First;

    pub fn number(self) -> u8 {
        match self {
            QuizOption::First => 1,
            QuizOption::Second => 2,
        }
    }
}

impl fmt::Display for QuizOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for QuizOption {
    type Err = ErrorInfo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(QuizOption::First),
            "2" => Ok(QuizOption::Second),
            other => Err(ErrorInfo::validation(format!(
                "quiz answer must be 1 or 2 (got `{other}`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub correct: bool,
    pub message: String,
}

/// Read-only snapshot of the quiz for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizView<'a> {
    pub lesson_md: Option<&'a str>,
    pub question: &'static str,
    pub options: [(QuizOption, &'static str); 2],
    pub selected: Option<QuizOption>,
    pub feedback: Option<&'a Feedback>,
}

/// Single-question comprehension check. Holds only the current selection and
/// the feedback from the most recent evaluation.
#[derive(Debug, Default)]
pub struct QuizEngine {
    lang: Lang,
    selected: Option<QuizOption>,
    feedback: Option<Feedback>,
}

impl QuizEngine {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            selected: None,
            feedback: None,
        }
    }

    pub fn set_lang(&mut self, lang: Lang) {
        self.lang = lang;
    }

    pub fn select(&mut self, option: QuizOption) {
        self.selected = Some(option);
    }

    pub fn selected(&self) -> Option<QuizOption> {
        self.selected
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Score an answer without consulting any earlier attempt.
    pub fn evaluate(&self, option: QuizOption) -> Feedback {
        let strings = self.lang.strings();
        let correct = option == QuizOption::CORRECT;
        Feedback {
            correct,
            message: if correct {
                strings.quiz_correct
            } else {
                strings.quiz_incorrect
            }
            .to_string(),
        }
    }

    /// Evaluate the current selection; no selection counts as a wrong answer.
    pub fn submit(&mut self) -> Feedback {
        let feedback = match self.selected {
            Some(option) => self.evaluate(option),
            None => Feedback {
                correct: false,
                message: self.lang.strings().quiz_incorrect.to_string(),
            },
        };
        self.feedback = Some(feedback.clone());
        feedback
    }

    /// Forget the selection and feedback; called when a new lesson arrives.
    pub fn reset(&mut self) {
        self.selected = None;
        self.feedback = None;
    }

    pub fn view<'a>(&'a self, lesson_md: Option<&'a str>) -> QuizView<'a> {
        let strings = self.lang.strings();
        QuizView {
            lesson_md,
            question: strings.quiz_question,
            options: [
                (QuizOption::First, strings.quiz_option_1),
                (QuizOption::Second, strings.quiz_option_2),
            ],
            selected: self.selected,
            feedback: self.feedback.as_ref(),
        }
    }
}
