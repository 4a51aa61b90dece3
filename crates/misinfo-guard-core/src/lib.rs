pub mod assessment;
pub mod client;
pub mod controller;
pub mod error;
pub mod i18n;
pub mod quiz;
pub mod report;
pub mod shell;

pub use assessment::{
    CheckRequest, EvidenceItem, Lang, ReturnLevel, RiskAssessment, RiskScore, Stance,
    HIGH_RISK_THRESHOLD,
};
pub use client::{ClientSettings, HttpRequestClient, RequestClient};
pub use controller::{
    dispatch, Completion, Submission, SubmissionController, SubmissionState, Ticket, Transition,
};
pub use error::{ErrorInfo, ErrorKind};
pub use i18n::Strings;
pub use quiz::{Feedback, QuizEngine, QuizOption, QuizView};
pub use report::{
    render_report, OutputFormat, RenderedReport, ReportDocument, ReportView, Viewport,
    EXPORT_FILENAME,
};
pub use shell::{FormView, Panel, PresentationShell, ShellView, Tab};
