//! Submission state machine: `Idle -> Loading -> Succeeded | Failed`.
//!
//! Every accepted submission carries a fresh [`Ticket`]. Only a completion
//! whose ticket matches the current `Loading` ticket may change state, so a
//! response that resolves after a newer submission started is dropped.

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::assessment::{CheckRequest, Lang, ReturnLevel, RiskAssessment};
use crate::client::RequestClient;
use crate::error::ErrorInfo;

/// Identifies one accepted submission. Later submissions get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Loading { ticket: Ticket },
    Succeeded(RiskAssessment),
    Failed(ErrorInfo),
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmissionState::Loading { .. })
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            SubmissionState::Succeeded(assessment) => Some(assessment),
            _ => None,
        }
    }
}

/// An accepted submission, ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: CheckRequest,
}

/// Outcome of a dispatched submission, fed back into [`SubmissionController::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Result<RiskAssessment, ErrorInfo>,
}

/// What applying a completion did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Succeeded,
    Failed,
    /// Superseded or unexpected completion; state untouched.
    Stale,
}

#[derive(Debug)]
pub struct SubmissionController {
    state: SubmissionState,
    next_ticket: u64,
    validation_error: Option<ErrorInfo>,
    return_level: Option<ReturnLevel>,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            next_ticket: 1,
            validation_error: None,
            return_level: None,
        }
    }

    pub fn current_state(&self) -> &SubmissionState {
        &self.state
    }

    /// Last rejected input, cleared by the next accepted submission.
    pub fn validation_error(&self) -> Option<&ErrorInfo> {
        self.validation_error.as_ref()
    }

    pub fn return_level(&self) -> Option<ReturnLevel> {
        self.return_level
    }

    /// Detail level requested by later submissions; `None` leaves it to the engine.
    pub fn set_return_level(&mut self, level: Option<ReturnLevel>) {
        self.return_level = level;
    }

    /// Start a new check. Blank text is rejected without touching the state;
    /// anything else moves to `Loading` and supersedes any pending submission.
    pub fn submit(&mut self, text: &str, lang: Lang) -> Result<Submission, ErrorInfo> {
        if text.trim().is_empty() {
            let err = ErrorInfo::validation("text to check must not be empty");
            self.validation_error = Some(err.clone());
            return Err(err);
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        if let SubmissionState::Loading { ticket: previous } = self.state {
            debug!(%previous, %ticket, "superseding pending submission");
        }
        self.state = SubmissionState::Loading { ticket };
        self.validation_error = None;
        let mut request = CheckRequest::new(text, lang);
        request.return_level = self.return_level;
        Ok(Submission { ticket, request })
    }

    /// Apply a completion if it belongs to the current `Loading` ticket.
    pub fn complete(&mut self, completion: Completion) -> Transition {
        match self.state {
            SubmissionState::Loading { ticket } if ticket == completion.ticket => {}
            _ => {
                debug!(ticket = %completion.ticket, "dropping stale completion");
                return Transition::Stale;
            }
        }

        match completion.outcome {
            Ok(assessment) => {
                self.state = SubmissionState::Succeeded(assessment);
                Transition::Succeeded
            }
            Err(err) => {
                self.state = SubmissionState::Failed(err);
                Transition::Failed
            }
        }
    }
}

/// Run one submission against the client and pair the outcome with its ticket.
#[instrument(name = "dispatch_check", skip(client, submission), fields(ticket = %submission.ticket))]
pub async fn dispatch<C>(client: &C, submission: Submission) -> Completion
where
    C: RequestClient + ?Sized,
{
    let outcome = client.check(&submission.request).await;
    if let Err(err) = &outcome {
        debug!(kind = ?err.kind, error = %err, "check failed");
    }
    Completion {
        ticket: submission.ticket,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::RiskScore;
    use crate::error::ErrorKind;

    fn assessment(score: u8) -> RiskAssessment {
        RiskAssessment {
            risk: RiskScore::new(score),
            explanation_md: format!("score {score}"),
            lesson_md: None,
            evidence: Vec::new(),
        }
    }

    #[test]
    fn blank_text_stays_idle_with_validation_error() {
        let mut controller = SubmissionController::new();
        let err = controller.submit("   ", Lang::En).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(controller.current_state(), &SubmissionState::Idle);
        assert_eq!(controller.validation_error(), Some(&err));
    }

    #[test]
    fn submit_moves_to_loading_synchronously() {
        let mut controller = SubmissionController::new();
        let submission = controller.submit("claim", Lang::Hi).unwrap();
        assert_eq!(submission.request.lang, Lang::Hi);
        assert_eq!(
            controller.current_state(),
            &SubmissionState::Loading {
                ticket: submission.ticket
            }
        );
    }

    #[test]
    fn return_level_applies_to_later_submissions() {
        let mut controller = SubmissionController::new();
        let plain = controller.submit("a", Lang::En).unwrap();
        assert_eq!(plain.request.return_level, None);

        controller.set_return_level(Some(ReturnLevel::Simple));
        let simple = controller.submit("b", Lang::En).unwrap();
        assert_eq!(simple.request.return_level, Some(ReturnLevel::Simple));

        controller.set_return_level(None);
        let cleared = controller.submit("c", Lang::En).unwrap();
        assert_eq!(cleared.request.return_level, None);
    }

    #[test]
    fn accepted_submission_clears_validation_error() {
        let mut controller = SubmissionController::new();
        let _ = controller.submit("", Lang::En);
        controller.submit("claim", Lang::En).unwrap();
        assert!(controller.validation_error().is_none());
    }

    #[test]
    fn completion_drives_success_and_failure() {
        let mut controller = SubmissionController::new();
        let first = controller.submit("a", Lang::En).unwrap();
        let transition = controller.complete(Completion {
            ticket: first.ticket,
            outcome: Ok(assessment(10)),
        });
        assert_eq!(transition, Transition::Succeeded);
        assert_eq!(controller.current_state().assessment().unwrap().risk.score, 10);

        let second = controller.submit("b", Lang::En).unwrap();
        assert!(controller.current_state().is_loading());
        let transition = controller.complete(Completion {
            ticket: second.ticket,
            outcome: Err(ErrorInfo::transport("offline")),
        });
        assert_eq!(transition, Transition::Failed);
        assert!(matches!(
            controller.current_state(),
            SubmissionState::Failed(err) if err.kind == ErrorKind::Transport
        ));
    }

    #[test]
    fn late_response_from_superseded_submission_is_ignored() {
        let mut controller = SubmissionController::new();
        let a = controller.submit("a", Lang::En).unwrap();
        let b = controller.submit("b", Lang::En).unwrap();
        assert!(b.ticket > a.ticket);

        assert_eq!(
            controller.complete(Completion {
                ticket: b.ticket,
                outcome: Ok(assessment(80)),
            }),
            Transition::Succeeded
        );
        assert_eq!(
            controller.complete(Completion {
                ticket: a.ticket,
                outcome: Ok(assessment(5)),
            }),
            Transition::Stale
        );
        assert_eq!(controller.current_state().assessment().unwrap().risk.score, 80);
    }

    #[test]
    fn early_response_from_superseded_submission_is_ignored() {
        let mut controller = SubmissionController::new();
        let a = controller.submit("a", Lang::En).unwrap();
        let b = controller.submit("b", Lang::En).unwrap();
        assert_eq!(
            controller.complete(Completion {
                ticket: a.ticket,
                outcome: Err(ErrorInfo::server("late")),
            }),
            Transition::Stale
        );
        assert_eq!(
            controller.current_state(),
            &SubmissionState::Loading { ticket: b.ticket }
        );
    }

    #[test]
    fn blank_resubmission_keeps_previous_result() {
        let mut controller = SubmissionController::new();
        let a = controller.submit("a", Lang::En).unwrap();
        controller.complete(Completion {
            ticket: a.ticket,
            outcome: Ok(assessment(42)),
        });
        assert!(controller.submit("", Lang::En).is_err());
        assert_eq!(controller.current_state().assessment().unwrap().risk.score, 42);
    }
}
