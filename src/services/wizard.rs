//! Booking flow engine.
//!
//! `BookingWizard` owns one client's draft and moves it through the steps
//! service → professional → date/time → client details → submit. All
//! transitions go through `dispatch`, which never performs I/O; the single
//! call to the persistence port is split into `begin_submission` and
//! `complete_submission` so a caller can release its lock while the request
//! is in flight.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backend::BackendResult;
use crate::models::{
    BookingDraft, BookingOutcome, BookingRequest, ClockTime, Field, OpeningHours, Professional,
    Service, WizardStep,
};
use crate::services::calendar::{calculate_end_time, is_day_available, time_slots};
use crate::services::validation::{can_submit, validate_form, validate_on_change};

pub const GENERIC_FAILURE: &str = "Unexpected error. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    SelectService { service: Service },
    SelectProfessional { professional: Professional },
    SelectDate { date: NaiveDate },
    SelectTime { time: ClockTime },
    Next,
    Back,
    UpdateField { field: Field, value: String },
    Submit,
    SubmissionSucceeded { record_id: i64 },
    SubmissionFailed { message: String },
    Retry,
    Reset,
}

#[derive(Debug)]
enum AssemblyError {
    Incomplete,
    Invalid(anyhow::Error),
}

/// What a rendering layer needs to draw the current step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSnapshot {
    #[serde(flatten)]
    pub step: WizardStep,
    pub draft: BookingDraft,
    pub end_time: Option<ClockTime>,
    pub can_submit: bool,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    draft: BookingDraft,
    hours: OpeningHours,
}

impl BookingWizard {
    pub fn new(hours: OpeningHours) -> Self {
        Self {
            step: WizardStep::SelectService,
            draft: BookingDraft::default(),
            hours,
        }
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Service start plus duration, once both are chosen.
    pub fn end_time(&self) -> Option<ClockTime> {
        let service = self.draft.service.as_ref()?;
        let time = self.draft.time?;
        calculate_end_time(time, service.duration_minutes).ok()
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::EnterClientDetails
            && can_submit(&self.draft.client, &self.draft.errors)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.step.clone(),
            draft: self.draft.clone(),
            end_time: self.end_time(),
            can_submit: self.can_submit(),
        }
    }

    /// Applies `event` using the local calendar date as "today".
    pub fn dispatch(&mut self, event: WizardEvent) -> WizardStep {
        let today = chrono::Local::now().date_naive();
        self.dispatch_on(today, event)
    }

    /// Applies `event` and returns the resulting step. Events that do not
    /// apply to the current step leave the wizard unchanged.
    pub fn dispatch_on(&mut self, today: NaiveDate, event: WizardEvent) -> WizardStep {
        let before = self.step.clone();

        match (&self.step, event) {
            (_, WizardEvent::Reset) => {
                self.step = WizardStep::SelectService;
                self.draft = BookingDraft::default();
            }

            (WizardStep::SelectService, WizardEvent::SelectService { service }) => {
                if self.draft.service.as_ref().map(|s| s.id) != Some(service.id) {
                    self.draft.professional = None;
                    self.draft.date = None;
                    self.draft.time = None;
                }
                self.draft.service = Some(service);
                self.step = WizardStep::SelectProfessional;
            }

            (WizardStep::SelectProfessional, WizardEvent::SelectProfessional { professional }) => {
                let offered = self
                    .draft
                    .service
                    .as_ref()
                    .is_some_and(|s| professional.offers(s.id));
                if offered {
                    if self.draft.professional.as_ref().map(|p| p.id) != Some(professional.id) {
                        self.draft.date = None;
                        self.draft.time = None;
                    }
                    self.draft.professional = Some(professional);
                    self.step = WizardStep::SelectDateTime;
                } else {
                    tracing::debug!(professional_id = professional.id, "professional does not offer the selected service");
                }
            }

            (WizardStep::SelectDateTime, WizardEvent::SelectDate { date }) => {
                if is_day_available(date, today, &self.hours) {
                    if self.draft.date != Some(date) {
                        self.draft.time = None;
                    }
                    self.draft.date = Some(date);
                } else {
                    tracing::debug!(%date, "date is not available");
                }
            }

            (WizardStep::SelectDateTime, WizardEvent::SelectTime { time }) => {
                if self.draft.date.is_some() && time_slots(&self.hours).contains(&time) {
                    self.draft.time = Some(time);
                    self.step = WizardStep::EnterClientDetails;
                } else {
                    tracing::debug!(%time, "time is not an offered slot");
                }
            }

            (WizardStep::SelectService, WizardEvent::Next) if self.draft.service.is_some() => {
                self.step = WizardStep::SelectProfessional;
            }
            (WizardStep::SelectProfessional, WizardEvent::Next) if self.draft.professional.is_some() => {
                self.step = WizardStep::SelectDateTime;
            }
            (WizardStep::SelectDateTime, WizardEvent::Next)
                if self.draft.date.is_some() && self.draft.time.is_some() =>
            {
                self.step = WizardStep::EnterClientDetails;
            }

            (WizardStep::SelectProfessional, WizardEvent::Back) => {
                self.step = WizardStep::SelectService;
            }
            (WizardStep::SelectDateTime, WizardEvent::Back) => {
                self.step = WizardStep::SelectProfessional;
            }
            (WizardStep::EnterClientDetails, WizardEvent::Back) => {
                self.step = WizardStep::SelectDateTime;
            }

            (WizardStep::EnterClientDetails, WizardEvent::UpdateField { field, value }) => {
                match validate_on_change(field, &value) {
                    Ok(()) => {
                        self.draft.errors.remove(&field);
                    }
                    Err(message) => {
                        self.draft.errors.insert(field, message);
                    }
                }
                self.draft.client.set(field, value);
            }

            (WizardStep::EnterClientDetails, WizardEvent::Submit) => {
                self.draft.errors = validate_form(&self.draft.client);
                match self.assemble_request() {
                    Ok(_) => self.step = WizardStep::Submitting,
                    Err(AssemblyError::Incomplete) => {}
                    Err(AssemblyError::Invalid(e)) => {
                        tracing::warn!(error = %e, "failed to assemble booking request");
                        self.step = WizardStep::Failure {
                            message: GENERIC_FAILURE.to_string(),
                        };
                    }
                }
            }

            (WizardStep::Submitting, WizardEvent::SubmissionSucceeded { record_id }) => {
                self.step = WizardStep::Success { record_id };
            }
            (WizardStep::Submitting, WizardEvent::SubmissionFailed { message }) => {
                let message = if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message
                };
                self.step = WizardStep::Failure { message };
            }

            (WizardStep::Failure { .. }, WizardEvent::Retry | WizardEvent::Back) => {
                self.step = WizardStep::EnterClientDetails;
            }

            (_, event) => {
                tracing::debug!(step = self.step.as_str(), ?event, "event ignored");
            }
        }

        if before != self.step {
            tracing::debug!(from = before.as_str(), to = self.step.as_str(), "wizard transition");
        }
        self.step.clone()
    }

    fn assemble_request(&self) -> Result<BookingRequest, AssemblyError> {
        let draft = &self.draft;
        let (Some(service), Some(professional), Some(date), Some(start_time)) = (
            draft.service.as_ref(),
            draft.professional.as_ref(),
            draft.date,
            draft.time,
        ) else {
            return Err(AssemblyError::Incomplete);
        };
        if !can_submit(&draft.client, &draft.errors) {
            return Err(AssemblyError::Incomplete);
        }

        let end_time = calculate_end_time(start_time, service.duration_minutes)
            .map_err(AssemblyError::Invalid)?;
        let notes = draft.client.notes.trim();

        Ok(BookingRequest {
            professional_id: professional.id,
            service_id: service.id,
            date,
            start_time,
            end_time,
            client_name: draft.client.name.trim().to_string(),
            client_phone: draft.client.phone.trim().to_string(),
            client_email: draft.client.email.trim().to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }

    /// Moves the wizard into `Submitting` and hands back the request to send.
    /// Returns `None` when nothing should be sent: the form is invalid, or a
    /// submission is already in flight.
    pub fn begin_submission(&mut self, today: NaiveDate) -> Option<BookingRequest> {
        if self.step != WizardStep::EnterClientDetails {
            return None;
        }
        if self.dispatch_on(today, WizardEvent::Submit) != WizardStep::Submitting {
            return None;
        }
        self.assemble_request().ok()
    }

    /// Folds the persistence result back into the wizard. Every path ends with
    /// a step the user can see; port errors become the generic message.
    pub fn complete_submission(
        &mut self,
        today: NaiveDate,
        result: BackendResult<BookingOutcome>,
    ) -> WizardStep {
        let event = match result {
            Ok(BookingOutcome::Created { record_id }) => {
                tracing::info!(record_id, "booking submitted");
                WizardEvent::SubmissionSucceeded { record_id }
            }
            Ok(BookingOutcome::Rejected { reason }) => {
                tracing::info!(%reason, "booking rejected by persistence service");
                WizardEvent::SubmissionFailed { message: reason }
            }
            Err(e) => {
                tracing::error!(error = %e, "booking submission failed");
                WizardEvent::SubmissionFailed {
                    message: GENERIC_FAILURE.to_string(),
                }
            }
        };
        self.dispatch_on(today, event)
    }
}
