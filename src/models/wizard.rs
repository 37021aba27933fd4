use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ClockTime, Professional, Service};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardStep {
    SelectService,
    SelectProfessional,
    SelectDateTime,
    EnterClientDetails,
    Submitting,
    Success { record_id: i64 },
    Failure { message: String },
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::SelectService => "select_service",
            WizardStep::SelectProfessional => "select_professional",
            WizardStep::SelectDateTime => "select_date_time",
            WizardStep::EnterClientDetails => "enter_client_details",
            WizardStep::Submitting => "submitting",
            WizardStep::Success { .. } => "success",
            WizardStep::Failure { .. } => "failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Phone,
    Email,
    Notes,
}

pub type FieldErrors = BTreeMap<Field, String>;

/// Raw client input exactly as typed; validated separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
}

impl ClientForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::Notes => &self.notes,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Phone => self.phone = value,
            Field::Email => self.email = value,
            Field::Notes => self.notes = value,
        }
    }

    pub fn required_filled(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.trim().is_empty() && !self.email.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub service: Option<Service>,
    pub professional: Option<Professional>,
    pub date: Option<NaiveDate>,
    pub time: Option<ClockTime>,
    pub client: ClientForm,
    pub errors: FieldErrors,
}

impl BookingDraft {
    pub fn is_empty(&self) -> bool {
        *self == BookingDraft::default()
    }
}
