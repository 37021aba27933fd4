use serde::{Deserialize, Serialize};

use crate::models::ClockTime;

/// Price of a service. Some treatments are only quoted after a consultation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Price {
    Amount(f64),
    OnRequest,
}

impl Price {
    /// Storage form: NULL means "on request".
    pub fn from_column(value: Option<f64>) -> Self {
        match value {
            Some(amount) => Price::Amount(amount),
            None => Price::OnRequest,
        }
    }

    pub fn as_column(&self) -> Option<f64> {
        match self {
            Price::Amount(amount) => Some(*amount),
            Price::OnRequest => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Price::Amount(amount) => amount.is_finite() && *amount >= 0.0,
            Price::OnRequest => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub price: Price,
    pub category: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: u32,
    pub price: Price,
    #[serde(default)]
    pub category: String,
}

impl ServiceInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("service name is required".to_string());
        }
        check_duration_and_price(Some(self.duration_minutes), Some(&self.price))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl ServicePatch {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("service name cannot be empty".to_string());
        }
        check_duration_and_price(self.duration_minutes, self.price.as_ref())
    }

    pub fn apply(&self, service: &mut Service) {
        if let Some(name) = &self.name {
            service.name = name.clone();
        }
        if let Some(description) = &self.description {
            service.description = description.clone();
        }
        if let Some(duration) = self.duration_minutes {
            service.duration_minutes = duration;
        }
        if let Some(price) = self.price {
            service.price = price;
        }
        if let Some(category) = &self.category {
            service.category = category.clone();
        }
        if let Some(active) = self.is_active {
            service.is_active = active;
        }
    }
}

fn check_duration_and_price(duration: Option<u32>, price: Option<&Price>) -> Result<(), String> {
    if duration == Some(0) {
        return Err("duration must be greater than zero".to_string());
    }
    if price.is_some_and(|p| !p.is_valid()) {
        return Err("price must be a non-negative amount".to_string());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub bio: String,
    pub service_ids: Vec<i64>,
    pub is_active: bool,
}

impl Professional {
    /// An empty offered-service set means the professional takes any service.
    pub fn offers(&self, service_id: i64) -> bool {
        self.service_ids.is_empty() || self.service_ids.contains(&service_id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfessionalInput {
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfessionalPatch {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}

impl ProfessionalPatch {
    pub fn apply(&self, professional: &mut Professional) {
        if let Some(name) = &self.name {
            professional.name = name.clone();
        }
        if let Some(specialty) = &self.specialty {
            professional.specialty = specialty.clone();
        }
        if let Some(bio) = &self.bio {
            professional.bio = bio.clone();
        }
        if let Some(active) = self.is_active {
            professional.is_active = active;
        }
    }
}

/// One weekday of a professional's schedule. `day_of_week` counts from
/// Sunday = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub id: i64,
    pub professional_id: i64,
    pub day_of_week: u8,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub is_available: bool,
}

impl WorkingHours {
    pub fn covers(&self, start: ClockTime, end: ClockTime) -> bool {
        self.is_available && start >= self.start_time && end <= self.end_time
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.start_time >= self.end_time {
            return Err("working hours must start before they end".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkingHoursPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl WorkingHoursPatch {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none() && self.is_available.is_none()
    }

    pub fn apply(&self, hours: &mut WorkingHours) {
        if let Some(start) = self.start_time {
            hours.start_time = start;
        }
        if let Some(end) = self.end_time {
            hours.end_time = end;
        }
        if let Some(available) = self.is_available {
            hours.is_available = available;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_serde() {
        assert_eq!(
            serde_json::to_value(Price::Amount(25.0)).unwrap(),
            serde_json::json!({"amount": 25.0})
        );
        assert_eq!(
            serde_json::to_value(Price::OnRequest).unwrap(),
            serde_json::json!("on_request")
        );
    }

    #[test]
    fn test_price_column_roundtrip_on_request() {
        assert_eq!(Price::from_column(None), Price::OnRequest);
        assert_eq!(Price::OnRequest.as_column(), None);
    }

    #[test]
    fn test_service_input_validation() {
        let mut input = ServiceInput {
            name: "Manicure".to_string(),
            description: String::new(),
            duration_minutes: 45,
            price: Price::Amount(15.0),
            category: "nails".to_string(),
        };
        assert!(input.validate().is_ok());

        input.duration_minutes = 0;
        assert!(input.validate().is_err());

        input.duration_minutes = 45;
        input.price = Price::Amount(-1.0);
        assert!(input.validate().is_err());

        input.price = Price::OnRequest;
        input.name = "  ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_professional_offers() {
        let mut pro = Professional {
            id: 5,
            name: "Ana".to_string(),
            specialty: "Hair".to_string(),
            bio: String::new(),
            service_ids: vec![],
            is_active: true,
        };
        assert!(pro.offers(1));
        pro.service_ids = vec![2, 3];
        assert!(!pro.offers(1));
        assert!(pro.offers(3));
    }

    #[test]
    fn test_working_hours_patch() {
        let t = |s: &str| ClockTime::parse(s).unwrap();
        let mut day = WorkingHours {
            id: 1,
            professional_id: 5,
            day_of_week: 2,
            start_time: t("10:00"),
            end_time: t("19:00"),
            is_available: true,
        };
        assert!(day.covers(t("10:00"), t("11:00")));
        assert!(!day.covers(t("18:30"), t("19:30")));

        WorkingHoursPatch {
            end_time: Some(t("14:00")),
            ..WorkingHoursPatch::default()
        }
        .apply(&mut day);
        assert_eq!(day.start_time, t("10:00"));
        assert!(!day.covers(t("14:00"), t("15:00")));

        WorkingHoursPatch {
            start_time: Some(t("15:00")),
            ..WorkingHoursPatch::default()
        }
        .apply(&mut day);
        assert!(day.validate().is_err());

        day.start_time = t("09:00");
        day.is_available = false;
        assert!(day.validate().is_ok());
        assert!(!day.covers(t("10:00"), t("11:00")));
    }
}
