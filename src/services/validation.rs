//! Field validators for the client details step.
//!
//! `validate` is the strict check used on submit. `validate_on_change` is the
//! reactive variant run on every keystroke: it does not flag a field just for
//! being empty, so the form does not shout at the user before they type.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{ClientForm, Field, FieldErrors};

pub const NAME_REQUIRED: &str = "Name is required";
pub const PHONE_REQUIRED: &str = "Phone is required";
pub const PHONE_INVALID: &str = "Invalid phone number. Use format: +351 XXX XXX XXX";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email address";

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| Regex::new(r"^(\+351|351)?9\d{8}$").expect("Invalid phone regex"))
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"))
}

/// Portuguese mobile number, optionally prefixed with `+351`/`351`.
/// Spaces, dashes and parentheses are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    phone_regex().is_match(&cleaned)
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn validate(field: Field, value: &str) -> Result<(), String> {
    match field {
        Field::Name if value.trim().is_empty() => Err(NAME_REQUIRED.to_string()),
        Field::Phone if value.trim().is_empty() => Err(PHONE_REQUIRED.to_string()),
        Field::Phone if !is_valid_phone(value) => Err(PHONE_INVALID.to_string()),
        Field::Email if value.trim().is_empty() => Err(EMAIL_REQUIRED.to_string()),
        Field::Email if !is_valid_email(value) => Err(EMAIL_INVALID.to_string()),
        _ => Ok(()),
    }
}

pub fn validate_on_change(field: Field, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate(field, value)
}

pub fn validate_form(form: &ClientForm) -> FieldErrors {
    [Field::Name, Field::Phone, Field::Email, Field::Notes]
        .into_iter()
        .filter_map(|field| validate(field, form.value(field)).err().map(|e| (field, e)))
        .collect()
}

/// Submit is enabled only when every required field is filled and none is flagged.
pub fn can_submit(form: &ClientForm, errors: &FieldErrors) -> bool {
    form.required_filled() && errors.is_empty() && validate_form(form).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phones() {
        assert!(is_valid_phone("+351 935 279 765"));
        assert!(is_valid_phone("935279765"));
        assert!(is_valid_phone("351935279765"));
        assert!(is_valid_phone("(+351) 912-345-678"));
        assert!(is_valid_phone("96 123 45 67"));
    }

    #[test]
    fn test_invalid_phones() {
        assert!(!is_valid_phone("123456789"));
        assert!(!is_valid_phone("212345678"));
        assert!(!is_valid_phone("93527976"));
        assert!(!is_valid_phone("9352797651"));
        assert!(!is_valid_phone("+352935279765"));
        assert!(!is_valid_phone("+351+935279765"));
        assert!(!is_valid_phone("93527976a"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_emails() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("maria.silva@salon.pt"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_validate_messages() {
        assert_eq!(validate(Field::Name, "  "), Err(NAME_REQUIRED.to_string()));
        assert_eq!(validate(Field::Name, "Maria"), Ok(()));
        assert_eq!(validate(Field::Phone, ""), Err(PHONE_REQUIRED.to_string()));
        assert_eq!(validate(Field::Phone, "12"), Err(PHONE_INVALID.to_string()));
        assert_eq!(validate(Field::Email, ""), Err(EMAIL_REQUIRED.to_string()));
        assert_eq!(validate(Field::Email, "x@y"), Err(EMAIL_INVALID.to_string()));
        assert_eq!(validate(Field::Notes, ""), Ok(()));
    }

    #[test]
    fn test_on_change_ignores_empty() {
        assert_eq!(validate_on_change(Field::Name, ""), Ok(()));
        assert_eq!(validate_on_change(Field::Phone, " "), Ok(()));
        assert_eq!(
            validate_on_change(Field::Phone, "123"),
            Err(PHONE_INVALID.to_string())
        );
    }

    #[test]
    fn test_validate_form_reports_each_field() {
        let form = ClientForm {
            name: String::new(),
            phone: "935279765".to_string(),
            email: "bad".to_string(),
            notes: String::new(),
        };
        let errors = validate_form(&form);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(&Field::Name).map(String::as_str), Some(NAME_REQUIRED));
        assert_eq!(errors.get(&Field::Email).map(String::as_str), Some(EMAIL_INVALID));
    }

    #[test]
    fn test_can_submit() {
        let mut form = ClientForm {
            name: "Maria".to_string(),
            phone: "935279765".to_string(),
            email: "maria@example.pt".to_string(),
            notes: String::new(),
        };
        assert!(can_submit(&form, &FieldErrors::new()));

        let mut errors = FieldErrors::new();
        errors.insert(Field::Phone, PHONE_INVALID.to_string());
        assert!(!can_submit(&form, &errors));

        form.email.clear();
        assert!(!can_submit(&form, &FieldErrors::new()));
    }
}
