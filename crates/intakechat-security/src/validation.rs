use std::sync::LazyLock;

use intakechat_common::Profile;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex should compile")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone regex should compile"));

/// Why a submitted profile was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("email address is malformed")]
    MalformedEmail,

    #[error("contact number must be 10-15 digits, optionally starting with +")]
    MalformedPhone,
}

/// Checks a candidate [`Profile`] before it is forwarded anywhere.
///
/// Presence is checked first (name, email, phone, then each configured
/// free-text field in order), then email shape, then phone shape.
#[derive(Debug, Clone)]
pub struct ProfileValidator {
    required_fields: Vec<String>,
}

impl ProfileValidator {
    pub fn new(required_fields: Vec<String>) -> Self {
        Self { required_fields }
    }

    pub fn validate(&self, profile: &Profile) -> Result<(), ValidationError> {
        if profile.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        if profile.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email".to_string()));
        }
        if profile.phone.trim().is_empty() {
            return Err(ValidationError::MissingField("phone".to_string()));
        }
        for field in &self.required_fields {
            let filled = profile
                .fields
                .get(field)
                .is_some_and(|v| !v.trim().is_empty());
            if !filled {
                return Err(ValidationError::MissingField(field.clone()));
            }
        }

        if !EMAIL_RE.is_match(profile.email.trim()) {
            return Err(ValidationError::MalformedEmail);
        }
        if !PHONE_RE.is_match(profile.phone.trim()) {
            return Err(ValidationError::MalformedPhone);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ProfileValidator {
        ProfileValidator::new(vec!["area_of_interest".to_string()])
    }

    fn valid_profile() -> Profile {
        Profile::new("Ana", "a@b.com", "+12345678901").with_field("area_of_interest", "ML")
    }

    #[test]
    fn accepts_complete_profile() {
        assert_eq!(validator().validate(&valid_profile()), Ok(()));
    }

    #[test]
    fn rejects_whitespace_only_name() {
        let mut profile = valid_profile();
        profile.name = "   ".to_string();
        assert_eq!(
            validator().validate(&profile),
            Err(ValidationError::MissingField("name".to_string()))
        );
    }

    #[test]
    fn reports_missing_free_text_field() {
        let mut profile = valid_profile();
        profile.fields.clear();
        assert_eq!(
            validator().validate(&profile),
            Err(ValidationError::MissingField("area_of_interest".to_string()))
        );

        profile
            .fields
            .insert("area_of_interest".to_string(), " ".to_string());
        assert_eq!(
            validator().validate(&profile),
            Err(ValidationError::MissingField("area_of_interest".to_string()))
        );
    }

    #[test]
    fn missing_field_takes_priority_over_malformed_email() {
        let mut profile = valid_profile();
        profile.email = "not-an-email".to_string();
        profile.phone = String::new();
        assert_eq!(
            validator().validate(&profile),
            Err(ValidationError::MissingField("phone".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["ana", "ana@", "@b.com", "ana@b", "ana b@c.com", "ana@b.c"] {
            let mut profile = valid_profile();
            profile.email = email.to_string();
            assert_eq!(
                validator().validate(&profile),
                Err(ValidationError::MalformedEmail),
                "{email}"
            );
        }
    }

    #[test]
    fn phone_accepts_bare_digits_with_optional_plus() {
        for phone in ["1234567890", "+123456789012345", " +12345678901 "] {
            let mut profile = valid_profile();
            profile.phone = phone.to_string();
            assert_eq!(validator().validate(&profile), Ok(()), "{phone}");
        }
    }

    #[test]
    fn phone_rejects_separators_and_punctuation() {
        for phone in [
            "1-2-3-4-5-6-7-8-9-0",
            "+1 (234) 567-8901",
            "(((1234567890)))",
            "123.456.7890",
        ] {
            let mut profile = valid_profile();
            profile.phone = phone.to_string();
            assert_eq!(
                validator().validate(&profile),
                Err(ValidationError::MalformedPhone),
                "{phone}"
            );
        }
    }

    #[test]
    fn phone_rejects_wrong_lengths_and_letters() {
        for phone in ["123456789", "+1234567890123456", "12345abcde", "++1234567890"] {
            let mut profile = valid_profile();
            profile.phone = phone.to_string();
            assert_eq!(
                validator().validate(&profile),
                Err(ValidationError::MalformedPhone),
                "{phone}"
            );
        }
    }

    #[test]
    fn extra_fields_outside_configuration_are_ignored() {
        let profile = valid_profile().with_field("preferred_contact_time", "");
        assert_eq!(validator().validate(&profile), Ok(()));
    }

    #[test]
    fn serializes_kind_and_field() {
        let json = serde_json::to_value(ValidationError::MissingField("name".into())).unwrap();
        assert_eq!(json["kind"], "missing_field");
        assert_eq!(json["field"], "name");

        let json = serde_json::to_value(ValidationError::MalformedPhone).unwrap();
        assert_eq!(json["kind"], "malformed_phone");
    }
}
