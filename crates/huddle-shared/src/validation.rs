//! Field validation run before any write reaches the store.

use crate::error::ValidationError;
use crate::models::{GroupFields, User};

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Title, description, location and time must all be non-empty.
pub fn validate_group_fields(fields: &GroupFields) -> Result<(), ValidationError> {
    require(&fields.title, "Title")?;
    require(&fields.description, "Description")?;
    require(&fields.location, "Location")?;
    require(&fields.time, "Time")?;
    Ok(())
}

/// A participant snapshot needs a name, surname and email.
pub fn validate_participant(user: &User) -> Result<(), ValidationError> {
    let missing = if user.id.as_str().trim().is_empty() {
        Some("id")
    } else if user.name.trim().is_empty() {
        Some("name")
    } else if user.surname.trim().is_empty() {
        Some("surname")
    } else if user.email.trim().is_empty() {
        Some("email")
    } else {
        None
    };

    match missing {
        Some(field) => Err(ValidationError::IncompleteParticipant {
            id: user.id.to_string(),
            field,
        }),
        None => Ok(()),
    }
}

pub fn validate_participants(users: &[User]) -> Result<(), ValidationError> {
    users.iter().try_for_each(validate_participant)
}

/// Profile name and surname must be non-empty.
pub fn validate_profile(name: &str, surname: &str) -> Result<(), ValidationError> {
    require(name, "Name")?;
    require(surname, "Surname")?;
    Ok(())
}

/// Minimal shape check: one `@` with something on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Chat text must be non-blank and at most `max_len` characters.
pub fn validate_message_text(text: &str, max_len: usize) -> Result<(), ValidationError> {
    require(text, "Message")?;
    let len = text.chars().count();
    if len > max_len {
        return Err(ValidationError::MessageTooLong { len, max: max_len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;

    fn run_club() -> GroupFields {
        GroupFields {
            title: "Run Club".into(),
            description: "5k".into(),
            location: "Park".into(),
            time: "2024-01-01T10:00".into(),
        }
    }

    #[test]
    fn complete_group_passes() {
        assert!(validate_group_fields(&run_club()).is_ok());
    }

    #[test]
    fn each_group_field_is_required() {
        let mut fields = run_club();
        fields.location = "   ".into();
        assert_eq!(
            validate_group_fields(&fields),
            Err(ValidationError::MissingField("Location"))
        );

        let mut fields = run_club();
        fields.time.clear();
        assert_eq!(
            validate_group_fields(&fields),
            Err(ValidationError::MissingField("Time"))
        );
    }

    #[test]
    fn partial_participant_is_rejected() {
        let user = User {
            id: AccountId::from("u2"),
            name: "Grace".into(),
            surname: String::new(),
            email: "grace@x.com".into(),
        };
        assert_eq!(
            validate_participants(&[user]),
            Err(ValidationError::IncompleteParticipant {
                id: "u2".into(),
                field: "surname"
            })
        );
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("ada@x.com").is_ok());
        assert!(validate_email("ada@x").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("ada@@x.com").is_err());
        assert!(validate_email("ada").is_err());
    }

    #[test]
    fn message_limits() {
        assert!(validate_message_text("hello", 10).is_ok());
        assert_eq!(
            validate_message_text("  ", 10),
            Err(ValidationError::MissingField("Message"))
        );
        assert_eq!(
            validate_message_text("hello world", 5),
            Err(ValidationError::MessageTooLong { len: 11, max: 5 })
        );
    }
}
