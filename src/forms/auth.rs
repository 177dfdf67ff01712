use super::{FormErrors, REQUIRED};
use crate::utils::password::check_password_rules;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const USERNAME_MAX_LENGTH: usize = 150;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct SignupForm {
    /// Up to 150 letters, digits and `@.+-_`
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup values echoed back on a rejected submission. Never the password.
#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct SignupValues {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CleanSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn values(&self) -> SignupValues {
        SignupValues {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    pub fn clean(self) -> Result<CleanSignup, (SignupValues, FormErrors)> {
        let values = self.values();
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from_validation(&e),
        };

        if values.username.is_empty() {
            errors.add("username", REQUIRED);
        } else if !is_valid_username(&values.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if values.email.is_empty() && errors.get("email").is_none() {
            errors.add("email", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        } else if let Err(message) = check_password_rules(&self.password, &values.username) {
            errors.add("password", message);
        }

        if !errors.is_empty() {
            return Err((values, errors));
        }
        Ok(CleanSignup {
            username: values.username,
            email: values.email,
            password: self.password,
        })
    }
}

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= USERNAME_MAX_LENGTH
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct LoginValues {
    pub username: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn values(&self) -> LoginValues {
        LoginValues {
            username: self.username.trim().to_string(),
            next: self.next.clone(),
        }
    }

    pub fn missing_fields(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors
    }
}

/// Only local absolute paths are honoured as a post-login target.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim)
        .filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn valid_signup() {
        let clean = signup("leo.tolstoy", "leo@example.com", "war-and-peace")
            .clean()
            .unwrap();
        assert_eq!(clean.username, "leo.tolstoy");
    }

    #[test]
    fn username_charset() {
        assert!(is_valid_username("Лев_1869"));
        assert!(is_valid_username("a@b.c+d-e_f"));
        assert!(!is_valid_username("with space"));
        assert!(!is_valid_username(&"a".repeat(151)));
    }

    #[test]
    fn signup_errors_per_field() {
        let (values, errors) = signup("bad name", "not-an-email", "1234").clean().unwrap_err();
        assert_eq!(values.username, "bad name");
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn login_requires_both_fields() {
        let form = LoginForm::default();
        let errors = form.missing_fields();
        assert!(errors.get("username").is_some());
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/create/")), Some("/create/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
