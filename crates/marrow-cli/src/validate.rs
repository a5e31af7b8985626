use crate::output::CliError;
use marrow_core::db::query::SortOrder;
use marrow_core::model::Status;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_LABEL_LEN: usize = 50;
pub const MAX_BODY_LEN: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: &'static str,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: &'static str,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }

    pub fn to_cli_error(&self) -> CliError {
        CliError::with_details(
            format!("invalid {} '{}': {}", self.field, self.value, self.reason),
            self.suggestion.clone(),
            self.code,
        )
    }
}

pub fn validate_title(s: &str) -> Result<(), ValidationError> {
    if s.trim() != s {
        return Err(ValidationError::new(
            "title",
            s,
            "must not start or end with whitespace",
            "trim leading/trailing whitespace from --title",
            "E1201",
        ));
    }
    if s.is_empty() {
        return Err(ValidationError::new(
            "title",
            s,
            "must not be empty",
            "provide a non-empty --title",
            "E1201",
        ));
    }
    if s.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::new(
            "title",
            s,
            format!("must be <= {MAX_TITLE_LEN} characters"),
            "shorten the title",
            "E1201",
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "title",
            s,
            "must not contain control characters",
            "remove control characters from the title",
            "E1201",
        ));
    }
    Ok(())
}

// Label names are stored exactly as given, so only reject the unusable.
pub fn validate_label(s: &str) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::new(
            "label",
            s,
            "must not be empty",
            "provide a non-empty label name",
            "E1201",
        ));
    }
    if s.chars().count() > MAX_LABEL_LEN {
        return Err(ValidationError::new(
            "label",
            s,
            format!("must be <= {MAX_LABEL_LEN} characters"),
            "shorten the label name",
            "E1201",
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "label",
            s,
            "must not contain control characters",
            "remove control characters from the label name",
            "E1201",
        ));
    }
    Ok(())
}

pub fn validate_email(s: &str) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::new(
            "email",
            s,
            "must not be empty",
            "provide --email",
            "E1201",
        ));
    }
    if !s.contains('@') {
        return Err(ValidationError::new(
            "email",
            s,
            "must contain '@'",
            "use an address like dev@example.com",
            "E1201",
        ));
    }
    if s.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(
            "email",
            s,
            "must not contain whitespace",
            "remove spaces from the address",
            "E1201",
        ));
    }
    Ok(())
}

pub fn validate_body(s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::new(
            "body",
            s,
            "must not be empty",
            "provide a non-empty comment body",
            "E1201",
        ));
    }
    if s.chars().count() > MAX_BODY_LEN {
        return Err(ValidationError::new(
            "body",
            s,
            format!("must be <= {MAX_BODY_LEN} characters"),
            "shorten the comment body",
            "E1201",
        ));
    }
    Ok(())
}

pub fn validate_status(s: &str) -> Result<Status, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "status",
            s,
            "expected one of open, in-progress, closed",
            "use --status open|in-progress|closed",
            "E1201",
        )
    })
}

pub fn validate_sort(s: &str) -> Result<SortOrder, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "sort",
            s,
            "expected one of updated-desc, updated-asc, created-desc, created-asc",
            "use --sort updated-desc, --sort created-asc, etc.",
            "E1201",
        )
    })
}
