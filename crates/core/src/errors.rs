use thiserror::Error;

/// Rejections raised while validating requirement values.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown requirement field `{0}`")]
    UnknownField(String),
    #[error("invalid value `{value}` for `{field}` (expected {expected})")]
    InvalidFieldValue { field: String, value: String, expected: String },
    #[error("value for `{field}` must not be empty")]
    EmptyFieldValue { field: String },
    #[error("invalid {kind} `{value}` (expected 1-64 letters, digits, '-' or '_')")]
    InvalidIdentifier { kind: String, value: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("session `{0}` was not found")]
    SessionNotFound(String),
    #[error("collaborator call failed: {0}")]
    Integration(String),
    #[error("service misconfigured: {0}")]
    Configuration(String),
}

/// Errors as presented to an outer surface, tagged with the request's correlation id.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "That input could not be used. Adjust it and send it again.",
            Self::NotFound { .. } => "This session does not exist or has been reset.",
            Self::ServiceUnavailable { .. } => {
                "A dependent service is unavailable. Try again soon."
            }
            Self::Internal { .. } => "Something went wrong on our side.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        let (Self::BadRequest { correlation_id, .. }
        | Self::NotFound { correlation_id, .. }
        | Self::ServiceUnavailable { correlation_id, .. }
        | Self::Internal { correlation_id, .. }) = self;
        correlation_id
    }

    pub fn message(&self) -> &str {
        let (Self::BadRequest { message, .. }
        | Self::NotFound { message, .. }
        | Self::ServiceUnavailable { message, .. }
        | Self::Internal { message, .. }) = self;
        message
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::Domain(_) => InterfaceError::BadRequest { message, correlation_id },
            Self::SessionNotFound(_) => InterfaceError::NotFound { message, correlation_id },
            Self::Integration(_) => InterfaceError::ServiceUnavailable { message, correlation_id },
            Self::Configuration(_) => InterfaceError::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn unknown_field_becomes_bad_request_with_field_name() {
        let interface = ApplicationError::from(DomainError::UnknownField("colour".to_owned()))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, ref message }
                if correlation_id == "req-1" && message.contains("colour")
        ));
        assert_eq!(
            interface.user_message(),
            "That input could not be used. Adjust it and send it again."
        );
    }

    #[test]
    fn invalid_value_message_names_expectation() {
        let error = DomainError::InvalidFieldValue {
            field: "budget".to_owned(),
            value: "lots".to_owned(),
            expected: "whole USD amount".to_owned(),
        };

        assert_eq!(
            error.to_string(),
            "invalid value `lots` for `budget` (expected whole USD amount)"
        );
    }

    #[test]
    fn invalid_identifier_becomes_bad_request() {
        let interface = ApplicationError::from(DomainError::InvalidIdentifier {
            kind: "thread_id".to_owned(),
            value: "a/b".to_owned(),
        })
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert_eq!(
            interface.message(),
            "invalid thread_id `a/b` (expected 1-64 letters, digits, '-' or '_')"
        );
    }

    #[test]
    fn missing_session_becomes_not_found() {
        let interface =
            ApplicationError::SessionNotFound("thread_1234abcd".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
        assert_eq!(interface.message(), "session `thread_1234abcd` was not found");
    }

    #[test]
    fn collaborator_and_configuration_failures_map_to_server_side_errors() {
        let unavailable =
            ApplicationError::Integration("matching timed out".to_owned()).into_interface("req-4");
        let internal = ApplicationError::Configuration("memory base url missing".to_owned())
            .into_interface("req-5");

        assert!(matches!(unavailable, InterfaceError::ServiceUnavailable { .. }));
        assert!(unavailable.message().contains("matching timed out"));
        assert!(matches!(internal, InterfaceError::Internal { .. }));
        assert_eq!(internal.user_message(), "Something went wrong on our side.");
    }
}
