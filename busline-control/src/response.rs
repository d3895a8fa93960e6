use crate::ControlError;

/// Status class derived from a response's leading status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// `250` — the command succeeded.
    Ok,
    /// `514` — the command requires prior authentication.
    AuthenticationRequired,
    /// `515` — the supplied credential was rejected.
    AuthenticationFailed,
    /// Any other status code.
    Other(u16),
}

impl ResponseStatus {
    fn from_code(code: u16) -> Self {
        match code {
            250 => Self::Ok,
            514 => Self::AuthenticationRequired,
            515 => Self::AuthenticationFailed,
            other => Self::Other(other),
        }
    }
}

/// One parsed response line
#[derive(Debug, Clone)]
pub struct Response {
    pub status: ResponseStatus,
    pub code: u16,
    pub text: String,
}

/// Parse a single `CODE<sep>TEXT` response line (the trailing `\r\n`/`\n` is optional).
pub(crate) fn parse_response(line: &str) -> Result<Response, ControlError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.len() < 4 {
        return Err(ControlError::MalformedResponse(line.to_owned()));
    }

    let (code_str, rest) = trimmed.split_at(3);
    let code: u16 = code_str
        .parse()
        .map_err(|_| ControlError::MalformedResponse(line.to_owned()))?;

    Ok(Response {
        status: ResponseStatus::from_code(code),
        code,
        text: rest[1..].to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_response, ResponseStatus};

    #[test]
    fn parses_ok_response() {
        let response = parse_response("250 OK\r\n").unwrap();
        assert_eq!(ResponseStatus::Ok, response.status);
        assert_eq!("OK", response.text);
    }

    #[test]
    fn parses_auth_failed_response() {
        let response = parse_response("515 Bad authentication\n").unwrap();
        assert_eq!(ResponseStatus::AuthenticationFailed, response.status);
    }

    #[test]
    fn parses_unrecognized_code_as_other() {
        let response = parse_response("451 Resource exhausted").unwrap();
        assert_eq!(ResponseStatus::Other(451), response.status);
    }

    #[test]
    fn rejects_short_lines() {
        assert!(parse_response("25").is_err());
    }
}
