//! Pure syntactic checks on admin-supplied values.

use uuid::Uuid;

use super::ValidationError;

/// Maximum length of a fully qualified domain name.
pub const MAX_DOMAIN_LEN: usize = 253;
/// Maximum length of a single DNS label.
pub const MAX_LABEL_LEN: usize = 63;

const HYPHENATED_UUID_LEN: usize = 36;

/// Full parse; there is no partial-validity mode.
pub fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}

/// Canonical 8-4-4-4-12 hyphenated form only, any case.
pub fn is_valid_uuid(s: &str) -> bool {
    // `Uuid::try_parse` also accepts the simple, braced and urn forms; all of
    // them have a different length.
    s.len() == HYPHENATED_UUID_LEN && Uuid::try_parse(s).is_ok()
}

/// Check that `name` can be used as the proxy's site address.
///
/// Only the syntax is checked: the name is not resolved.
pub fn check_host_domain_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::InvalidDomain("empty"));
    }
    if name.len() > MAX_DOMAIN_LEN {
        return Err(ValidationError::InvalidDomain("too long"));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(ValidationError::InvalidDomain("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(ValidationError::InvalidDomain("label too long"));
        }
        if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(ValidationError::InvalidDomain("disallowed character"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ValidationError::InvalidDomain(
                "label starts or ends with a hyphen",
            ));
        }
    }

    Ok(())
}

pub fn parse_priority(raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidPriority)
}

/// Uploaded enrichments are stored under their own filename, which must stay
/// inside the enrichments directory.
pub fn check_enrichment_filename(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::InvalidFilename("empty"));
    }
    if name == "." || name == ".." {
        return Err(ValidationError::InvalidFilename("relative path component"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(ValidationError::InvalidFilename("path separator"));
    }
    Ok(())
}

/// Credentials are written verbatim as directive tokens.
pub fn check_credential(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::InvalidCredential {
            field,
            reason: "empty",
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidCredential {
            field,
            reason: "whitespace or control character",
        });
    }
    if value.contains(['{', '}', '"']) {
        return Err(ValidationError::InvalidCredential {
            field,
            reason: "brace or quote",
        });
    }
    if value.starts_with('#') {
        return Err(ValidationError::InvalidCredential {
            field,
            reason: "starts a comment",
        });
    }
    Ok(())
}
