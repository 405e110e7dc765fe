//! Admin request payloads.
//!
//! Every field is optional at the type level so that a missing field becomes
//! a `MissingParameter` validation error instead of an extractor rejection.

use serde::Deserialize;

use crate::validator::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalRegistryForm {
    pub vendor_prefix: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
    pub priority: Option<String>,
    pub apikey: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalApiKeyForm {
    pub local_iglu_apikey: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
pub struct CredentialsForm {
    pub new_username: Option<String>,
    pub new_password: Option<String>,
}

impl std::fmt::Debug for CredentialsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsForm")
            .field("new_username", &self.new_username)
            .field("new_password", &self.new_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainNameForm {
    pub domain_name: Option<String>,
}

pub(crate) fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .ok_or(ValidationError::MissingParameter(field))
}
