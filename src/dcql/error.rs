//! Evaluation error taxonomy.
//!
//! Numeric codes are shared with the other mdoc layers, so existing codes
//! are kept stable. Errors display as `"<reason> - <code> - <symbolic>"`.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DcqlError {
    /// The document has no docType field.
    DocTypeMissing,
    /// The document has no issuerSigned field.
    IssuerSignedMissing,
    /// The issuerSigned structure has no issuerAuth.
    IssuerAuthMissing,
    /// Claims were requested but the document has no nameSpaces.
    IssuerNameSpacesMissing,
    /// Claim sets were supplied without claims.
    ClaimSetsPresentWhenClaimsAbsent,
    /// An unexpected error interrupted name-space selection. Carries the
    /// underlying error's message.
    IssuerNameSpacesSelectionFailed(String),
    /// Every option of a required credential set failed. Carries the JSON
    /// form of the options.
    RequiredCredentialSetUnsatisfied(String),
    /// A requested `age_over_` identifier did not parse.
    InvalidAgeOverFormat(String),
    /// Requested values for an age-over claim were not a single boolean.
    InvalidAgeOverRequestedValues,
    /// A claim path did not have exactly two elements.
    ClaimPathInvalid,
    /// The namespace named by a claim path is absent from the document.
    ClaimNameSpaceMissing(String),
    /// No issuer-signed item satisfied a claim.
    ClaimDataElementMissing(String),
    /// A claim set referenced an id with no matching claim.
    ClaimNotFound(String),
    /// A credential set option referenced an id with no matching credential.
    CredentialNotFound(String),
}

impl DcqlError {
    pub fn code(&self) -> u16 {
        match self {
            Self::IssuerNameSpacesMissing => 2006,
            Self::IssuerAuthMissing => 2007,
            Self::DocTypeMissing => 2015,
            Self::IssuerSignedMissing => 2016,
            Self::ClaimSetsPresentWhenClaimsAbsent => 2017,
            Self::IssuerNameSpacesSelectionFailed(_) => 2018,
            Self::ClaimPathInvalid => 2019,
            Self::ClaimNameSpaceMissing(_) => 2020,
            Self::ClaimDataElementMissing(_) => 2021,
            Self::InvalidAgeOverFormat(_) => 2022,
            Self::InvalidAgeOverRequestedValues => 2023,
            Self::RequiredCredentialSetUnsatisfied(_) => 2024,
            Self::ClaimNotFound(_) => 2025,
            Self::CredentialNotFound(_) => 2026,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DocTypeMissing => "DocTypeMissing",
            Self::IssuerSignedMissing => "IssuerSignedMissing",
            Self::IssuerAuthMissing => "IssuerAuthMissing",
            Self::IssuerNameSpacesMissing => "IssuerNameSpacesMissing",
            Self::ClaimSetsPresentWhenClaimsAbsent => "ClaimSetsPresentWhenClaimsAbsent",
            Self::IssuerNameSpacesSelectionFailed(_) => "IssuerNameSpacesSelectionFailed",
            Self::RequiredCredentialSetUnsatisfied(_) => "RequiredCredentialSetUnsatisfied",
            Self::InvalidAgeOverFormat(_) => "InvalidAgeOverFormat",
            Self::InvalidAgeOverRequestedValues => "InvalidAgeOverRequestedValues",
            Self::ClaimPathInvalid => "ClaimPathInvalid",
            Self::ClaimNameSpaceMissing(_) => "ClaimNameSpaceMissing",
            Self::ClaimDataElementMissing(_) => "ClaimDataElementMissing",
            Self::ClaimNotFound(_) => "ClaimNotFound",
            Self::CredentialNotFound(_) => "CredentialNotFound",
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Self::DocTypeMissing => "The document type is missing.".to_string(),
            Self::IssuerSignedMissing => "The issuer signed structure is missing.".to_string(),
            Self::IssuerAuthMissing => "The issuer auth is missing.".to_string(),
            Self::IssuerNameSpacesMissing => "The issuer name spaces are missing.".to_string(),
            Self::ClaimSetsPresentWhenClaimsAbsent => {
                "claim_sets MUST NOT be present if claims is absent.".to_string()
            }
            Self::IssuerNameSpacesSelectionFailed(inner) => {
                format!("Failed to select issuer name spaces: {inner}")
            }
            Self::RequiredCredentialSetUnsatisfied(options) => {
                format!("No option of a required credential set could be satisfied: {options}")
            }
            Self::InvalidAgeOverFormat(identifier) => {
                format!("The identifier {identifier} is not a valid age_over_NN data element")
            }
            Self::InvalidAgeOverRequestedValues => {
                "The requested values for an age_over_NN claim must be a single boolean."
                    .to_string()
            }
            Self::ClaimPathInvalid => {
                "The claim path must contain exactly two elements.".to_string()
            }
            Self::ClaimNameSpaceMissing(name_space) => {
                format!("The name space {name_space} is not present in the document.")
            }
            Self::ClaimDataElementMissing(identifier) => {
                format!("The data element {identifier} is not present in the name space.")
            }
            Self::ClaimNotFound(id) => format!("Claim with id {id} not found"),
            Self::CredentialNotFound(id) => format!("Credential with id {id} not found"),
        }
    }
}

impl fmt::Display for DcqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.reason(), self.code(), self.name())
    }
}

impl std::error::Error for DcqlError {}
