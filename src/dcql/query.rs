//! The typed DCQL query model.
//!
//! Instances are produced by the schema layer from untrusted JSON and are
//! read-only afterwards. The types serialize back to the wire form for
//! logging and error reporting, but deliberately do not implement
//! `Deserialize`: deserialization must flow through the validator.

use serde::Serialize;

use super::value::DcqlValue;

/// The only credential format this evaluator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialFormat {
    #[serde(rename = "mso_mdoc")]
    MsoMdoc,
}

/// One element of a claims query path, in the DCQL wire grammar.
///
/// mdoc evaluation only ever consumes `Key` elements; the other variants
/// exist so that any syntactically valid DCQL path can be represented.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClaimPathElement {
    Key(String),
    Index(u64),
    Null,
}

impl ClaimPathElement {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) | Self::Null => None,
        }
    }
}

/// A single claim constraint within a credential query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcqlClaimsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    path: Vec<ClaimPathElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<DcqlValue>>,
    intent_to_retain: bool,
}

impl DcqlClaimsQuery {
    pub(crate) fn new(
        id: Option<String>,
        path: Vec<ClaimPathElement>,
        values: Option<Vec<DcqlValue>>,
        intent_to_retain: bool,
    ) -> Self {
        Self {
            id,
            path,
            values,
            intent_to_retain,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn path(&self) -> &[ClaimPathElement] {
        &self.path
    }

    pub fn values(&self) -> Option<&[DcqlValue]> {
        self.values.as_deref()
    }

    pub fn intent_to_retain(&self) -> bool {
        self.intent_to_retain
    }
}

/// An ordered alternative of claim ids that must be satisfied together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DcqlClaimSet(Vec<String>);

impl DcqlClaimSet {
    pub(crate) fn new(ids: Vec<String>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

/// Format-specific metadata of a credential query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcqlMeta {
    doctype_value: String,
}

impl DcqlMeta {
    pub(crate) fn new(doctype_value: String) -> Self {
        Self { doctype_value }
    }

    pub fn doctype_value(&self) -> &str {
        &self.doctype_value
    }
}

/// A request for one credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcqlCredentialQuery {
    id: String,
    format: CredentialFormat,
    meta: DcqlMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    claims: Option<Vec<DcqlClaimsQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    claim_sets: Option<Vec<DcqlClaimSet>>,
    multiple: bool,
}

impl DcqlCredentialQuery {
    pub(crate) fn new(
        id: String,
        meta: DcqlMeta,
        claims: Option<Vec<DcqlClaimsQuery>>,
        claim_sets: Option<Vec<DcqlClaimSet>>,
        multiple: bool,
    ) -> Self {
        Self {
            id,
            format: CredentialFormat::MsoMdoc,
            meta,
            claims,
            claim_sets,
            multiple,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn format(&self) -> CredentialFormat {
        self.format
    }

    pub fn meta(&self) -> &DcqlMeta {
        &self.meta
    }

    pub fn claims(&self) -> Option<&[DcqlClaimsQuery]> {
        self.claims.as_deref()
    }

    pub fn claim_sets(&self) -> Option<&[DcqlClaimSet]> {
        self.claim_sets.as_deref()
    }

    pub fn multiple(&self) -> bool {
        self.multiple
    }
}

/// A set of alternative credential combinations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcqlCredentialSetQuery {
    options: Vec<Vec<String>>,
    required: bool,
}

impl DcqlCredentialSetQuery {
    pub(crate) fn new(options: Vec<Vec<String>>, required: bool) -> Self {
        Self { options, required }
    }

    pub fn options(&self) -> &[Vec<String>] {
        &self.options
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// A complete DCQL query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcqlQuery {
    credentials: Vec<DcqlCredentialQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_sets: Option<Vec<DcqlCredentialSetQuery>>,
}

impl DcqlQuery {
    pub(crate) fn new(
        credentials: Vec<DcqlCredentialQuery>,
        credential_sets: Option<Vec<DcqlCredentialSetQuery>>,
    ) -> Self {
        Self {
            credentials,
            credential_sets,
        }
    }

    pub fn credentials(&self) -> &[DcqlCredentialQuery] {
        &self.credentials
    }

    pub fn credential_sets(&self) -> Option<&[DcqlCredentialSetQuery]> {
        self.credential_sets.as_deref()
    }
}
