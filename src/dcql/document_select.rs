//! Filtering of a single document against a single credential query.

use super::{error::DcqlError, namespace_select::select_issuer_name_spaces, query::DcqlCredentialQuery};
use crate::mdoc::{Document, IssuerNameSpaces, IssuerSigned};

/// Produce the filtered document for one credential query, or `None` when
/// the document is not for this credential or cannot satisfy its claims.
///
/// The filtered document carries the original `issuer_auth` and shares the
/// selected tags with the input, so the issuer's signature stays valid.
pub(crate) fn select_document(
    document: &Document,
    credential: &DcqlCredentialQuery,
) -> Result<Option<Document>, DcqlError> {
    let Some(doc_type) = document.doc_type.as_deref() else {
        return Err(DcqlError::DocTypeMissing);
    };

    if doc_type != credential.meta().doctype_value() {
        tracing::debug!(
            doc_type,
            requested = credential.meta().doctype_value(),
            "document type does not match the credential query"
        );
        return Ok(None);
    }

    let Some(issuer_signed) = &document.issuer_signed else {
        return Err(DcqlError::IssuerSignedMissing);
    };
    let Some(issuer_auth) = &issuer_signed.issuer_auth else {
        return Err(DcqlError::IssuerAuthMissing);
    };

    let selected = match credential.claims() {
        // No claims requested: the filtered document discloses nothing but
        // still carries the issuer auth.
        None => {
            let empty = IssuerNameSpaces::new();
            select_issuer_name_spaces(&empty, None, credential.claim_sets())?
        }
        Some(claims) => {
            let Some(name_spaces) = &issuer_signed.name_spaces else {
                return Err(DcqlError::IssuerNameSpacesMissing);
            };
            select_issuer_name_spaces(name_spaces, Some(claims), credential.claim_sets())?
        }
    };

    Ok(selected.map(|name_spaces| {
        Document::new(doc_type, IssuerSigned::new(name_spaces, issuer_auth.clone()))
    }))
}
