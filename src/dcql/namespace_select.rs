//! Application of claim constraints to the namespaces of one document.
//!
//! Two failure channels are kept apart throughout: per-claim failures mean
//! "this document cannot satisfy this claim list" and drive claim-set
//! fallback or a quiet no-match, while hard errors indicate a malformed
//! query or document and always propagate.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{
    enriched::{enrich_name_spaces, EnrichedNameSpace},
    error::DcqlError,
    query::{ClaimPathElement, DcqlClaimSet, DcqlClaimsQuery},
    tag_select::select_tag,
};
use crate::mdoc::IssuerNameSpaces;

/// A claim that this document cannot satisfy.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ClaimFailure {
    NameSpaceMissing(String),
    DataElementMissing(String),
    PathInvalid,
}

impl From<ClaimFailure> for DcqlError {
    fn from(failure: ClaimFailure) -> Self {
        match failure {
            ClaimFailure::NameSpaceMissing(name_space) => {
                DcqlError::ClaimNameSpaceMissing(name_space)
            }
            ClaimFailure::DataElementMissing(identifier) => {
                DcqlError::ClaimDataElementMissing(identifier)
            }
            ClaimFailure::PathInvalid => DcqlError::ClaimPathInvalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SelectionError {
    /// A claim went unsatisfied; claim-set evaluation falls back on these.
    Claim(ClaimFailure),
    /// Never triggers fallback.
    Hard(DcqlError),
}

fn path_element_name(element: &ClaimPathElement) -> String {
    match element {
        ClaimPathElement::Key(key) => key.clone(),
        ClaimPathElement::Index(index) => index.to_string(),
        ClaimPathElement::Null => "null".to_string(),
    }
}

/// Apply a list of claims in order, returning the retained tags per
/// namespace. Namespaces appear in first-reference order and accumulate a
/// tag per resolving claim, without deduplication.
pub(crate) fn select_claims<'a>(
    enriched: &IndexMap<String, EnrichedNameSpace>,
    claims: impl IntoIterator<Item = &'a DcqlClaimsQuery>,
) -> Result<IssuerNameSpaces, SelectionError> {
    let mut selected = IssuerNameSpaces::new();

    for claim in claims {
        let [name_space_element, identifier_element] = claim.path() else {
            return Err(SelectionError::Claim(ClaimFailure::PathInvalid));
        };

        let name_space = path_element_name(name_space_element);
        let Some(name_space_items) = name_space_element
            .as_key()
            .and_then(|key| enriched.get(key))
        else {
            return Err(SelectionError::Claim(ClaimFailure::NameSpaceMissing(
                name_space,
            )));
        };

        let identifier = path_element_name(identifier_element);
        let tag = match identifier_element.as_key() {
            None => None,
            Some(identifier) => select_tag(identifier, claim.values(), name_space_items)
                .map_err(SelectionError::Hard)?,
        };
        let Some(tag) = tag else {
            return Err(SelectionError::Claim(ClaimFailure::DataElementMissing(
                identifier,
            )));
        };

        selected.entry(name_space).or_default().push(tag);
    }

    Ok(selected)
}

/// First-match over ordered claim sets. A set whose claims cannot be
/// satisfied falls through to the next; exhausting every set is a quiet
/// no-match. A claim id with no matching claim is a hard error: the schema
/// refinement rules it out, so reaching it means a logic bug upstream.
pub(crate) fn select_claim_sets(
    enriched: &IndexMap<String, EnrichedNameSpace>,
    claims: &[DcqlClaimsQuery],
    claim_sets: &[DcqlClaimSet],
) -> Result<Option<IssuerNameSpaces>, DcqlError> {
    let lookup: HashMap<&str, &DcqlClaimsQuery> = claims
        .iter()
        .filter_map(|claim| claim.id().map(|id| (id, claim)))
        .collect();

    for (index, claim_set) in claim_sets.iter().enumerate() {
        let resolved = claim_set
            .ids()
            .iter()
            .map(|id| {
                lookup
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| DcqlError::ClaimNotFound(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match select_claims(enriched, resolved) {
            Ok(selected) => return Ok(Some(selected)),
            Err(SelectionError::Claim(failure)) => {
                tracing::debug!(claim_set = index, ?failure, "claim set unsatisfied, trying next");
            }
            Err(SelectionError::Hard(error)) => return Err(error),
        }
    }

    Ok(None)
}

/// Unified name-space selection for one document (§ single credential).
///
/// `Ok(None)` means the document does not match; errors mean the query or
/// document is malformed and must not be masked by fallback.
pub(crate) fn select_issuer_name_spaces(
    name_spaces: &IssuerNameSpaces,
    claims: Option<&[DcqlClaimsQuery]>,
    claim_sets: Option<&[DcqlClaimSet]>,
) -> Result<Option<IssuerNameSpaces>, DcqlError> {
    let Some(claims) = claims else {
        return match claim_sets {
            None => Ok(Some(IssuerNameSpaces::new())),
            Some(_) => Err(DcqlError::ClaimSetsPresentWhenClaimsAbsent),
        };
    };

    let enriched = enrich_name_spaces(name_spaces);

    match claim_sets {
        None => match select_claims(&enriched, claims) {
            Ok(selected) => Ok(Some(selected)),
            Err(SelectionError::Claim(
                ClaimFailure::NameSpaceMissing(_) | ClaimFailure::DataElementMissing(_),
            )) => Ok(None),
            Err(SelectionError::Claim(failure @ ClaimFailure::PathInvalid)) => Err(
                DcqlError::IssuerNameSpacesSelectionFailed(DcqlError::from(failure).to_string()),
            ),
            Err(SelectionError::Hard(error)) => Err(DcqlError::IssuerNameSpacesSelectionFailed(
                error.to_string(),
            )),
        },
        Some(claim_sets) => select_claim_sets(&enriched, claims, claim_sets)
            .map_err(|error| DcqlError::IssuerNameSpacesSelectionFailed(error.to_string())),
    }
}
