//! Selection of a single issuer-signed item tag for one requested data
//! element.

use super::{
    age_over::{parse_age_over, AGE_OVER_PREFIX},
    enriched::{AgeOverItem, EnrichedNameSpace},
    error::DcqlError,
    value::DcqlValue,
};
use crate::mdoc::IssuerSignedItemTag;

/// Pick the tag that best satisfies one requested data element, or `None`
/// if the namespace holds no satisfying item.
pub(crate) fn select_tag(
    requested_identifier: &str,
    requested_values: Option<&[DcqlValue]>,
    enriched: &EnrichedNameSpace,
) -> Result<Option<IssuerSignedItemTag>, DcqlError> {
    if !requested_identifier.starts_with(AGE_OVER_PREFIX) {
        return Ok(select_normal(
            requested_identifier,
            requested_values,
            &enriched.normal_items,
        ));
    }

    let requested_nn = parse_age_over(requested_identifier)
        .ok_or_else(|| DcqlError::InvalidAgeOverFormat(requested_identifier.to_string()))?;

    select_age_over(requested_nn, requested_values, enriched)
}

/// Exact-identifier selection. Only the first item with the requested
/// identifier is considered; when values are requested, that item's value
/// must be among them.
fn select_normal(
    requested_identifier: &str,
    requested_values: Option<&[DcqlValue]>,
    normal_items: &[IssuerSignedItemTag],
) -> Option<IssuerSignedItemTag> {
    let tag = normal_items
        .iter()
        .find(|tag| tag.item().element_identifier == requested_identifier)?;

    match requested_values {
        None => Some(tag.clone()),
        Some(values) => values
            .iter()
            .any(|value| value.matches_element(&tag.item().element_value))
            .then(|| tag.clone()),
    }
}

/// Age-over selection per ISO 18013-5 §7.2.5.
///
/// Without requested values, the document may answer with a different
/// threshold: the smallest `true` attestation at or above the requested
/// age, then the largest `false` attestation at or below it. With
/// requested values only the exact threshold qualifies.
fn select_age_over(
    requested_nn: u32,
    requested_values: Option<&[DcqlValue]>,
    enriched: &EnrichedNameSpace,
) -> Result<Option<IssuerSignedItemTag>, DcqlError> {
    let Some(values) = requested_values else {
        // The buckets are pre-sorted, so the first qualifying entry is the
        // privacy-minimal disclosure.
        if let Some(item) = enriched
            .age_over_true_items
            .iter()
            .find(|item| item.nn >= requested_nn)
        {
            return Ok(Some(item.tag.clone()));
        }
        if let Some(item) = enriched
            .age_over_false_items
            .iter()
            .find(|item| item.nn <= requested_nn)
        {
            return Ok(Some(item.tag.clone()));
        }
        return Ok(None);
    };

    let [DcqlValue::Bool(requested)] = values else {
        return Err(DcqlError::InvalidAgeOverRequestedValues);
    };

    let bucket: &[AgeOverItem] = if *requested {
        &enriched.age_over_true_items
    } else {
        &enriched.age_over_false_items
    };

    Ok(bucket
        .iter()
        .find(|item| item.nn == requested_nn)
        .map(|item| item.tag.clone()))
}
