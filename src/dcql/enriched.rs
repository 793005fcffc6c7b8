//! Enriched view of a namespace's issuer-signed items.
//!
//! Splits the raw item list into the plain data elements and the
//! `age_over_NN` attestations, pre-sorted so that the tag selector's best
//! match is always the first qualifying entry: ascending for `true`
//! attestations (smallest sufficient proof), descending for `false`
//! (largest sufficient proof).

use ciborium::Value as Cbor;
use indexmap::IndexMap;

use super::age_over::parse_age_over;
use crate::mdoc::{IssuerNameSpaces, IssuerSignedItemTag};

/// An `age_over_NN` attestation and its tag.
#[derive(Debug, Clone)]
pub(crate) struct AgeOverItem {
    pub(crate) nn: u32,
    pub(crate) tag: IssuerSignedItemTag,
}

/// One namespace's items, bucketed for selection.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnrichedNameSpace {
    /// Items that are not age-over attestations, in source order.
    pub(crate) normal_items: Vec<IssuerSignedItemTag>,
    /// `age_over_NN: true` attestations, ascending by `nn`.
    pub(crate) age_over_true_items: Vec<AgeOverItem>,
    /// `age_over_NN: false` attestations, descending by `nn`.
    pub(crate) age_over_false_items: Vec<AgeOverItem>,
}

pub(crate) fn enrich(tags: &[IssuerSignedItemTag]) -> EnrichedNameSpace {
    let mut enriched = EnrichedNameSpace::default();

    for tag in tags {
        let item = tag.item();
        match parse_age_over(&item.element_identifier) {
            None => enriched.normal_items.push(tag.clone()),
            Some(nn) => match item.element_value {
                Cbor::Bool(true) => enriched.age_over_true_items.push(AgeOverItem {
                    nn,
                    tag: tag.clone(),
                }),
                Cbor::Bool(false) => enriched.age_over_false_items.push(AgeOverItem {
                    nn,
                    tag: tag.clone(),
                }),
                _ => {
                    tracing::warn!(
                        identifier = %item.element_identifier,
                        "ignoring age-over item with a non-boolean value"
                    );
                }
            },
        }
    }

    enriched.age_over_true_items.sort_by_key(|item| item.nn);
    enriched
        .age_over_false_items
        .sort_by(|a, b| b.nn.cmp(&a.nn));

    enriched
}

/// Enrich every namespace of a document, preserving namespace order.
pub(crate) fn enrich_name_spaces(
    name_spaces: &IssuerNameSpaces,
) -> IndexMap<String, EnrichedNameSpace> {
    name_spaces
        .iter()
        .map(|(name_space, tags)| (name_space.clone(), enrich(tags)))
        .collect()
}
