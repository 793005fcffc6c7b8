//! Evaluation of credentials, credential sets and whole queries against a
//! document pool.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{
    document_select::select_document,
    error::DcqlError,
    query::{DcqlCredentialQuery, DcqlCredentialSetQuery, DcqlQuery},
};
use crate::mdoc::Document;

/// Filtered documents per credential query id, in credential order.
pub type SelectedCredentials = IndexMap<String, Vec<Document>>;

/// Collect the filtered documents satisfying one credential query.
///
/// The pool is scanned in order; unless the query asks for multiple
/// credentials, the first hit wins.
pub(crate) fn select_credential(
    documents: &[Document],
    credential: &DcqlCredentialQuery,
) -> Result<Vec<Document>, DcqlError> {
    let mut selected = Vec::new();

    for document in documents {
        if let Some(filtered) = select_document(document, credential)? {
            selected.push(filtered);
            if !credential.multiple() {
                break;
            }
        }
    }

    tracing::debug!(
        credential = credential.id(),
        matches = selected.len(),
        "credential query evaluated"
    );

    Ok(selected)
}

/// Evaluate a list of credential queries that must all be satisfied.
/// `Ok(None)` as soon as any of them has no matching document.
pub(crate) fn select_credentials<'a>(
    documents: &[Document],
    credentials: impl IntoIterator<Item = &'a DcqlCredentialQuery>,
) -> Result<Option<SelectedCredentials>, DcqlError> {
    let mut selected = SelectedCredentials::new();

    for credential in credentials {
        let matches = select_credential(documents, credential)?;
        if matches.is_empty() {
            tracing::debug!(
                credential = credential.id(),
                "credential has no matching documents"
            );
            return Ok(None);
        }
        selected.insert(credential.id().to_string(), matches);
    }

    Ok(Some(selected))
}

/// First-match over the options of one credential set.
///
/// Only the no-match outcome advances to the next option; structural
/// errors from the documents or the query propagate so they cannot be
/// masked by fallback. A credential id with no matching credential is a
/// hard error: the query should not have referenced it.
pub(crate) fn select_credential_set(
    documents: &[Document],
    credential_set: &DcqlCredentialSetQuery,
    lookup: &HashMap<&str, &DcqlCredentialQuery>,
) -> Result<Option<SelectedCredentials>, DcqlError> {
    for (index, option) in credential_set.options().iter().enumerate() {
        let resolved = option
            .iter()
            .map(|id| {
                lookup
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| DcqlError::CredentialNotFound(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match select_credentials(documents, resolved)? {
            Some(selected) => return Ok(Some(selected)),
            None => {
                tracing::debug!(option = index, "credential set option unsatisfied, trying next");
            }
        }
    }

    if credential_set.is_required() {
        let options = serde_json::to_string(credential_set.options()).unwrap_or_default();
        return Err(DcqlError::RequiredCredentialSetUnsatisfied(options));
    }

    Ok(None)
}

impl DcqlQuery {
    /// Evaluate this query against a pool of documents.
    ///
    /// Returns the filtered documents per credential query id, `Ok(None)`
    /// when the query has no credential sets and some credential went
    /// unmatched, or an error for malformed inputs. With credential sets
    /// the result map is always produced, possibly empty when every set
    /// was optional and unmatched.
    pub fn select(&self, documents: &[Document]) -> Result<Option<SelectedCredentials>, DcqlError> {
        tracing::debug!(
            credentials = self.credentials().len(),
            documents = documents.len(),
            "evaluating DCQL query"
        );

        let Some(credential_sets) = self.credential_sets() else {
            return select_credentials(documents, self.credentials());
        };

        let lookup: HashMap<&str, &DcqlCredentialQuery> = self
            .credentials()
            .iter()
            .map(|credential| (credential.id(), credential))
            .collect();

        let mut selected = SelectedCredentials::new();
        for credential_set in credential_sets {
            if let Some(matches) = select_credential_set(documents, credential_set, &lookup)? {
                for (id, documents) in matches {
                    selected.insert(id, documents);
                }
            }
        }

        Ok(Some(selected))
    }
}

#[cfg(test)]
mod test {
    use ciborium::Value as Cbor;

    use super::*;
    use crate::dcql::query::{ClaimPathElement, DcqlClaimsQuery, DcqlMeta};
    use crate::mdoc::{IssuerAuth, IssuerSigned, IssuerSignedItem, IssuerSignedItemTag};

    const MDL_DOCTYPE: &str = "org.iso.18013.5.1.mDL";
    const MDL_NAMESPACE: &str = "org.iso.18013.5.1";

    fn tag(identifier: &str, value: Cbor) -> IssuerSignedItemTag {
        IssuerSignedItemTag::new(
            IssuerSignedItem {
                digest_id: 0,
                random: vec![0; 8],
                element_identifier: identifier.to_string(),
                element_value: value,
            },
            vec![0xd8, 0x18],
        )
    }

    fn document(doctype: &str, identifier: &str, value: &str) -> Document {
        Document::new(
            doctype,
            IssuerSigned::new(
                [(
                    MDL_NAMESPACE.to_string(),
                    vec![tag(identifier, Cbor::Text(value.into()))],
                )]
                .into_iter()
                .collect(),
                IssuerAuth::new(vec![0x84]),
            ),
        )
    }

    fn credential(id: &str, doctype: &str, identifier: &str, multiple: bool) -> DcqlCredentialQuery {
        DcqlCredentialQuery::new(
            id.to_string(),
            DcqlMeta::new(doctype.to_string()),
            Some(vec![DcqlClaimsQuery::new(
                None,
                vec![
                    ClaimPathElement::Key(MDL_NAMESPACE.to_string()),
                    ClaimPathElement::Key(identifier.to_string()),
                ],
                None,
                false,
            )]),
            None,
            multiple,
        )
    }

    #[test]
    fn single_semantics_stop_at_the_first_hit() {
        let pool = vec![
            document(MDL_DOCTYPE, "given_name", "John"),
            document(MDL_DOCTYPE, "given_name", "Johanna"),
        ];
        let single = credential("cred-1", MDL_DOCTYPE, "given_name", false);
        assert_eq!(select_credential(&pool, &single).unwrap().len(), 1);

        let multiple = credential("cred-1", MDL_DOCTYPE, "given_name", true);
        assert_eq!(select_credential(&pool, &multiple).unwrap().len(), 2);
    }

    #[test]
    fn any_unmatched_credential_fails_the_whole_list() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let credentials = vec![
            credential("cred-1", MDL_DOCTYPE, "given_name", false),
            credential("cred-2", MDL_DOCTYPE, "portrait", false),
        ];
        assert!(select_credentials(&pool, &credentials).unwrap().is_none());
    }

    #[test]
    fn matched_credentials_are_keyed_by_id_in_order() {
        let pool = vec![
            document(MDL_DOCTYPE, "given_name", "John"),
            document("org.iso.23220.photoid.1", "family_name", "Doe"),
        ];
        let credentials = vec![
            credential("photo-id", "org.iso.23220.photoid.1", "family_name", false),
            credential("mdl", MDL_DOCTYPE, "given_name", false),
        ];
        let selected = select_credentials(&pool, &credentials).unwrap().unwrap();
        let keys: Vec<&str> = selected.keys().map(String::as_str).collect();
        assert_eq!(keys, ["photo-id", "mdl"]);
        assert_eq!(selected["mdl"].len(), 1);
    }

    fn lookup<'a>(
        credentials: &'a [DcqlCredentialQuery],
    ) -> HashMap<&'a str, &'a DcqlCredentialQuery> {
        credentials
            .iter()
            .map(|credential| (credential.id(), credential))
            .collect()
    }

    #[test]
    fn credential_set_takes_the_first_satisfied_option() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let credentials = vec![
            credential("unmatched", MDL_DOCTYPE, "portrait", false),
            credential("matched", MDL_DOCTYPE, "given_name", false),
        ];
        let set = DcqlCredentialSetQuery::new(
            vec![vec!["unmatched".into()], vec!["matched".into()]],
            true,
        );

        let selected = select_credential_set(&pool, &set, &lookup(&credentials))
            .unwrap()
            .unwrap();
        assert!(selected.contains_key("matched"));
        assert!(!selected.contains_key("unmatched"));
    }

    #[test]
    fn unknown_credential_id_is_a_hard_error() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let credentials = vec![credential("cred-1", MDL_DOCTYPE, "given_name", false)];
        let set = DcqlCredentialSetQuery::new(vec![vec!["ghost".into()]], false);

        assert_eq!(
            select_credential_set(&pool, &set, &lookup(&credentials)).unwrap_err(),
            DcqlError::CredentialNotFound("ghost".into())
        );
    }

    #[test]
    fn exhausted_required_set_is_an_error_embedding_the_options() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let credentials = vec![credential("cred-1", MDL_DOCTYPE, "portrait", false)];
        let set = DcqlCredentialSetQuery::new(vec![vec!["cred-1".into()]], true);

        let error = select_credential_set(&pool, &set, &lookup(&credentials)).unwrap_err();
        match &error {
            DcqlError::RequiredCredentialSetUnsatisfied(options) => {
                assert_eq!(options, "[[\"cred-1\"]]");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(error.code(), 2024);
    }

    #[test]
    fn exhausted_optional_set_is_a_quiet_no_match() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let credentials = vec![credential("cred-1", MDL_DOCTYPE, "portrait", false)];
        let set = DcqlCredentialSetQuery::new(vec![vec!["cred-1".into()]], false);

        assert!(select_credential_set(&pool, &set, &lookup(&credentials))
            .unwrap()
            .is_none());
    }

    #[test]
    fn malformed_documents_propagate_through_credential_sets() {
        let mut broken = document(MDL_DOCTYPE, "given_name", "John");
        broken.doc_type = None;
        let pool = vec![broken];

        let credentials = vec![credential("cred-1", MDL_DOCTYPE, "given_name", false)];
        // Even an optional set must not swallow a malformed document.
        let set = DcqlCredentialSetQuery::new(vec![vec!["cred-1".into()]], false);

        assert_eq!(
            select_credential_set(&pool, &set, &lookup(&credentials)).unwrap_err(),
            DcqlError::DocTypeMissing
        );
    }

    fn query_with_sets(
        credentials: Vec<DcqlCredentialQuery>,
        sets: Vec<DcqlCredentialSetQuery>,
    ) -> DcqlQuery {
        DcqlQuery::new(credentials, Some(sets))
    }

    #[test]
    fn required_set_failure_stops_later_sets() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let query = query_with_sets(
            vec![
                credential("unmatched", MDL_DOCTYPE, "portrait", false),
                credential("matched", MDL_DOCTYPE, "given_name", false),
            ],
            vec![
                DcqlCredentialSetQuery::new(vec![vec!["unmatched".into()]], true),
                // Would match, but must never be evaluated.
                DcqlCredentialSetQuery::new(vec![vec!["matched".into()]], false),
            ],
        );

        let error = query.select(&pool).unwrap_err();
        assert!(matches!(
            error,
            DcqlError::RequiredCredentialSetUnsatisfied(_)
        ));
    }

    #[test]
    fn optional_sets_may_leave_the_result_empty() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let query = query_with_sets(
            vec![credential("unmatched", MDL_DOCTYPE, "portrait", false)],
            vec![DcqlCredentialSetQuery::new(
                vec![vec!["unmatched".into()]],
                false,
            )],
        );

        let selected = query.select(&pool).unwrap().unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn later_sets_overwrite_earlier_entries_for_the_same_credential() {
        let pool = vec![
            document(MDL_DOCTYPE, "given_name", "John"),
            document(MDL_DOCTYPE, "given_name", "Johanna"),
        ];
        let single = credential("cred-1", MDL_DOCTYPE, "given_name", false);
        let multiple = DcqlCredentialQuery::new(
            "cred-1".to_string(),
            DcqlMeta::new(MDL_DOCTYPE.to_string()),
            single.claims().map(<[_]>::to_vec),
            None,
            true,
        );

        // Two sets resolving the same credential id; the query's lookup maps
        // the id to the `multiple` variant, so both sets see two documents.
        let query = query_with_sets(
            vec![multiple],
            vec![
                DcqlCredentialSetQuery::new(vec![vec!["cred-1".into()]], true),
                DcqlCredentialSetQuery::new(vec![vec!["cred-1".into()]], true),
            ],
        );

        let selected = query.select(&pool).unwrap().unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected["cred-1"].len(), 2);
    }

    #[test]
    fn same_pool_can_fail_flat_but_succeed_with_optional_sets() {
        let pool = vec![document(MDL_DOCTYPE, "given_name", "John")];
        let credentials = vec![
            credential("matched", MDL_DOCTYPE, "given_name", false),
            credential("unmatched", MDL_DOCTYPE, "portrait", false),
        ];

        let flat = DcqlQuery::new(credentials.clone(), None);
        assert!(flat.select(&pool).unwrap().is_none());

        let with_sets = query_with_sets(
            credentials,
            vec![
                DcqlCredentialSetQuery::new(vec![vec!["matched".into()]], true),
                DcqlCredentialSetQuery::new(vec![vec!["unmatched".into()]], false),
            ],
        );
        let selected = with_sets.select(&pool).unwrap().unwrap();
        assert_eq!(selected.len(), 1);
        assert!(selected.contains_key("matched"));
    }
}
