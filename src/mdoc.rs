//! Document-side view of an mdoc, as consumed by the DCQL evaluator.
//!
//! The evaluator receives documents as already-parsed, signed structures.
//! It never re-encodes issuer-signed item bytes: tags are shared by
//! reference into filtered documents so the issuer's digest binding stays
//! valid.

use std::{fmt, sync::Arc};

use ciborium::Value as Cbor;
use indexmap::IndexMap;

/// Issuer-signed items grouped by namespace, in insertion order.
pub type IssuerNameSpaces = IndexMap<String, Vec<IssuerSignedItemTag>>;

/// An mdoc document held by the wallet.
///
/// Fields are optional so that a malformed pool entry surfaces as a
/// structured evaluation error rather than a panic.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doc_type: Option<String>,
    pub issuer_signed: Option<IssuerSigned>,
}

impl Document {
    pub fn new(doc_type: impl Into<String>, issuer_signed: IssuerSigned) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            issuer_signed: Some(issuer_signed),
        }
    }
}

/// The issuer-signed portion of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuerSigned {
    pub name_spaces: Option<IssuerNameSpaces>,
    pub issuer_auth: Option<IssuerAuth>,
}

impl IssuerSigned {
    pub fn new(name_spaces: IssuerNameSpaces, issuer_auth: IssuerAuth) -> Self {
        Self {
            name_spaces: Some(name_spaces),
            issuer_auth: Some(issuer_auth),
        }
    }
}

/// The decoded payload of an issuer-signed item tag.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuerSignedItem {
    pub digest_id: u64,
    pub random: Vec<u8>,
    pub element_identifier: String,
    pub element_value: Cbor,
}

/// An issuer-signed item together with the exact bytes the issuer signed.
///
/// Cloning is reference-counted: a tag placed into a filtered document is
/// the same allocation as the tag in the source pool.
#[derive(Clone, PartialEq)]
pub struct IssuerSignedItemTag {
    inner: Arc<TaggedItem>,
}

#[derive(PartialEq)]
struct TaggedItem {
    item: IssuerSignedItem,
    bytes: Vec<u8>,
}

impl IssuerSignedItemTag {
    pub fn new(item: IssuerSignedItem, bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(TaggedItem { item, bytes }),
        }
    }

    /// The decoded item carried by this tag.
    pub fn item(&self) -> &IssuerSignedItem {
        &self.inner.item
    }

    /// The issuer-signed bytes, exactly as covered by the signature.
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Whether two tags are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for IssuerSignedItemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerSignedItemTag")
            .field("element_identifier", &self.inner.item.element_identifier)
            .field("digest_id", &self.inner.item.digest_id)
            .field("bytes", &hex::encode(&self.inner.bytes))
            .finish()
    }
}

/// Opaque COSE_Sign1 produced by the issuer. The evaluator copies it into
/// filtered documents and never looks inside.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuerAuth {
    bytes: Arc<Vec<u8>>,
}

impl IssuerAuth {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for IssuerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IssuerAuth")
            .field(&hex::encode(self.bytes.as_slice()))
            .finish()
    }
}
