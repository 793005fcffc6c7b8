//! DCQL query evaluation for ISO mDL / mdoc credentials.
//!
//! Given a DCQL query and a pool of held mdoc documents, the evaluator
//! decides which documents satisfy the query and produces filtered
//! documents that expose only the requested data elements, sharing the
//! issuer-signed item tags with the pool so the issuer's signature stays
//! valid.

pub mod dcql;
pub mod mdoc;

pub use dcql::{DcqlError, DcqlQuery, IssueList, SelectedCredentials};
pub use mdoc::{Document, IssuerAuth, IssuerSigned, IssuerSignedItem, IssuerSignedItemTag};
