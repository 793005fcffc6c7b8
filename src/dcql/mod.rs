//! DCQL query model and evaluation.
//!
//! A query enters through [`DcqlQuery::parse`], which validates untrusted
//! JSON and reports every issue it finds. A validated query is evaluated
//! against a document pool with [`DcqlQuery::select`], which returns the
//! filtered documents per credential query id.

mod age_over;
mod credential_select;
mod document_select;
mod enriched;
mod namespace_select;
mod tag_select;

pub mod error;
pub mod query;
pub mod schema;
pub mod value;

pub use credential_select::SelectedCredentials;
pub use error::DcqlError;
pub use query::{
    ClaimPathElement, CredentialFormat, DcqlClaimSet, DcqlClaimsQuery, DcqlCredentialQuery,
    DcqlCredentialSetQuery, DcqlMeta, DcqlQuery,
};
pub use schema::{Issue, IssueList, PathSegment};
pub use value::DcqlValue;
