//! Validation of untrusted JSON into the typed query model.
//!
//! The validator walks the input recursively, collecting every
//! discoverable issue instead of stopping at the first one. Cross-field
//! rules on a credential (claim-set referential integrity) run as a
//! refinement step after the credential's structural checks, so both kinds
//! of issue can appear for the same input, structural first.

use std::fmt;

use itertools::Itertools;
use serde_json::Value as Json;
use thiserror::Error;

use super::{
    query::{
        ClaimPathElement, DcqlClaimSet, DcqlClaimsQuery, DcqlCredentialQuery,
        DcqlCredentialSetQuery, DcqlMeta, DcqlQuery,
    },
    value::DcqlValue,
};

/// One step into the offending location: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.iter().join("."), self.message)
        }
    }
}

/// All issues found in one validation pass, in discovery order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid DCQL query: {}", .0.iter().join("; "))]
pub struct IssueList(Vec<Issue>);

impl IssueList {
    pub fn issues(&self) -> &[Issue] {
        &self.0
    }
}

impl DcqlQuery {
    /// Validate untrusted JSON into a query. All issues are reported, with
    /// paths rooted at the query object.
    pub fn parse(value: &Json) -> Result<Self, IssueList> {
        let mut issues = Vec::new();
        let query = parse_query(value, &[], &mut issues);
        match query {
            Some(query) if issues.is_empty() => Ok(query),
            _ => Err(IssueList(issues)),
        }
    }
}

impl DcqlCredentialQuery {
    /// Validate a single credential query, with paths rooted at the
    /// credential object.
    pub fn parse(value: &Json) -> Result<Self, IssueList> {
        let mut issues = Vec::new();
        let credential = parse_credential(value, &[], &mut issues);
        match credential {
            Some(credential) if issues.is_empty() => Ok(credential),
            _ => Err(IssueList(issues)),
        }
    }
}

const REQUIRED: &str = "Required";

fn type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn expected(expected: &str, received: &Json) -> String {
    format!("Expected {expected}, received {}", type_name(received))
}

fn child(path: &[PathSegment], segment: impl Into<PathSegment>) -> Vec<PathSegment> {
    let mut child = path.to_vec();
    child.push(segment.into());
    child
}

fn parse_query(value: &Json, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<DcqlQuery> {
    let Json::Object(object) = value else {
        issues.push(Issue::new(path.to_vec(), expected("object", value)));
        return None;
    };

    let credentials = match object.get("credentials") {
        None => {
            issues.push(Issue::new(child(path, "credentials"), REQUIRED));
            None
        }
        Some(value) => parse_array(
            value,
            &child(path, "credentials"),
            Some(1),
            None,
            issues,
            parse_credential,
        ),
    };

    let credential_sets = match object.get("credential_sets") {
        None => Some(None),
        Some(value) => parse_array(
            value,
            &child(path, "credential_sets"),
            Some(1),
            None,
            issues,
            parse_credential_set,
        )
        .map(Some),
    };

    Some(DcqlQuery::new(credentials?, credential_sets?))
}

fn parse_credential(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<DcqlCredentialQuery> {
    let Json::Object(object) = value else {
        issues.push(Issue::new(path.to_vec(), expected("object", value)));
        return None;
    };

    let id = parse_required(object, "id", path, issues, parse_nonempty_string);

    match object.get("format") {
        None => issues.push(Issue::new(child(path, "format"), REQUIRED)),
        Some(Json::String(format)) if format == "mso_mdoc" => {}
        Some(_) => issues.push(Issue::new(
            child(path, "format"),
            "Invalid literal value, expected \"mso_mdoc\"",
        )),
    }

    let meta = parse_required(object, "meta", path, issues, parse_meta);

    let claims = match object.get("claims") {
        None => Some(None),
        Some(value) => parse_array(
            value,
            &child(path, "claims"),
            Some(1),
            None,
            issues,
            parse_claim,
        )
        .map(Some),
    };

    let claim_sets = match object.get("claim_sets") {
        None => Some(None),
        Some(value) => parse_array(
            value,
            &child(path, "claim_sets"),
            Some(1),
            None,
            issues,
            parse_claim_set,
        )
        .map(Some),
    };

    let multiple = parse_bool_or_default(object, "multiple", false, path, issues);

    refine_credential(object, path, issues);

    Some(DcqlCredentialQuery::new(
        id?,
        meta?,
        claims?,
        claim_sets?,
        multiple?,
    ))
}

/// Claim-set referential integrity, checked on the raw object so it also
/// runs when the structural pass failed elsewhere in the credential.
fn refine_credential(
    object: &serde_json::Map<String, Json>,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) {
    let Some(claim_sets) = object.get("claim_sets") else {
        return;
    };

    let Some(claims) = object.get("claims") else {
        issues.push(Issue::new(
            child(path, "claim_sets"),
            "claim_sets MUST NOT be present if claims is absent.",
        ));
        return;
    };

    let known_ids: Vec<&str> = claims
        .as_array()
        .map(|claims| {
            claims
                .iter()
                .filter_map(|claim| claim.get("id").and_then(Json::as_str))
                .collect()
        })
        .unwrap_or_default();

    let Some(claim_sets) = claim_sets.as_array() else {
        return;
    };

    for (set_index, set) in claim_sets.iter().enumerate() {
        let Some(set) = set.as_array() else {
            continue;
        };
        for (id_index, id) in set.iter().enumerate() {
            let Some(id) = id.as_str() else {
                continue;
            };
            if !known_ids.contains(&id) {
                let mut issue_path = child(path, "claim_sets");
                issue_path.push(set_index.into());
                issue_path.push(id_index.into());
                issues.push(Issue::new(
                    issue_path,
                    format!(
                        "Claim ID \"{id}\" referenced in claim_sets[{set_index}][{id_index}] \
                         does not exist in claims array"
                    ),
                ));
            }
        }
    }
}

fn parse_meta(value: &Json, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<DcqlMeta> {
    let Json::Object(object) = value else {
        issues.push(Issue::new(path.to_vec(), expected("object", value)));
        return None;
    };

    let doctype_value = parse_required(object, "doctype_value", path, issues, parse_nonempty_string);

    Some(DcqlMeta::new(doctype_value?))
}

fn parse_claim(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<DcqlClaimsQuery> {
    let Json::Object(object) = value else {
        issues.push(Issue::new(path.to_vec(), expected("object", value)));
        return None;
    };

    let id = match object.get("id") {
        None => Some(None),
        Some(value) => parse_nonempty_string(value, &child(path, "id"), issues).map(Some),
    };

    let claim_path = match object.get("path") {
        None => {
            issues.push(Issue::new(child(path, "path"), REQUIRED));
            None
        }
        Some(value) => parse_array(
            value,
            &child(path, "path"),
            Some(2),
            Some(2),
            issues,
            parse_path_element,
        ),
    };

    let values = match object.get("values") {
        None => Some(None),
        Some(value) => {
            parse_array(value, &child(path, "values"), None, None, issues, parse_value).map(Some)
        }
    };

    let intent_to_retain = parse_bool_or_default(object, "intent_to_retain", false, path, issues);

    Some(DcqlClaimsQuery::new(
        id?,
        claim_path?,
        values?,
        intent_to_retain?,
    ))
}

fn parse_path_element(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<ClaimPathElement> {
    match value {
        Json::String(_) => {
            parse_nonempty_string(value, path, issues).map(ClaimPathElement::Key)
        }
        Json::Number(number) => {
            if let Some(index) = number.as_u64() {
                Some(ClaimPathElement::Index(index))
            } else if number.is_i64() {
                issues.push(Issue::new(
                    path.to_vec(),
                    "Number must be greater than or equal to 0",
                ));
                None
            } else {
                issues.push(Issue::new(path.to_vec(), "Expected integer, received float"));
                None
            }
        }
        Json::Null => Some(ClaimPathElement::Null),
        other => {
            issues.push(Issue::new(path.to_vec(), expected("string", other)));
            None
        }
    }
}

fn parse_value(value: &Json, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<DcqlValue> {
    match DcqlValue::from_json(value) {
        Some(value) => Some(value),
        None => {
            issues.push(Issue::new(
                path.to_vec(),
                expected("string | number | boolean | null", value),
            ));
            None
        }
    }
}

fn parse_claim_set(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<DcqlClaimSet> {
    parse_array(value, path, Some(1), None, issues, parse_nonempty_string).map(DcqlClaimSet::new)
}

fn parse_credential_set(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<DcqlCredentialSetQuery> {
    let Json::Object(object) = value else {
        issues.push(Issue::new(path.to_vec(), expected("object", value)));
        return None;
    };

    let options = match object.get("options") {
        None => {
            issues.push(Issue::new(child(path, "options"), REQUIRED));
            None
        }
        Some(value) => parse_array(
            value,
            &child(path, "options"),
            Some(1),
            None,
            issues,
            parse_option,
        ),
    };

    let required = parse_bool_or_default(object, "required", true, path, issues);

    Some(DcqlCredentialSetQuery::new(options?, required?))
}

fn parse_option(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<Vec<String>> {
    parse_array(value, path, Some(1), None, issues, parse_string)
}

fn parse_string(value: &Json, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<String> {
    match value {
        Json::String(string) => Some(string.clone()),
        other => {
            issues.push(Issue::new(path.to_vec(), expected("string", other)));
            None
        }
    }
}

fn parse_nonempty_string(
    value: &Json,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<String> {
    let string = parse_string(value, path, issues)?;
    if string.is_empty() {
        issues.push(Issue::new(
            path.to_vec(),
            "String must contain at least 1 character(s)",
        ));
        return None;
    }
    Some(string)
}

fn parse_bool_or_default(
    object: &serde_json::Map<String, Json>,
    key: &str,
    default: bool,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<bool> {
    match object.get(key) {
        None => Some(default),
        Some(Json::Bool(value)) => Some(*value),
        Some(other) => {
            issues.push(Issue::new(child(path, key), expected("boolean", other)));
            None
        }
    }
}

fn parse_required<T>(
    object: &serde_json::Map<String, Json>,
    key: &str,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
    parse: impl FnOnce(&Json, &[PathSegment], &mut Vec<Issue>) -> Option<T>,
) -> Option<T> {
    match object.get(key) {
        None => {
            issues.push(Issue::new(child(path, key), REQUIRED));
            None
        }
        Some(value) => parse(value, &child(path, key), issues),
    }
}

fn parse_array<T>(
    value: &Json,
    path: &[PathSegment],
    min: Option<usize>,
    max: Option<usize>,
    issues: &mut Vec<Issue>,
    mut parse_item: impl FnMut(&Json, &[PathSegment], &mut Vec<Issue>) -> Option<T>,
) -> Option<Vec<T>> {
    let Json::Array(items) = value else {
        issues.push(Issue::new(path.to_vec(), expected("array", value)));
        return None;
    };

    let mut in_bounds = true;
    if let Some(min) = min {
        if items.len() < min {
            issues.push(Issue::new(
                path.to_vec(),
                format!("Array must contain at least {min} element(s)"),
            ));
            in_bounds = false;
        }
    }
    if let Some(max) = max {
        if items.len() > max {
            issues.push(Issue::new(
                path.to_vec(),
                format!("Array must contain at most {max} element(s)"),
            ));
            in_bounds = false;
        }
    }

    let parsed: Vec<Option<T>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(item, &child(path, index), issues))
        .collect();

    if !in_bounds {
        return None;
    }
    parsed.into_iter().collect()
}
