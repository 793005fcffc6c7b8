//! Primitive DCQL values.

use ciborium::Value as Cbor;
use serde::Serialize;
use serde_json::Value as Json;

/// A primitive value in a DCQL claims query. No containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DcqlValue {
    String(String),
    Integer(i64),
    Double(f64),
    Bool(bool),
    Null,
}

impl DcqlValue {
    /// Lift a JSON primitive. Arrays and objects have no DCQL value form.
    pub(crate) fn from_json(value: &Json) -> Option<Self> {
        match value {
            Json::String(s) => Some(Self::String(s.clone())),
            Json::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Double(n.as_f64()?),
            }),
            Json::Bool(b) => Some(Self::Bool(*b)),
            Json::Null => Some(Self::Null),
            Json::Array(_) | Json::Object(_) => None,
        }
    }

    /// Deep equality against a decoded element value.
    ///
    /// CBOR tags are transparent, and integer and float renditions of the
    /// same number are equal, matching the single number type of the wire
    /// form.
    pub(crate) fn matches_element(&self, element_value: &Cbor) -> bool {
        match (self, element_value) {
            (_, Cbor::Tag(_, inner)) => self.matches_element(inner),
            (Self::String(s), Cbor::Text(t)) => s == t,
            (Self::Bool(b), Cbor::Bool(v)) => b == v,
            (Self::Null, Cbor::Null) => true,
            (Self::Integer(i), Cbor::Integer(v)) => i128::from(*v) == i128::from(*i),
            (Self::Integer(i), Cbor::Float(f)) => *i as f64 == *f,
            (Self::Double(d), Cbor::Float(f)) => d == f,
            (Self::Double(d), Cbor::Integer(v)) => i128::from(*v) as f64 == *d,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::text(DcqlValue::String("CA".into()), Cbor::Text("CA".into()), true)]
    #[case::text_mismatch(DcqlValue::String("CA".into()), Cbor::Text("NY".into()), false)]
    #[case::bool(DcqlValue::Bool(true), Cbor::Bool(true), true)]
    #[case::bool_mismatch(DcqlValue::Bool(true), Cbor::Bool(false), false)]
    #[case::null(DcqlValue::Null, Cbor::Null, true)]
    #[case::integer(DcqlValue::Integer(21), Cbor::Integer(21.into()), true)]
    #[case::integer_vs_float(DcqlValue::Integer(21), Cbor::Float(21.0), true)]
    #[case::double_vs_integer(DcqlValue::Double(21.0), Cbor::Integer(21.into()), true)]
    #[case::double_fraction(DcqlValue::Double(21.5), Cbor::Integer(21.into()), false)]
    #[case::text_vs_bool(DcqlValue::String("true".into()), Cbor::Bool(true), false)]
    fn element_matching(#[case] value: DcqlValue, #[case] element: Cbor, #[case] expected: bool) {
        assert_eq!(value.matches_element(&element), expected);
    }

    #[test]
    fn tags_are_transparent() {
        let tagged = Cbor::Tag(1004, Box::new(Cbor::Text("1990-01-01".into())));
        assert!(DcqlValue::String("1990-01-01".into()).matches_element(&tagged));
    }

    #[test]
    fn from_json_rejects_containers() {
        assert_eq!(DcqlValue::from_json(&serde_json::json!([1])), None);
        assert_eq!(DcqlValue::from_json(&serde_json::json!({})), None);
        assert_eq!(
            DcqlValue::from_json(&serde_json::json!(18)),
            Some(DcqlValue::Integer(18))
        );
        assert_eq!(
            DcqlValue::from_json(&serde_json::json!(1.5)),
            Some(DcqlValue::Double(1.5))
        );
    }

    #[test]
    fn serializes_as_json_primitives() {
        let values = vec![
            DcqlValue::String("a".into()),
            DcqlValue::Integer(1),
            DcqlValue::Bool(false),
            DcqlValue::Null,
        ];
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"["a",1,false,null]"#
        );
    }
}
