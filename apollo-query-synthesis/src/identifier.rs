use serde_json::Value;

use crate::configuration::Identifiers;
use crate::type_config::TypeConfigMap;

/// Encodes caller supplied identifiers into the literal form their scalar type accepts.
#[derive(Debug, Clone)]
pub struct IdentifierCodec<'a> {
    identifiers: &'a Identifiers,
    type_configs: &'a TypeConfigMap,
}

impl<'a> IdentifierCodec<'a> {
    pub fn new(identifiers: &'a Identifiers, type_configs: &'a TypeConfigMap) -> Self {
        Self {
            identifiers,
            type_configs,
        }
    }

    /// Encodes `raw` for `scalar_type`.
    ///
    /// A value coercion configured for the scalar type always wins. Otherwise pass-through
    /// scalars keep the value as is and every other scalar gets strings that parse as integers
    /// turned into integers. Strings that do not parse are returned unchanged.
    pub fn encode(&self, scalar_type: &str, raw: &Value) -> Value {
        if let Some(encoded) = self
            .type_configs
            .get(scalar_type)
            .and_then(|config| config.coerce_input_value(raw))
        {
            return encoded;
        }
        let lowered = scalar_type.to_lowercase();
        if self
            .identifiers
            .passthrough_scalars
            .iter()
            .any(|scalar| scalar.to_lowercase() == lowered)
        {
            return raw.clone();
        }
        match raw {
            Value::String(string) => string
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| raw.clone()),
            _ => raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::type_config::TypeConfig;

    #[rstest]
    #[case("UUID", json!("02d07429-c2a7-4494-aec9-e8bde9176e86"), json!("02d07429-c2a7-4494-aec9-e8bde9176e86"))]
    #[case("Uuid", json!("1"), json!("1"))]
    #[case("String", json!("1"), json!("1"))]
    #[case("ID", json!("1"), json!("1"))]
    #[case("Int", json!("1"), json!(1))]
    #[case("Int", json!("abc"), json!("abc"))]
    #[case("Int", json!(5), json!(5))]
    #[case("BigInt", json!("9007199254740993"), json!(9007199254740993_i64))]
    #[case("Unmapped", json!("12"), json!(12))]
    #[case("Unmapped", json!("1.5"), json!("1.5"))]
    fn encodes_by_scalar(#[case] scalar: &str, #[case] raw: Value, #[case] expected: Value) {
        let identifiers = Identifiers::default();
        let type_configs = TypeConfigMap::new();
        let codec = IdentifierCodec::new(&identifiers, &type_configs);
        assert_eq!(codec.encode(scalar, &raw), expected);
    }

    #[test]
    fn passthrough_is_idempotent() {
        let identifiers = Identifiers::default();
        let type_configs = TypeConfigMap::new();
        let codec = IdentifierCodec::new(&identifiers, &type_configs);
        let once = codec.encode("UUID", &json!("a-b"));
        assert_eq!(codec.encode("UUID", &once), once);
    }

    #[test]
    fn configured_coercion_wins() {
        let identifiers = Identifiers::default();
        let type_configs = TypeConfigMap::new().with(
            "Mapped",
            TypeConfig::new().query_value_to_input_value(|value| json!({ "wrapped": value })),
        );
        let codec = IdentifierCodec::new(&identifiers, &type_configs);
        assert_eq!(codec.encode("Mapped", &json!("1")), json!({ "wrapped": "1" }));
    }
}
