//! `serde` glue for the in-memory document.
//!
//! A node serializes as a map with a `name`, optional `attributes`, and at
//! most one of `value`, `object` or `array`:
//!
//! ```json
//! { "name": "point", "object": [ { "name": "x", "value": 3 } ] }
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_core::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};

use crate::archive::scalar::non_finite_token;
use crate::archive::{Content, Node, ParseError, ParseResult, Scalar};

// -----------------------------------------------------------------------------
// Scalar

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::UInt(value) => serializer.serialize_u64(*value),
            Self::Float(value) => match non_finite_token(*value) {
                Some(token) => serializer.serialize_str(token),
                None => serializer.serialize_f64(*value),
            },
            Self::Text(value) => serializer.serialize_str(value),
        }
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a boolean, number or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        Ok(Scalar::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar::Text(String::from(v)))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar::Text(v))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

// -----------------------------------------------------------------------------
// Node

struct Attributes<'a>(&'a [(String, Scalar)]);

impl Serialize for Attributes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_attributes = !self.attributes().is_empty();
        let has_content = !matches!(self.content(), Content::Empty);
        let len = 1 + usize::from(has_attributes) + usize::from(has_content);

        let mut state = serializer.serialize_struct("Node", len)?;
        state.serialize_field("name", self.name())?;
        if has_attributes {
            state.serialize_field("attributes", &Attributes(self.attributes()))?;
        } else {
            state.skip_field("attributes")?;
        }
        match self.content() {
            Content::Empty => state.skip_field("value")?,
            Content::Scalar(value) => state.serialize_field("value", value)?,
            Content::Object(children) => state.serialize_field("object", children)?,
            Content::Array(children) => state.serialize_field("array", children)?,
        }
        state.end()
    }
}

const FIELDS: &[&str] = &["name", "attributes", "value", "object", "array"];

enum Field {
    Name,
    Attributes,
    Value,
    Object,
    Array,
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl Visitor<'_> for FieldVisitor {
            type Value = Field;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a node field")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Field, E> {
                match v {
                    "name" => Ok(Field::Name),
                    "attributes" => Ok(Field::Attributes),
                    "value" => Ok(Field::Value),
                    "object" => Ok(Field::Object),
                    "array" => Ok(Field::Array),
                    _ => Err(de::Error::unknown_field(v, FIELDS)),
                }
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = Vec<(String, Scalar)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of attributes")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut attributes = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, value)) = map.next_entry::<String, Scalar>()? {
            attributes.push((name, value));
        }
        Ok(attributes)
    }
}

struct AttributesSeed;

impl<'de> de::DeserializeSeed<'de> for AttributesSeed {
    type Value = Vec<(String, Scalar)>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(AttributesVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a document node")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut name: Option<String> = None;
        let mut attributes = Vec::new();
        let mut content: Option<Content> = None;

        while let Some(field) = map.next_key::<Field>()? {
            let next = match field {
                Field::Name => {
                    if name.is_some() {
                        return Err(de::Error::duplicate_field("name"));
                    }
                    name = Some(map.next_value()?);
                    continue;
                }
                Field::Attributes => {
                    attributes = map.next_value_seed(AttributesSeed)?;
                    continue;
                }
                Field::Value => Content::Scalar(map.next_value()?),
                Field::Object => Content::Object(map.next_value()?),
                Field::Array => Content::Array(map.next_value()?),
            };
            if content.is_some() {
                return Err(de::Error::custom("a node holds at most one of value, object or array"));
            }
            content = Some(next);
        }

        let name = name.ok_or_else(|| de::Error::missing_field("name"))?;
        let mut node = Node::new(name).with_content(content.unwrap_or_default());
        for (key, value) in attributes {
            node.set_attribute(key, value);
        }
        Ok(node)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct("Node", FIELDS, NodeVisitor)
    }
}

// -----------------------------------------------------------------------------
// Parsing

impl Node {
    /// Parses a document from any `serde` deserializer.
    ///
    /// `locate` extracts the `(line, column)` of a failure from the format's
    /// error; formats without positions may return `(0, 0)`.
    pub fn parse<'de, D: Deserializer<'de>>(
        deserializer: D,
        locate: impl FnOnce(&D::Error) -> (usize, usize),
    ) -> ParseResult<Self> {
        Self::deserialize(deserializer).map_err(|err| {
            let (line, column) = locate(&err);
            ParseError::new(err.to_string(), line, column)
        })
    }

    /// Parses a JSON document.
    ///
    /// # Examples
    ///
    /// ```
    /// use weave_reflect::archive::Node;
    ///
    /// let node = Node::from_json(r#"{"name":"n","value":1}"#).unwrap();
    /// assert_eq!(node.name(), "n");
    ///
    /// let err = Node::from_json("{\n  \"name\": ").unwrap_err();
    /// assert_eq!(err.line, 2);
    /// ```
    #[cfg(feature = "json")]
    pub fn from_json(text: &str) -> ParseResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let node = Self::deserialize(&mut deserializer).map_err(json_error)?;
        deserializer.end().map_err(json_error)?;
        Ok(node)
    }
}

#[cfg(feature = "json")]
fn json_error(err: serde_json::Error) -> ParseError {
    // The position is kept in the fields, not in the message.
    let message = err.to_string();
    let message = match message.rsplit_once(" at line ") {
        Some((head, _)) => head,
        None => &message,
    };
    ParseError::new(message, err.line(), err.column())
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::archive::{Node, Scalar};

    #[test]
    fn json_round_trip() {
        let node = Node::object(
            "root",
            vec![
                Node::scalar("flag", true),
                Node::scalar("ratio", 0.25),
                Node::array("list", vec![Node::scalar("item", -3_i64)]),
                Node::new("empty"),
            ],
        )
        .with_attribute("version", 1_u64);

        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn json_shape() {
        let node = Node::object("p", vec![Node::scalar("x", "a")]);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"name":"p","object":[{"name":"x","value":"a"}]}"#.to_string()
        );
    }

    #[test]
    fn rejects_two_contents() {
        let json = r#"{"name":"p","value":1,"array":[]}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());

        let json = r#"{"value":1}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }

    #[test]
    fn unsigned_comes_back_unsigned() {
        let back: Node = serde_json::from_str(r#"{"name":"n","value":3}"#).unwrap();
        assert_eq!(back.value(), Some(&Scalar::UInt(3)));
    }

    #[test]
    fn non_finite_floats_survive_json() {
        let node = Node::array(
            "list",
            vec![
                Node::scalar("item", f64::NAN),
                Node::scalar("item", f64::INFINITY),
                Node::scalar("item", f64::NEG_INFINITY),
            ],
        );
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains(r#""value":"NaN""#));

        let back: Node = serde_json::from_str(&json).unwrap();
        let values: Vec<f64> = back
            .children()
            .iter()
            .map(|child| child.value().unwrap().as_f64().unwrap())
            .collect();
        assert!(values[0].is_nan());
        assert_eq!(values[1..], [f64::INFINITY, f64::NEG_INFINITY]);

        assert!(Scalar::Text("nan".to_string()).as_f64().is_err());
    }

    #[test]
    fn parse_reports_the_position() {
        let mut deserializer = serde_json::Deserializer::from_str(r#"{"name": 5}"#);
        let err = Node::parse(&mut deserializer, |err| (err.line(), err.column())).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column > 0);

        let mut deserializer = serde_json::Deserializer::from_str(r#"{"name":"n"}"#);
        let node = Node::parse(&mut deserializer, |_| (0, 0)).unwrap();
        assert_eq!(node.name(), "n");
    }

    #[cfg(feature = "json")]
    #[test]
    fn from_json_rejects_trailing_input() {
        let err = Node::from_json("{\"name\":\"n\"}\n]").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(!err.message.contains("at line"));

        let err = Node::from_json("[").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
