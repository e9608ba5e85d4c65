use std::fmt;

use bson::oid::ObjectId;
use bson::{DateTime, Uuid};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::FilterError;

const DATE_TAG: &str = "$date";
const UUID_TAG: &str = "$uuid";
const OBJECT_ID_TAG: &str = "$objectId";

/// The kind of an operand, used for type-directed matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonType {
    Number,
    String,
    Boolean,
    Null,
    Date,
    Array,
    SubDoc,
    DocumentId,
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
            JsonType::Date => "date",
            JsonType::Array => "array",
            JsonType::SubDoc => "sub-document",
            JsonType::DocumentId => "document id",
        };
        f.write_str(name)
    }
}

/// A decoded filter operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonLiteral {
    Number(Number),
    String(String),
    Boolean(bool),
    Null,
    Date(DateTime),
    Array(Vec<JsonLiteral>),
    SubDoc(Map<String, Value>),
    DocumentId(DocumentId),
}

impl JsonLiteral {
    /// Decode a JSON value, turning extended-JSON tags into native values.
    ///
    /// `$uuid` and `$objectId` outside the identity field become their
    /// canonical string form.
    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        let literal = match value {
            Value::Null => JsonLiteral::Null,
            Value::Bool(b) => JsonLiteral::Boolean(*b),
            Value::Number(n) => JsonLiteral::Number(n.clone()),
            Value::String(s) => JsonLiteral::String(s.clone()),
            Value::Array(items) => JsonLiteral::Array(
                items
                    .iter()
                    .map(JsonLiteral::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(obj) => match ExtendedJson::decode(obj) {
                Some(ext) => match ext? {
                    ExtendedJson::Date(dt) => JsonLiteral::Date(dt),
                    ExtendedJson::Uuid(uuid) => JsonLiteral::String(uuid.to_string()),
                    ExtendedJson::ObjectId(oid) => JsonLiteral::String(oid.to_hex()),
                },
                None => JsonLiteral::SubDoc(obj.clone()),
            },
        };
        Ok(literal)
    }

    pub fn json_type(&self) -> JsonType {
        match self {
            JsonLiteral::Number(_) => JsonType::Number,
            JsonLiteral::String(_) => JsonType::String,
            JsonLiteral::Boolean(_) => JsonType::Boolean,
            JsonLiteral::Null => JsonType::Null,
            JsonLiteral::Date(_) => JsonType::Date,
            JsonLiteral::Array(_) => JsonType::Array,
            JsonLiteral::SubDoc(_) => JsonType::SubDoc,
            JsonLiteral::DocumentId(_) => JsonType::DocumentId,
        }
    }
}

impl fmt::Display for JsonLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonLiteral::Number(n) => write!(f, "{n}"),
            JsonLiteral::String(s) => write!(f, "{s:?}"),
            JsonLiteral::Boolean(b) => write!(f, "{b}"),
            JsonLiteral::Null => f.write_str("null"),
            JsonLiteral::Date(dt) => write!(f, "{{\"$date\":{}}}", dt.timestamp_millis()),
            JsonLiteral::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            JsonLiteral::SubDoc(doc) => write!(f, "{}", Value::Object(doc.clone())),
            JsonLiteral::DocumentId(id) => write!(f, "{id}"),
        }
    }
}

/// A value usable as a document identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentId {
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
    Date(DateTime),
    Uuid(Uuid),
    ObjectId(ObjectId),
}

impl DocumentId {
    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        match value {
            Value::String(s) => Ok(DocumentId::String(s.clone())),
            Value::Number(n) => Ok(DocumentId::Number(n.clone())),
            Value::Bool(b) => Ok(DocumentId::Boolean(*b)),
            Value::Null => Ok(DocumentId::Null),
            Value::Object(obj) => match ExtendedJson::decode(obj) {
                Some(ext) => Ok(match ext? {
                    ExtendedJson::Date(dt) => DocumentId::Date(dt),
                    ExtendedJson::Uuid(uuid) => DocumentId::Uuid(uuid),
                    ExtendedJson::ObjectId(oid) => DocumentId::ObjectId(oid),
                }),
                None => Err(FilterError::InvalidDocumentId(format!(
                    "sub-document is not a valid id: {value}"
                ))),
            },
            Value::Array(_) => Err(FilterError::InvalidDocumentId(format!(
                "array is not a valid id: {value}"
            ))),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::String(s) => write!(f, "{s:?}"),
            DocumentId::Number(n) => write!(f, "{n}"),
            DocumentId::Boolean(b) => write!(f, "{b}"),
            DocumentId::Null => f.write_str("null"),
            DocumentId::Date(dt) => write!(f, "{{\"$date\":{}}}", dt.timestamp_millis()),
            DocumentId::Uuid(uuid) => write!(f, "{{\"$uuid\":\"{uuid}\"}}"),
            DocumentId::ObjectId(oid) => write!(f, "{{\"$objectId\":\"{}\"}}", oid.to_hex()),
        }
    }
}

/// A recognized extended-JSON wrapper such as `{"$date": 1700000000000}`.
enum ExtendedJson {
    Date(DateTime),
    Uuid(Uuid),
    ObjectId(ObjectId),
}

impl ExtendedJson {
    /// `None` when the object is not a single-key extended-JSON wrapper.
    fn decode(obj: &Map<String, Value>) -> Option<Result<Self, FilterError>> {
        if obj.len() != 1 {
            return None;
        }
        let (tag, value) = obj.iter().next()?;
        match tag.as_str() {
            DATE_TAG => Some(decode_date(value).map(ExtendedJson::Date)),
            UUID_TAG => Some(decode_uuid(value).map(ExtendedJson::Uuid)),
            OBJECT_ID_TAG => Some(decode_object_id(value).map(ExtendedJson::ObjectId)),
            _ => None,
        }
    }
}

/// True when `obj` is a single-key extended-JSON wrapper.
pub(crate) fn is_extended_json(obj: &Map<String, Value>) -> bool {
    obj.len() == 1
        && obj
            .keys()
            .all(|k| matches!(k.as_str(), DATE_TAG | UUID_TAG | OBJECT_ID_TAG))
}

fn decode_date(value: &Value) -> Result<DateTime, FilterError> {
    let millis = match value {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => Some(ms),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64),
        },
        _ => None,
    };
    millis.map(DateTime::from_millis).ok_or_else(|| {
        FilterError::InvalidExtendedJson(format!(
            "'{DATE_TAG}' requires an integral epoch milliseconds number, got {value}"
        ))
    })
}

fn decode_uuid(value: &Value) -> Result<Uuid, FilterError> {
    let text = value.as_str().ok_or_else(|| {
        FilterError::InvalidExtendedJson(format!("'{UUID_TAG}' requires a string, got {value}"))
    })?;
    Uuid::parse_str(text).map_err(|e| {
        FilterError::InvalidExtendedJson(format!("'{UUID_TAG}' value {text:?} is invalid: {e}"))
    })
}

fn decode_object_id(value: &Value) -> Result<ObjectId, FilterError> {
    let text = value.as_str().ok_or_else(|| {
        FilterError::InvalidExtendedJson(format!(
            "'{OBJECT_ID_TAG}' requires a string, got {value}"
        ))
    })?;
    ObjectId::parse_str(text).map_err(|e| {
        FilterError::InvalidExtendedJson(format!(
            "'{OBJECT_ID_TAG}' value {text:?} is invalid: {e}"
        ))
    })
}
