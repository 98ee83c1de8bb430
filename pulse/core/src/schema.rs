//! Response Schema Validator
//!
//! Turns an arbitrary decoded JSON value into a typed entity, or reports the
//! first field that does not match the expected shape. Validation is
//! all-or-nothing: a payload is either accepted whole or rejected with a
//! [`SchemaError`] naming the offending field path (wire names, dotted, with
//! array indices, e.g. `data.data[2].source`).
//!
//! Nothing here performs I/O.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    ChatExchange, DataPoint, DataSource, HealthStatus, MetadataValue, Mood, MoodSnapshot,
    PulseHistory,
};

/// Why a field was rejected
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaErrorKind {
    /// Required field absent
    MissingField,
    /// Present but of the wrong JSON type or format
    WrongType {
        /// What was expected
        expected: &'static str,
    },
    /// Numeric value outside its allowed range
    OutOfRange {
        /// Value received
        value: f64,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },
    /// String outside a closed set of tags
    InvalidEnum {
        /// Value received
        value: String,
        /// Accepted tags
        allowed: &'static [&'static str],
    },
}

impl std::fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField => write!(f, "missing field"),
            Self::WrongType { expected } => write!(f, "wrong type, expected {expected}"),
            Self::OutOfRange { value, min, max } => {
                write!(f, "value {value} out of range [{min}, {max}]")
            }
            Self::InvalidEnum { value, allowed } => {
                write!(f, "invalid value {value:?}, expected one of {}", allowed.join(", "))
            }
        }
    }
}

/// A payload failed validation at `field`
#[derive(Clone, Debug, Error, PartialEq)]
pub struct SchemaError {
    /// Dotted path of the offending field (empty for the document root)
    pub field: String,
    /// What was wrong with it
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    /// Create an error for the given path
    pub fn new(field: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "(root): {}", self.kind)
        } else {
            write!(f, "{}: {}", self.field, self.kind)
        }
    }
}

/// Location of a value inside a payload
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    /// The document root
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Path of a named child
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    /// Path of an array element
    #[must_use]
    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{i}]", self.0))
    }

    /// The path as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn error(&self, kind: SchemaErrorKind) -> SchemaError {
        SchemaError::new(self.0.clone(), kind)
    }

    fn wrong_type(&self, expected: &'static str) -> SchemaError {
        self.error(SchemaErrorKind::WrongType { expected })
    }
}

/// Entities that can be built from an untrusted JSON value
pub trait Validate: Sized {
    /// Validate `value` (located at `path`) and build the entity
    fn validate(value: &Value, path: &FieldPath) -> Result<Self, SchemaError>;
}

/// Validate a `{success, data, message}` envelope and extract `data`
pub fn validate_envelope<T: Validate>(value: &Value) -> Result<T, SchemaError> {
    let root = FieldPath::root();
    let obj = Obj::new(value, &root)?;
    obj.bool("success")?;
    obj.string("message")?;
    T::validate(obj.required("data")?, &root.field("data"))
}

/// Parse a response body and validate it as an envelope
pub fn decode_envelope<T: Validate>(body: &[u8]) -> Result<T, SchemaError> {
    let value = parse_json(body)?;
    validate_envelope(&value)
}

/// Parse a response body and validate it as a bare entity
pub fn decode<T: Validate>(body: &[u8]) -> Result<T, SchemaError> {
    let value = parse_json(body)?;
    T::validate(&value, &FieldPath::root())
}

fn parse_json(body: &[u8]) -> Result<Value, SchemaError> {
    serde_json::from_slice(body).map_err(|_| FieldPath::root().wrong_type("JSON document"))
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS[.f]` date-time
#[must_use]
pub fn is_iso8601(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Borrowed view of a JSON object with typed accessors
struct Obj<'a> {
    map: &'a Map<String, Value>,
    path: &'a FieldPath,
}

impl<'a> Obj<'a> {
    fn new(value: &'a Value, path: &'a FieldPath) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            _ => Err(path.wrong_type("object")),
        }
    }

    fn required(&self, name: &str) -> Result<&'a Value, SchemaError> {
        self.map
            .get(name)
            .ok_or_else(|| self.path.field(name).error(SchemaErrorKind::MissingField))
    }

    fn bool(&self, name: &str) -> Result<bool, SchemaError> {
        self.required(name)?
            .as_bool()
            .ok_or_else(|| self.path.field(name).wrong_type("boolean"))
    }

    fn string(&self, name: &str) -> Result<String, SchemaError> {
        self.required(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.path.field(name).wrong_type("string"))
    }

    fn timestamp(&self, name: &str) -> Result<String, SchemaError> {
        let s = self.string(name)?;
        if is_iso8601(&s) {
            Ok(s)
        } else {
            Err(self.path.field(name).wrong_type("ISO-8601 timestamp"))
        }
    }

    fn number(&self, name: &str) -> Result<f64, SchemaError> {
        self.required(name)?
            .as_f64()
            .ok_or_else(|| self.path.field(name).wrong_type("number"))
    }

    fn unit_interval(&self, name: &str) -> Result<f64, SchemaError> {
        let value = self.number(name)?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(self.path.field(name).error(SchemaErrorKind::OutOfRange {
                value,
                min: 0.0,
                max: 1.0,
            }))
        }
    }

    fn count(&self, name: &str) -> Result<u64, SchemaError> {
        self.required(name)?
            .as_u64()
            .ok_or_else(|| self.path.field(name).wrong_type("non-negative integer"))
    }

    fn array(&self, name: &str) -> Result<&'a Vec<Value>, SchemaError> {
        self.required(name)?
            .as_array()
            .ok_or_else(|| self.path.field(name).wrong_type("array"))
    }

    fn strings(&self, name: &str) -> Result<Vec<String>, SchemaError> {
        let field = self.path.field(name);
        self.array(name)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| field.index(i).wrong_type("string"))
            })
            .collect()
    }

    fn tag<T>(
        &self,
        name: &str,
        allowed: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, SchemaError> {
        let s = self.string(name)?;
        parse(&s).ok_or_else(|| {
            self.path
                .field(name)
                .error(SchemaErrorKind::InvalidEnum { value: s, allowed })
        })
    }
}

impl Validate for MoodSnapshot {
    fn validate(value: &Value, path: &FieldPath) -> Result<Self, SchemaError> {
        let obj = Obj::new(value, path)?;
        Ok(Self {
            mood: obj.tag("mood", &Mood::TAGS, Mood::from_tag)?,
            score: obj.unit_interval("score")?,
            timestamp: obj.timestamp("timestamp")?,
            predictive_statement: obj.string("predictive_statement")?,
            confidence: obj.unit_interval("confidence")?,
            factors: obj.strings("factors")?,
            trend: obj.string("trend")?,
            next_update: obj.timestamp("next_update")?,
        })
    }
}

impl Validate for DataPoint {
    fn validate(value: &Value, path: &FieldPath) -> Result<Self, SchemaError> {
        let obj = Obj::new(value, path)?;
        let metadata = match obj.map.get("metadata") {
            None => None,
            Some(value) => Some(validate_metadata(value, &path.field("metadata"))?),
        };

        Ok(Self {
            timestamp: obj.timestamp("timestamp")?,
            value: obj.number("value")?,
            unit: obj.string("unit")?,
            source: obj.tag("source", &DataSource::TAGS, DataSource::from_tag)?,
            confidence: obj.unit_interval("confidence")?,
            metadata,
        })
    }
}

fn validate_metadata(
    value: &Value,
    path: &FieldPath,
) -> Result<BTreeMap<String, MetadataValue>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(path.wrong_type("object"));
    };

    map.iter()
        .map(|(key, v)| {
            let scalar = match v {
                Value::Null => MetadataValue::Null,
                Value::Bool(b) => MetadataValue::Bool(*b),
                Value::Number(n) => MetadataValue::Number(n.clone()),
                Value::String(s) => MetadataValue::Text(s.clone()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(path.field(key).wrong_type("scalar"));
                }
            };
            Ok((key.clone(), scalar))
        })
        .collect()
}

impl Validate for PulseHistory {
    fn validate(value: &Value, path: &FieldPath) -> Result<Self, SchemaError> {
        let obj = Obj::new(value, path)?;
        let items = obj.array("data")?;
        let items_path = path.field("data");
        let points = items
            .iter()
            .enumerate()
            .map(|(i, item)| DataPoint::validate(item, &items_path.index(i)))
            .collect::<Result<Vec<_>, _>>()?;

        let period = obj.string("period")?;
        let aggregation = obj.string("aggregation")?;
        let total_points = obj.count("total_points")?;

        let actual = points.len() as u64;
        if total_points != actual {
            return Err(path.field("total_points").error(SchemaErrorKind::OutOfRange {
                value: total_points as f64,
                min: actual as f64,
                max: actual as f64,
            }));
        }

        Ok(Self {
            points,
            period,
            aggregation,
            total_points,
        })
    }
}

impl Validate for ChatExchange {
    fn validate(value: &Value, path: &FieldPath) -> Result<Self, SchemaError> {
        let obj = Obj::new(value, path)?;
        Ok(Self {
            response: obj.string("response")?,
            confidence: obj.unit_interval("confidence")?,
            sources: obj.strings("sources")?,
            suggestions: obj.strings("suggestions")?,
            timestamp: obj.timestamp("timestamp")?,
        })
    }
}

impl Validate for HealthStatus {
    fn validate(value: &Value, path: &FieldPath) -> Result<Self, SchemaError> {
        let obj = Obj::new(value, path)?;

        // The service reports its check time as epoch seconds or a string
        let timestamp = match obj.required("timestamp")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(path.field("timestamp").wrong_type("string or number")),
        };

        let services_path = path.field("services");
        let Value::Object(map) = obj.required("services")? else {
            return Err(services_path.wrong_type("object"));
        };
        let services = map
            .iter()
            .map(|(name, v)| {
                v.as_str()
                    .map(|s| (name.clone(), s.to_string()))
                    .ok_or_else(|| services_path.field(name).wrong_type("string"))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            status: obj.string("status")?,
            timestamp,
            version: obj.string("version")?,
            uptime: obj.number("uptime")?,
            services,
        })
    }
}
