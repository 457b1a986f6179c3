//! Search domains.
//!
//! Callers hand us filters in three shapes: a list of `[field, operator, value]`
//! triples, an object of the form `{"conditions": [{"field", "operator",
//! "value"}, ...]}`, or JSON text encoding either one. [`DomainInput`] names
//! those shapes and [`normalize`] collapses them into a [`Domain`], which is
//! the only filter type the remote client accepts.
//!
//! A domain is a logical AND of its conditions, in order. Normalization never
//! reorders, deduplicates or drops conditions; anything it cannot map onto a
//! triple is rejected with [`OdooError::InvalidDomain`].

use serde::ser::{Serialize, SerializeSeq, SerializeTuple, Serializer};
use serde_json::{Map, Value};

use crate::errors::OdooError;

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self { field: field.into(), operator: operator.into(), value: value.into() }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut triple = serializer.serialize_tuple(3)?;
        triple.serialize_element(&self.field)?;
        triple.serialize_element(&self.operator)?;
        triple.serialize_element(&self.value)?;
        triple.end()
    }
}

/// Canonical filter: an ordered AND of condition triples. The empty domain
/// matches every record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Domain {
    conditions: Vec<Condition>,
}

impl Domain {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition::new(field, operator, value));
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Wire form: `[[field, operator, value], ...]`.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.conditions
                .iter()
                .map(|condition| {
                    Value::Array(vec![
                        Value::String(condition.field.clone()),
                        Value::String(condition.operator.clone()),
                        condition.value.clone(),
                    ])
                })
                .collect(),
        )
    }

    pub fn parse(text: &str) -> Result<Self, OdooError> {
        normalize(DomainInput::Text(text.to_owned()))
    }

    pub fn from_value(value: Value) -> Result<Self, OdooError> {
        normalize(DomainInput::try_from(value)?)
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.conditions.len()))?;
        for condition in &self.conditions {
            seq.serialize_element(condition)?;
        }
        seq.end()
    }
}

impl FromIterator<Condition> for Domain {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self { conditions: iter.into_iter().collect() }
    }
}

/// The accepted external shapes of a domain, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainInput {
    /// JSON text encoding one of the other two shapes.
    Text(String),
    /// `[[field, operator, value], ...]`
    Triples(Vec<Value>),
    /// `{"conditions": [{"field": .., "operator": .., "value": ..}, ...]}`
    Conditions(Map<String, Value>),
}

impl TryFrom<Value> for DomainInput {
    type Error = OdooError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(items) => Ok(Self::Triples(items)),
            Value::Object(object) => Ok(Self::Conditions(object)),
            other => Err(OdooError::InvalidDomain(format!(
                "expected a list of triples, a conditions object or JSON text, got `{other}`"
            ))),
        }
    }
}

pub fn normalize(input: DomainInput) -> Result<Domain, OdooError> {
    match input {
        DomainInput::Text(text) => normalize_structured(decode_text(&text)?),
        DomainInput::Triples(items) => normalize_triples(items),
        DomainInput::Conditions(object) => normalize_conditions(object),
    }
}

fn decode_text(text: &str) -> Result<Value, OdooError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        OdooError::InvalidDomain(format!("domain text `{text}` is not valid JSON: {error}"))
    })
}

// Decoded text must be structured; JSON text nested in JSON text is refused.
fn normalize_structured(value: Value) -> Result<Domain, OdooError> {
    match value {
        Value::Array(items) => normalize_triples(items),
        Value::Object(object) => normalize_conditions(object),
        other => Err(OdooError::InvalidDomain(format!(
            "decoded domain must be a list or a conditions object, got `{other}`"
        ))),
    }
}

fn normalize_triples(items: Vec<Value>) -> Result<Domain, OdooError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| triple_to_condition(index, item))
        .collect()
}

fn triple_to_condition(index: usize, item: Value) -> Result<Condition, OdooError> {
    let rejected = |item: &Value| {
        OdooError::InvalidDomain(format!(
            "condition #{index} must be a [field, operator, value] triple, got `{item}`"
        ))
    };

    let Value::Array(parts) = &item else {
        return Err(rejected(&item));
    };
    match parts.as_slice() {
        [Value::String(field), Value::String(operator), value] => {
            Ok(Condition::new(field.clone(), operator.clone(), value.clone()))
        }
        _ => Err(rejected(&item)),
    }
}

fn normalize_conditions(object: Map<String, Value>) -> Result<Domain, OdooError> {
    if !object.contains_key("conditions") {
        return Err(OdooError::InvalidDomain(format!(
            "domain object must contain a `conditions` list, got `{}`",
            Value::Object(object)
        )));
    }
    let conditions = &object["conditions"];
    let Value::Array(conditions) = conditions else {
        return Err(OdooError::InvalidDomain(format!(
            "`conditions` must be a list, got `{conditions}`"
        )));
    };

    conditions
        .iter()
        .enumerate()
        .map(|(index, condition)| object_to_condition(index, condition))
        .collect()
}

fn object_to_condition(index: usize, condition: &Value) -> Result<Condition, OdooError> {
    let rejected = || {
        OdooError::InvalidDomain(format!(
            "condition #{index} must be an object with string `field`, string `operator` \
             and a `value`, got `{condition}`"
        ))
    };

    let object = condition.as_object().ok_or_else(rejected)?;
    let field = object.get("field").and_then(Value::as_str).ok_or_else(rejected)?;
    let operator = object.get("operator").and_then(Value::as_str).ok_or_else(rejected)?;
    let value = object.get("value").ok_or_else(rejected)?;

    Ok(Condition::new(field, operator, value.clone()))
}
