//! Declarative parameter schemas and the validator that turns raw JSON into a [`ParamSet`].
//!
//! Validation is total and deterministic:
//! 1. fields are checked in declaration order (type, then range/enum), with configured defaults
//!    layered beneath user values and schema defaults filling whatever is still absent;
//! 2. undeclared keys are rejected;
//! 3. cross-field rules run last, in declaration order.
//!
//! The first violation wins.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::foundation::error::{DegradeError, DegradeResult, FieldViolation};

/// Raw, unvalidated parameters as received from a request.
pub type RawParams = Map<String, Value>;

/// A validated scalar parameter value.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Whole number.
    Int(i64),
    /// Finite real number.
    Float(f64),
    /// Canonical lowercase choice.
    Text(String),
}

impl ParamValue {
    /// Numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => Value::from(*v),
            Self::Text(v) => Value::String(v.clone()),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// Declared type of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "allowed_values")]
pub enum ParamKind {
    /// `true` or `false`.
    Bool,
    /// Integer; JSON floats with no fractional part are accepted.
    Int,
    /// Finite number.
    Float,
    /// One of a fixed set of lowercase strings (matched case-insensitively).
    Choice(&'static [&'static str]),
}

/// One end of a numeric range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// The bound itself is allowed.
    Inclusive(f64),
    /// The bound itself is rejected.
    Exclusive(f64),
}

/// Declared parameter: type, default, range, and whether it must be supplied.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Declared type.
    pub kind: ParamKind,
    /// Value used when the field is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    /// Lower bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Bound>,
    /// Upper bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
    /// Absence is a `missing` violation.
    pub required: bool,
}

impl ParamSpec {
    fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            min: None,
            max: None,
            required: false,
        }
    }

    /// Boolean field.
    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, ParamKind::Bool)
    }

    /// Integer field.
    pub fn int(name: &'static str) -> Self {
        Self::new(name, ParamKind::Int)
    }

    /// Float field.
    pub fn float(name: &'static str) -> Self {
        Self::new(name, ParamKind::Float)
    }

    /// Field restricted to `allowed` lowercase strings.
    pub fn choice(name: &'static str, allowed: &'static [&'static str]) -> Self {
        Self::new(name, ParamKind::Choice(allowed))
    }

    /// Set the schema default.
    pub fn default(mut self, v: impl Into<ParamValue>) -> Self {
        self.default = Some(v.into());
        self
    }

    /// Inclusive range `[lo, hi]`.
    pub fn range(mut self, lo: f64, hi: f64) -> Self {
        self.min = Some(Bound::Inclusive(lo));
        self.max = Some(Bound::Inclusive(hi));
        self
    }

    /// Set the lower bound.
    pub fn min(mut self, bound: Bound) -> Self {
        self.min = Some(bound);
        self
    }

    /// Set the upper bound.
    pub fn max(mut self, bound: Bound) -> Self {
        self.max = Some(bound);
        self
    }

    /// Require the field.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn coerce(&self, raw: &Value) -> Result<ParamValue, FieldViolation> {
        let bad_type = || FieldViolation::invalid_type(self.name);
        let value = match self.kind {
            ParamKind::Bool => ParamValue::Bool(raw.as_bool().ok_or_else(bad_type)?),
            ParamKind::Int => {
                if let Some(v) = raw.as_i64() {
                    ParamValue::Int(v)
                } else {
                    let v = raw.as_f64().ok_or_else(bad_type)?;
                    if !v.is_finite() || v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
                        return Err(bad_type());
                    }
                    ParamValue::Int(v as i64)
                }
            }
            ParamKind::Float => {
                let v = raw.as_f64().ok_or_else(bad_type)?;
                if !v.is_finite() {
                    return Err(FieldViolation::out_of_range(self.name));
                }
                ParamValue::Float(v)
            }
            ParamKind::Choice(allowed) => {
                let s = raw.as_str().ok_or_else(bad_type)?.trim().to_ascii_lowercase();
                let canonical = allowed
                    .iter()
                    .find(|a| **a == s)
                    .ok_or_else(|| FieldViolation::out_of_range(self.name))?;
                ParamValue::Text((*canonical).to_owned())
            }
        };
        self.check_range(&value)?;
        Ok(value)
    }

    fn check_range(&self, value: &ParamValue) -> Result<(), FieldViolation> {
        let Some(v) = value.as_f64() else {
            return Ok(());
        };
        let above_min = match self.min {
            Some(Bound::Inclusive(lo)) => v >= lo,
            Some(Bound::Exclusive(lo)) => v > lo,
            None => true,
        };
        let below_max = match self.max {
            Some(Bound::Inclusive(hi)) => v <= hi,
            Some(Bound::Exclusive(hi)) => v < hi,
            None => true,
        };
        if above_min && below_max {
            Ok(())
        } else {
            Err(FieldViolation::out_of_range(self.name))
        }
    }
}

/// Cross-field predicate, run after every per-field check passes.
pub type CrossRule = fn(&ParamSet) -> Result<(), FieldViolation>;

/// Ordered field declarations plus cross-field rules for one operation.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct ParamSchema {
    fields: Vec<ParamSpec>,
    #[serde(skip)]
    rules: Vec<CrossRule>,
}

impl ParamSchema {
    /// Schema with these fields and no cross rules.
    pub fn new(fields: Vec<ParamSpec>) -> Self {
        Self {
            fields,
            rules: Vec::new(),
        }
    }

    /// Append a cross-field rule.
    pub fn with_rule(mut self, rule: CrossRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Declared fields in order.
    pub fn fields(&self) -> &[ParamSpec] {
        &self.fields
    }

    /// Declared field by name.
    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check configured defaults on their own: declared fields must coerce (in declaration
    /// order), then undeclared keys are rejected. Cross-field rules are left to request
    /// validation, since a request may override the other side of the rule.
    pub fn check_defaults(&self, defaults: &RawParams) -> Result<(), FieldViolation> {
        for spec in &self.fields {
            if let Some(v) = defaults.get(spec.name).filter(|v| !v.is_null()) {
                spec.coerce(v)?;
            }
        }
        match defaults.keys().find(|k| self.field(k).is_none()) {
            Some(key) => Err(FieldViolation::unknown(key.as_str())),
            None => Ok(()),
        }
    }

    /// Validate `raw` for `operation`, layering `defaults` beneath it.
    pub fn validate(
        &self,
        operation: &str,
        raw: &RawParams,
        defaults: Option<&RawParams>,
    ) -> DegradeResult<ParamSet> {
        self.check(operation, raw, defaults)
            .map_err(|violation| DegradeError::validation(operation, violation))
    }

    fn check(
        &self,
        operation: &str,
        raw: &RawParams,
        defaults: Option<&RawParams>,
    ) -> Result<ParamSet, FieldViolation> {
        let lookup = |name: &str| {
            raw.get(name)
                .filter(|v| !v.is_null())
                .or_else(|| defaults.and_then(|d| d.get(name)).filter(|v| !v.is_null()))
        };

        let mut values = BTreeMap::new();
        for spec in &self.fields {
            match lookup(spec.name) {
                Some(v) => {
                    values.insert(spec.name.to_owned(), spec.coerce(v)?);
                }
                None if spec.required => return Err(FieldViolation::missing(spec.name)),
                None => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.to_owned(), default.clone());
                    }
                }
            }
        }

        let undeclared = raw
            .keys()
            .chain(defaults.into_iter().flat_map(|d| d.keys()))
            .find(|k| self.field(k).is_none());
        if let Some(key) = undeclared {
            return Err(FieldViolation::unknown(key.as_str()));
        }

        let set = ParamSet {
            operation: operation.to_owned(),
            values,
        };
        for rule in &self.rules {
            rule(&set)?;
        }
        Ok(set)
    }
}

/// Fully validated parameters for one operation invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSet {
    operation: String,
    values: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    /// Operation the parameters were validated for.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Raw value of a field.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Fields in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Integer field value.
    pub fn int(&self, name: &str) -> DegradeResult<i64> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(_) => Err(self.violation(FieldViolation::invalid_type(name))),
            None => Err(self.violation(FieldViolation::missing(name))),
        }
    }

    /// Numeric field value as `f64`.
    pub fn float(&self, name: &str) -> DegradeResult<f64> {
        match self.get(name).map(ParamValue::as_f64) {
            Some(Some(v)) => Ok(v),
            Some(None) => Err(self.violation(FieldViolation::invalid_type(name))),
            None => Err(self.violation(FieldViolation::missing(name))),
        }
    }

    /// Boolean field value.
    pub fn flag(&self, name: &str) -> DegradeResult<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(_) => Err(self.violation(FieldViolation::invalid_type(name))),
            None => Err(self.violation(FieldViolation::missing(name))),
        }
    }

    /// Choice field value.
    pub fn text(&self, name: &str) -> DegradeResult<&str> {
        match self.get(name) {
            Some(ParamValue::Text(v)) => Ok(v),
            Some(_) => Err(self.violation(FieldViolation::invalid_type(name))),
            None => Err(self.violation(FieldViolation::missing(name))),
        }
    }

    /// Seed parameter reinterpreted as an unsigned stream id.
    pub fn seed(&self) -> DegradeResult<u64> {
        self.int("seed").map(|v| v as u64)
    }

    /// Back to raw JSON with sorted keys; re-validating it yields an equal set.
    pub fn to_raw(&self) -> RawParams {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Canonical serialized form (sorted keys, JSON values); the cache-key component.
    pub fn signature(&self) -> String {
        Value::Object(self.to_raw()).to_string()
    }

    fn violation(&self, violation: FieldViolation) -> DegradeError {
        DegradeError::validation(self.operation.clone(), violation)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/schema.rs"]
mod tests;
