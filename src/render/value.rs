use crate::value::ValueCow;
use crate::{Lambda, Map, Value};

impl Value {
    pub(crate) fn human(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Lambda(_) => "lambda",
        }
    }
}

/// Index the value with the given path, `None` if any segment is missing.
pub fn lookup_path<'a>(value: &ValueCow<'a>, path: &[&str]) -> Option<ValueCow<'a>> {
    match value {
        &ValueCow::Borrowed(v) => {
            let v = path.iter().try_fold(v, |v, p| index(v, p))?;
            Some(ValueCow::Borrowed(v))
        }
        ValueCow::Owned(v) => {
            let v = path.iter().try_fold(v, |v, p| index(v, p))?;
            Some(ValueCow::Owned(v.clone()))
        }
    }
}

/// Index a single segment of a path, maps by key and lists by position.
pub fn index<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(segment),
        Value::List(list) => segment.parse::<usize>().ok().and_then(|i| list.get(i)),
        _ => None,
    }
}

/// Returns the lambda to call if the value is callable.
///
/// In strict mode only lambdas are callable. Otherwise a two element list of
/// a map and a string naming one of its lambdas is callable too.
pub fn callable(value: &Value, strict: bool) -> Option<&Lambda> {
    match value {
        Value::Lambda(lambda) => Some(lambda),
        Value::List(list) if !strict => match &list[..] {
            [Value::Map(map), Value::String(name)] => match map.get(name) {
                Some(Value::Lambda(lambda)) => Some(lambda),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// Returns whether the map's keys are exactly `0..n` in order, in which case
/// a section iterates over its values like a list.
pub fn is_dense(map: &Map) -> bool {
    map.keys().enumerate().all(|(i, key)| *key == i.to_string())
}

/// Splits a section value into the frames to render the section body with.
///
/// Lists and dense maps give one frame per element; anything else is a single
/// frame.
pub fn into_frames(value: ValueCow<'_>) -> Vec<ValueCow<'_>> {
    match value {
        ValueCow::Borrowed(Value::List(list)) => list.iter().map(ValueCow::Borrowed).collect(),
        ValueCow::Borrowed(Value::Map(map)) if is_dense(map) => {
            map.values().map(ValueCow::Borrowed).collect()
        }
        ValueCow::Owned(Value::List(list)) => list.into_iter().map(ValueCow::Owned).collect(),
        ValueCow::Owned(Value::Map(map)) if is_dense(&map) => {
            map.into_values().map(ValueCow::Owned).collect()
        }
        value => vec![value],
    }
}
