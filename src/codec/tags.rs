//! Field tag tables and per-namespace encoding
//!
//! A type describes each of its fields once, with the wire name it uses in every
//! namespace it takes part in. The engine serializes the value with serde, then
//! keeps, renames and orders the keys according to the active namespace.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Field visibility group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Read,
    Create,
    Update,
    Apply,
    /// On-disk document framing, never used on the wire.
    Frame,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Read => "read",
            Namespace::Create => "create",
            Namespace::Update => "update",
            Namespace::Apply => "apply",
            Namespace::Frame => "frame",
        };
        f.write_str(s)
    }
}

/// Value-level transform applied to a nested tagged field.
#[derive(Clone, Copy)]
pub struct Nested {
    encode: fn(Value, Namespace) -> Result<Value>,
    decode: fn(Value, Namespace) -> Result<Value>,
}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nested")
    }
}

/// Tag entry for one field.
///
/// `field` is the key serde produces for the field; the per-namespace names are
/// the keys used on the wire. A field with no name for a namespace is absent
/// from that namespace entirely.
///
/// ```ignore
/// const FIELDS: &'static [FieldTag] = &[
///     FieldTag::new("name").read("name").create("name"),
///     FieldTag::new("internal").read("internal"),
/// ];
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldTag {
    pub field: &'static str,
    read: Option<&'static str>,
    create: Option<&'static str>,
    update: Option<&'static str>,
    apply: Option<&'static str>,
    frame: Option<&'static str>,
    omit_empty: bool,
    nested: Option<Nested>,
}

impl FieldTag {
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            read: None,
            create: None,
            update: None,
            apply: None,
            frame: None,
            omit_empty: false,
            nested: None,
        }
    }

    pub const fn read(mut self, name: &'static str) -> Self {
        self.read = Some(name);
        self
    }

    pub const fn create(mut self, name: &'static str) -> Self {
        self.create = Some(name);
        self
    }

    pub const fn update(mut self, name: &'static str) -> Self {
        self.update = Some(name);
        self
    }

    pub const fn apply(mut self, name: &'static str) -> Self {
        self.apply = Some(name);
        self
    }

    pub const fn frame(mut self, name: &'static str) -> Self {
        self.frame = Some(name);
        self
    }

    /// Same wire name in every namespace.
    pub const fn all(self, name: &'static str) -> Self {
        self.read(name).create(name).update(name).apply(name).frame(name)
    }

    /// Skip null, empty strings, empty arrays and empty objects when encoding.
    pub const fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Field holds a tagged value (or an array of them) filtered by its own table.
    pub const fn nested<C: Tagged>(mut self) -> Self {
        self.nested = Some(Nested {
            encode: encode_value::<C>,
            decode: decode_value::<C>,
        });
        self
    }

    pub fn name_in(&self, ns: Namespace) -> Option<&'static str> {
        match ns {
            Namespace::Read => self.read,
            Namespace::Create => self.create,
            Namespace::Update => self.update,
            Namespace::Apply => self.apply,
            Namespace::Frame => self.frame,
        }
    }
}

/// A type with a field tag table.
///
/// Fields should carry `#[serde(default)]` (or the type derive it) so that
/// payloads which omit them still decode.
pub trait Tagged: Serialize + DeserializeOwned {
    const FIELDS: &'static [FieldTag];

    /// Reject unknown keys on decode.
    const STRICT: bool = false;
}

/// Object-safe encoding entry point used for request bodies.
pub trait EncodeBody: Send + Sync {
    fn encode_body(&self, ns: Namespace) -> Result<Value>;
}

impl<T: Tagged + Send + Sync> EncodeBody for T {
    fn encode_body(&self, ns: Namespace) -> Result<Value> {
        encode_for(self, ns)
    }
}

/// Encode `value` for one namespace. Keys come out sorted.
pub fn encode_for<T: Tagged>(value: &T, ns: Namespace) -> Result<Value> {
    let raw = serde_json::to_value(value).map_err(|e| Error::codec(ns, e))?;
    encode_value::<T>(raw, ns)
}

pub fn encode_for_create<T: Tagged>(value: &T) -> Result<Value> {
    encode_for(value, Namespace::Create)
}

pub fn encode_for_update<T: Tagged>(value: &T) -> Result<Value> {
    encode_for(value, Namespace::Update)
}

pub fn encode_for_apply<T: Tagged>(value: &T) -> Result<Value> {
    encode_for(value, Namespace::Apply)
}

/// Decode a read-shaped payload into a fresh value.
pub fn decode_for_read<T: Tagged + Default>(payload: Value) -> Result<T> {
    let mut value = T::default();
    decode_into(&mut value, payload, Namespace::Read)?;
    Ok(value)
}

/// Overlay a payload onto an existing value.
///
/// Fields the payload does not mention keep their current value, so identifiers
/// set by the caller before a read survive the decode. An explicit `null` only
/// clears a field that is already null-shaped, such as an unset `Option`.
pub fn decode_into<T: Tagged>(target: &mut T, payload: Value, ns: Namespace) -> Result<()> {
    let incoming = match decode_value::<T>(payload, ns)? {
        Value::Object(map) => map,
        other => {
            return Err(Error::codec(
                ns,
                format!("expected object for {}, got {}", type_label::<T>(), kind_of(&other)),
            ))
        },
    };

    let mut base = match serde_json::to_value(&*target).map_err(|e| Error::codec(ns, e))? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in incoming {
        if value.is_null() && base.get(&key).is_some_and(|current| !current.is_null()) {
            continue;
        }
        base.insert(key, value);
    }

    *target = serde_json::from_value(Value::Object(base)).map_err(|e| Error::codec(ns, e))?;
    Ok(())
}

fn encode_value<T: Tagged>(value: Value, ns: Namespace) -> Result<Value> {
    match value {
        Value::Object(map) => encode_object(&map, T::FIELDS, ns),
        Value::Array(items) => items
            .into_iter()
            .map(|v| encode_value::<T>(v, ns))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Null => Ok(Value::Null),
        other => Err(Error::codec(
            ns,
            format!("{} serialized to {}, expected object", type_label::<T>(), kind_of(&other)),
        )),
    }
}

fn encode_object(map: &Map<String, Value>, fields: &[FieldTag], ns: Namespace) -> Result<Value> {
    let mut out = BTreeMap::new();
    for tag in fields {
        let Some(wire) = tag.name_in(ns) else {
            continue;
        };
        let Some(value) = map.get(tag.field) else {
            continue;
        };
        if tag.omit_empty && is_empty(value) {
            continue;
        }
        let value = match tag.nested {
            Some(nested) => (nested.encode)(value.clone(), ns)?,
            None => value.clone(),
        };
        out.insert(wire.to_string(), value);
    }
    // BTreeMap iteration keeps the output sorted even with serde_json's preserve_order.
    Ok(Value::Object(out.into_iter().collect()))
}

/// Map wire keys back to serde field keys.
fn decode_value<T: Tagged>(value: Value, ns: Namespace) -> Result<Value> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                let tag = T::FIELDS.iter().find(|t| t.name_in(ns) == Some(key.as_str()));
                match tag {
                    Some(tag) => {
                        let value = match tag.nested {
                            Some(nested) => (nested.decode)(value, ns)?,
                            None => value,
                        };
                        out.insert(tag.field.to_string(), value);
                    },
                    None if T::STRICT => {
                        return Err(Error::codec(
                            ns,
                            format!("unknown field '{}' for {}", key, type_label::<T>()),
                        ));
                    },
                    None => {
                        tracing::trace!("ignoring unknown {} field '{}' for {}", ns, key, type_label::<T>());
                    },
                }
            }
            Ok(Value::Object(out))
        },
        Value::Array(items) => items
            .into_iter()
            .map(|v| decode_value::<T>(v, ns))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_label<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct App {
        id: String,
        name: String,
        internal: String,
        replicas: u32,
        labels: Vec<String>,
        ports: Vec<Port>,
    }

    impl Tagged for App {
        const FIELDS: &'static [FieldTag] = &[
            FieldTag::new("id").read("id"),
            FieldTag::new("name").read("name").create("name"),
            FieldTag::new("internal").read("internal"),
            FieldTag::new("replicas").read("replicas").create("replicas").update("replicas").apply("scale"),
            FieldTag::new("labels").read("labels").create("labels").update("labels").omit_empty(),
            FieldTag::new("ports").read("ports").create("ports").nested::<Port>(),
        ];
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Port {
        number: u16,
        state: String,
    }

    impl Tagged for Port {
        const FIELDS: &'static [FieldTag] = &[
            FieldTag::new("number").read("port").create("port"),
            FieldTag::new("state").read("state"),
        ];
        const STRICT: bool = true;
    }

    fn sample() -> App {
        App {
            id: "app-1".to_string(),
            name: "web".to_string(),
            internal: "secret".to_string(),
            replicas: 3,
            labels: vec![],
            ports: vec![Port {
                number: 80,
                state: "open".to_string(),
            }],
        }
    }

    #[test]
    fn test_create_keeps_only_create_fields() {
        let body = encode_for_create(&sample()).unwrap();
        assert_eq!(
            body,
            json!({"name": "web", "ports": [{"port": 80}], "replicas": 3})
        );
        let text = serde_json::to_string(&body).unwrap();
        assert_eq!(text, r#"{"name":"web","ports":[{"port":80}],"replicas":3}"#);
    }

    #[test]
    fn test_namespaces_rename_independently() {
        assert_eq!(encode_for_apply(&sample()).unwrap(), json!({"scale": 3}));
        assert_eq!(encode_for_update(&sample()).unwrap(), json!({"replicas": 3}));
    }

    #[test]
    fn test_omit_empty_only_when_empty() {
        let mut app = sample();
        app.labels = vec!["tier=web".to_string()];
        let body = encode_for_update(&app).unwrap();
        assert_eq!(body["labels"], json!(["tier=web"]));
    }

    #[test]
    fn test_read_decode_maps_wire_names() {
        let app: App = decode_for_read(json!({
            "id": "app-9",
            "name": "api",
            "internal": "x",
            "replicas": 2,
            "ports": [{"port": 443, "state": "open"}],
            "extra": true
        }))
        .unwrap();
        assert_eq!(app.id, "app-9");
        assert_eq!(app.ports[0].number, 443);
        assert_eq!(app.ports[0].state, "open");
    }

    #[test]
    fn test_strict_nested_rejects_unknown_keys() {
        let err = decode_for_read::<App>(json!({"ports": [{"port": 1, "bogus": 1}]})).unwrap_err();
        assert!(err.to_string().contains("unknown field 'bogus'"), "{}", err);
    }

    #[test]
    fn test_decode_into_keeps_unmentioned_fields() {
        let mut app = App {
            id: "app-1".to_string(),
            ..Default::default()
        };
        decode_into(&mut app, json!({"name": "web", "replicas": 5}), Namespace::Read).unwrap();
        assert_eq!(app.id, "app-1");
        assert_eq!(app.name, "web");
        assert_eq!(app.replicas, 5);
    }

    #[test]
    fn test_decode_null_keeps_current_value() {
        let app: App = decode_for_read(json!({"name": null, "replicas": 2})).unwrap();
        assert_eq!(app.name, "");
        assert_eq!(app.replicas, 2);

        let mut app = sample();
        decode_into(&mut app, json!({"name": null}), Namespace::Read).unwrap();
        assert_eq!(app.name, sample().name);
    }

    #[test]
    fn test_create_then_read_echo_round_trips() {
        let original = sample();
        let body = encode_for_create(&original).unwrap();
        let echoed: App = decode_for_read(body).unwrap();
        assert_eq!(echoed.name, original.name);
        assert_eq!(echoed.replicas, original.replicas);
        assert_eq!(echoed.ports[0].number, 80);
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(decode_for_read::<App>(json!([1, 2])).is_err());
    }
}
