//! Persisted document framing
//!
//! Wraps a resource in `{kind, apiVersion, spec}` so a saved document can be
//! reloaded into the right concrete type. Only the frame namespace is used for
//! the `spec` body; network calls never go through here.

use super::tags::{decode_into, encode_for, Namespace, Tagged};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A type that can be written to and read from a framed document.
pub trait Framed: Tagged + Default {
    const KIND: &'static str;
    const API_VERSION: &'static str;
}

/// On-disk document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    #[default]
    Json,
    Yaml,
}

impl FrameFormat {
    /// Guess from a file extension, defaulting to JSON.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => FrameFormat::Yaml,
            _ => FrameFormat::Json,
        }
    }
}

/// Type discriminator of a framed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub kind: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    #[serde(flatten)]
    pub header: FrameHeader,
    #[serde(default)]
    pub spec: Value,
}

pub fn encode_frame<T: Framed>(value: &T, format: FrameFormat) -> Result<String> {
    let frame = Frame {
        header: FrameHeader {
            kind: T::KIND.to_string(),
            api_version: T::API_VERSION.to_string(),
        },
        spec: encode_for(value, Namespace::Frame)?,
    };
    match format {
        FrameFormat::Json => {
            serde_json::to_string_pretty(&frame).map_err(|e| Error::Frame(e.to_string()))
        },
        FrameFormat::Yaml => serde_yaml::to_string(&frame).map_err(|e| Error::Frame(e.to_string())),
    }
}

fn parse_frame(input: &str, format: FrameFormat) -> Result<Frame> {
    match format {
        FrameFormat::Json => serde_json::from_str(input).map_err(|e| Error::Frame(e.to_string())),
        FrameFormat::Yaml => serde_yaml::from_str(input).map_err(|e| Error::Frame(e.to_string())),
    }
}

/// Read only the discriminator.
pub fn peek_kind(input: &str, format: FrameFormat) -> Result<FrameHeader> {
    parse_frame(input, format).map(|f| f.header)
}

fn unwrap_frame<T: Framed>(frame: Frame) -> Result<T> {
    if frame.header.kind != T::KIND {
        return Err(Error::Frame(format!(
            "kind mismatch: expected {}, found {}",
            T::KIND,
            frame.header.kind
        )));
    }
    if frame.header.api_version != T::API_VERSION {
        return Err(Error::Frame(format!(
            "unsupported apiVersion {} for {} (expected {})",
            frame.header.api_version,
            T::KIND,
            T::API_VERSION
        )));
    }
    let mut value = T::default();
    decode_into(&mut value, frame.spec, Namespace::Frame)?;
    Ok(value)
}

pub fn decode_frame<T: Framed>(input: &str, format: FrameFormat) -> Result<T> {
    unwrap_frame(parse_frame(input, format)?)
}

type Loader<R> = Box<dyn Fn(Frame) -> Result<R> + Send + Sync>;

/// Maps frame kinds to loaders producing a caller-chosen type, usually an enum
/// over every persisted resource the caller knows about.
pub struct FrameRegistry<R> {
    loaders: HashMap<&'static str, Loader<R>>,
}

impl<R> Default for FrameRegistry<R> {
    fn default() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }
}

impl<R> FrameRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T, F>(mut self, wrap: F) -> Self
    where
        T: Framed,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.loaders
            .insert(T::KIND, Box::new(move |frame| unwrap_frame::<T>(frame).map(&wrap)));
        self
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.loaders.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn load(&self, input: &str, format: FrameFormat) -> Result<R> {
        let frame = parse_frame(input, format)?;
        let Some(loader) = self.loaders.get(frame.header.kind.as_str()) else {
            return Err(Error::Frame(format!("unknown kind '{}'", frame.header.kind)));
        };
        loader(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldTag;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Bucket {
        id: String,
        name: String,
        public: bool,
    }

    impl Tagged for Bucket {
        const FIELDS: &'static [FieldTag] = &[
            FieldTag::new("id").read("id"),
            FieldTag::new("name").read("name").create("name").frame("name"),
            FieldTag::new("public").read("public").frame("public"),
        ];
    }

    impl Framed for Bucket {
        const KIND: &'static str = "Bucket";
        const API_VERSION: &'static str = "storage/v1";
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Queue {
        name: String,
    }

    impl Tagged for Queue {
        const FIELDS: &'static [FieldTag] = &[FieldTag::new("name").all("name")];
    }

    impl Framed for Queue {
        const KIND: &'static str = "Queue";
        const API_VERSION: &'static str = "mq/v1";
    }

    #[derive(Debug, PartialEq)]
    enum Doc {
        Bucket(Bucket),
        Queue(Queue),
    }

    fn bucket() -> Bucket {
        Bucket {
            id: "b-1".to_string(),
            name: "assets".to_string(),
            public: true,
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FrameFormat::from_extension("yml"), FrameFormat::Yaml);
        assert_eq!(FrameFormat::from_extension("YAML"), FrameFormat::Yaml);
        assert_eq!(FrameFormat::from_extension("json"), FrameFormat::Json);
        assert_eq!(FrameFormat::from_extension("txt"), FrameFormat::Json);
    }

    #[test]
    fn test_frame_omits_non_frame_fields() {
        let text = encode_frame(&bucket(), FrameFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "Bucket");
        assert_eq!(value["apiVersion"], "storage/v1");
        assert!(value["spec"].get("id").is_none());

        let back: Bucket = decode_frame(&text, FrameFormat::Json).unwrap();
        assert_eq!(back.name, "assets");
        assert!(back.public);
        assert!(back.id.is_empty());
    }

    #[test]
    fn test_yaml_frame_reloads() {
        let text = encode_frame(&bucket(), FrameFormat::Yaml).unwrap();
        assert!(text.contains("kind: Bucket"));
        let header = peek_kind(&text, FrameFormat::Yaml).unwrap();
        assert_eq!(header.api_version, "storage/v1");
        let back: Bucket = decode_frame(&text, FrameFormat::Yaml).unwrap();
        assert_eq!(back.name, "assets");
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let text = encode_frame(&bucket(), FrameFormat::Json).unwrap();
        let err = decode_frame::<Queue>(&text, FrameFormat::Json).unwrap_err();
        assert!(matches!(err, Error::Frame(_)));
    }

    #[test]
    fn test_registry_dispatches_on_kind() {
        let registry = FrameRegistry::new()
            .register::<Bucket, _>(Doc::Bucket)
            .register::<Queue, _>(Doc::Queue);
        assert_eq!(registry.kinds(), vec!["Bucket", "Queue"]);

        let queue = Queue {
            name: "jobs".to_string(),
        };
        let text = encode_frame(&queue, FrameFormat::Yaml).unwrap();
        assert_eq!(registry.load(&text, FrameFormat::Yaml).unwrap(), Doc::Queue(queue));

        let unknown = r#"{"kind":"Topic","apiVersion":"mq/v1","spec":{}}"#;
        assert!(registry.load(unknown, FrameFormat::Json).is_err());
    }
}
