//! Property-based tests using proptest
//!
//! These tests verify namespace filtering, read overlays, query-string
//! encoding and document framing using randomized inputs.

use proptest::prelude::*;
use resclient::codec::{decode_frame, decode_into, encode_for, encode_for_create, encode_frame};
use resclient::resource::query_pairs;
use resclient::{FieldTag, FrameFormat, Framed, Namespace, PageQuery, SearchParams, Tagged};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Volume {
    id: String,
    name: String,
    size_gb: u64,
    zone: String,
    tags: Vec<String>,
    attached_to: String,
}

impl Tagged for Volume {
    const FIELDS: &'static [FieldTag] = &[
        FieldTag::new("id").read("id"),
        FieldTag::new("name").read("name").create("name").frame("name"),
        FieldTag::new("size_gb").read("size").create("size").update("size").frame("size"),
        FieldTag::new("zone").read("zone").create("zone").frame("zone"),
        FieldTag::new("tags").read("tags").create("tags").update("tags").omit_empty().frame("tags"),
        FieldTag::new("attached_to").read("attached_to"),
    ];
}

impl Framed for Volume {
    const KIND: &'static str = "Volume";
    const API_VERSION: &'static str = "block/v1";
}

/// Generate arbitrary volumes
fn arb_volume() -> impl Strategy<Value = Volume> {
    (
        "[a-z0-9-]{1,12}",
        "[a-z][a-z0-9-]{0,30}",
        0u64..10_000,
        prop_oneof!["eu-1a", "eu-1b", "us-2a"],
        prop::collection::vec("[a-z]{1,8}", 0..4),
        "[a-z0-9-]{0,12}",
    )
        .prop_map(|(id, name, size_gb, zone, tags, attached_to)| Volume {
            id,
            name,
            size_gb,
            zone: zone.to_string(),
            tags,
            attached_to,
        })
}

fn keys(value: &Value) -> Vec<String> {
    value.as_object().map(|m| m.keys().cloned().collect()).unwrap_or_default()
}

proptest! {
    /// Create payloads carry exactly the create-tagged wire names, sorted
    #[test]
    fn create_payload_has_only_create_keys(volume in arb_volume()) {
        let body = encode_for_create(&volume).unwrap();
        let mut expected = vec!["name", "size", "zone"];
        if !volume.tags.is_empty() {
            expected.push("tags");
        }
        prop_assert_eq!(keys(&body), expected);

        let text = serde_json::to_string(&body).unwrap();
        prop_assert!(!text.contains("attached_to"));
        prop_assert!(!text.contains("\"id\""));
    }

    /// Update payloads never include create-only fields
    #[test]
    fn update_payload_excludes_create_only(volume in arb_volume()) {
        let body = encode_for(&volume, Namespace::Update).unwrap();
        let obj = body.as_object().unwrap();
        prop_assert!(obj.contains_key("size"));
        prop_assert!(!obj.contains_key("name"));
        prop_assert!(!obj.contains_key("zone"));
    }

    /// A read echo of the create payload reproduces the created fields
    #[test]
    fn create_read_echo_round_trip(volume in arb_volume()) {
        let body = encode_for_create(&volume).unwrap();
        let mut echoed = Volume::default();
        decode_into(&mut echoed, body, Namespace::Read).unwrap();
        prop_assert_eq!(&echoed.name, &volume.name);
        prop_assert_eq!(echoed.size_gb, volume.size_gb);
        prop_assert_eq!(&echoed.zone, &volume.zone);
        prop_assert_eq!(&echoed.tags, &volume.tags);
    }

    /// Fields a read payload omits keep their previous values
    #[test]
    fn read_overlay_keeps_unmentioned_fields(volume in arb_volume(), status in "[a-z]{1,8}") {
        let mut target = volume.clone();
        decode_into(&mut target, json!({"attached_to": status}), Namespace::Read).unwrap();
        prop_assert_eq!(&target.attached_to, &status);
        prop_assert_eq!(&target.id, &volume.id);
        prop_assert_eq!(&target.name, &volume.name);
    }

    /// Query pairs come out sorted by key regardless of insertion order
    #[test]
    fn query_pairs_sorted(
        filters in prop::collection::btree_map("[a-z]{1,6}", "[a-zA-Z0-9 ]{0,10}", 0..6),
        limit in 1u32..500,
        offset in 0u64..10_000,
    ) {
        let mut query = PageQuery::new(limit);
        query.set_offset(offset);
        for (k, v) in &filters {
            if k != "limit" && k != "offset" {
                query.filters.insert(k.clone(), v.clone());
            }
        }
        let pairs = query.to_query().unwrap();
        let names: Vec<&String> = pairs.iter().map(|(k, _)| k).collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names, sorted);
        prop_assert!(pairs.contains(&("limit".to_string(), limit.to_string())));
        prop_assert!(pairs.contains(&("offset".to_string(), offset.to_string())));
    }

    /// Maps of scalars always encode
    #[test]
    fn scalar_maps_always_encode(map in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)) {
        let pairs = query_pairs(&map).unwrap();
        prop_assert_eq!(pairs.len(), map.len());
    }

    /// Framed documents reload with their frame-tagged fields only
    #[test]
    fn frame_reload_keeps_frame_fields(volume in arb_volume(), yaml in any::<bool>()) {
        let format = if yaml { FrameFormat::Yaml } else { FrameFormat::Json };
        let text = encode_frame(&volume, format).unwrap();
        let back: Volume = decode_frame(&text, format).unwrap();
        prop_assert_eq!(&back.name, &volume.name);
        prop_assert_eq!(back.size_gb, volume.size_gb);
        prop_assert!(back.id.is_empty());
        prop_assert!(back.attached_to.is_empty());
    }
}

#[test]
fn nested_query_values_are_rejected() {
    let mut inner = BTreeMap::new();
    inner.insert("range", json!({"from": 1}));
    assert!(query_pairs(&inner).is_err());
}
