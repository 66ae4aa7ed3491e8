//! Property-based tests for the laws spec §8 enumerates.

use havendb::{CollectionConfig, IndexKind, IndexOptions, Query, Value};
use proptest::prelude::*;
use serde_json::json;

fn v(j: serde_json::Value) -> Value {
    Value::from_json(&j)
}

proptest! {
    /// `apply(apply(doc, u), u) == apply(doc, u)` for the idempotent operators.
    #[test]
    fn update_idempotence_law(age in 0i64..1000, bump in 1i64..50) {
        let col = havendb::Collection::new("users", CollectionConfig::default());
        col.insert(v(json!({"id": "1", "age": age, "tags": []}))).unwrap();

        let set_update = v(json!({"$set": {"age": age + bump}}));
        col.update(&Query::from_value(v(json!({"id": "1"}))), &set_update).unwrap();
        let after_first = col.find_one(&Query::from_value(v(json!({"id": "1"})))).unwrap().unwrap();
        col.update(&Query::from_value(v(json!({"id": "1"}))), &set_update).unwrap();
        let after_second = col.find_one(&Query::from_value(v(json!({"id": "1"})))).unwrap().unwrap();
        prop_assert_eq!(after_first.get("age"), after_second.get("age"));

        let add_update = v(json!({"$addToSet": {"tags": "x"}}));
        col.update(&Query::from_value(v(json!({"id": "1"}))), &add_update).unwrap();
        let once = col.find_one(&Query::from_value(v(json!({"id": "1"})))).unwrap().unwrap();
        col.update(&Query::from_value(v(json!({"id": "1"}))), &add_update).unwrap();
        let twice = col.find_one(&Query::from_value(v(json!({"id": "1"})))).unwrap().unwrap();
        prop_assert_eq!(once.get("tags"), twice.get("tags"));
    }

    /// `$inc` is explicitly NOT idempotent: applying it twice must differ
    /// from applying it once (unless the increment happens to be zero).
    #[test]
    fn inc_is_not_idempotent(start in 0i64..1000, delta in 1i64..50) {
        let col = havendb::Collection::new("users", CollectionConfig::default());
        col.insert(v(json!({"id": "1", "age": start}))).unwrap();
        let inc = v(json!({"$inc": {"age": delta}}));
        col.update(&Query::from_value(v(json!({"id": "1"}))), &inc).unwrap();
        let once = col.find_one(&Query::from_value(v(json!({"id": "1"})))).unwrap().unwrap();
        col.update(&Query::from_value(v(json!({"id": "1"}))), &inc).unwrap();
        let twice = col.find_one(&Query::from_value(v(json!({"id": "1"})))).unwrap().unwrap();
        prop_assert_ne!(once.get("age"), twice.get("age"));
    }

    /// Index-accelerated lookups must agree with a full scan no matter what
    /// sequence of inserts/updates/deletes produced the current state.
    #[test]
    fn index_consistency_across_random_mutations(
        ops in prop::collection::vec((0u8..3, 0i64..8, 0i64..20), 1..40)
    ) {
        let col = havendb::Collection::new("items", CollectionConfig::default());
        col.create_index("by_bucket", vec!["bucket".to_string()], IndexKind::Single, IndexOptions::default()).unwrap();

        for (kind, id, bucket) in ops {
            let idq = Query::from_value(v(json!({"id": id.to_string()})));
            match kind {
                0 => {
                    let _ = col.insert(v(json!({"id": id.to_string(), "bucket": bucket})));
                }
                1 => {
                    let _ = col.update(&idq, &v(json!({"$set": {"bucket": bucket}})));
                }
                _ => {
                    let _ = col.delete(&idq);
                }
            }
        }

        for bucket in 0i64..20 {
            let via_index = col.find(&Query::from_value(v(json!({"bucket": bucket}))), &Default::default()).unwrap();
            let via_scan: Vec<_> = col
                .find(&Query::new(), &Default::default())
                .unwrap()
                .into_iter()
                .filter(|d| d.get("bucket") == Some(&Value::Number(bucket as f64)))
                .collect();
            let mut via_index_ids: Vec<_> = via_index.iter().map(|d| d.id.to_string()).collect();
            let mut via_scan_ids: Vec<_> = via_scan.iter().map(|d| d.id.to_string()).collect();
            via_index_ids.sort();
            via_scan_ids.sort();
            prop_assert_eq!(via_index_ids, via_scan_ids);
        }
    }
}
