//! End-to-end scenarios driven entirely through the public API.

use havendb::{
    CollectionConfig, CrdtResolver, DistributedDocument, IndexKind, IndexOptions, OperationKind,
    Query, Value, VectorClock,
};
use serde_json::json;

fn v(j: serde_json::Value) -> Value {
    Value::from_json(&j)
}

fn q(j: serde_json::Value) -> Query {
    Query::from_value(v(j))
}

#[test]
fn s1_basic_crud() {
    let col = havendb::Collection::new("users", CollectionConfig::default());
    col.insert(v(json!({"id": "1", "name": "Alice", "age": 30}))).unwrap();

    let found = col.find(&q(json!({"age": {"$gt": 20}})), &Default::default()).unwrap();
    assert_eq!(found.len(), 1);

    col.update(&q(json!({"id": "1"})), &v(json!({"$set": {"age": 31}}))).unwrap();
    let one = col.find_one(&q(json!({"id": "1"}))).unwrap().unwrap();
    assert_eq!(one.get("age"), Some(&Value::Number(31.0)));

    assert_eq!(col.delete(&q(json!({"id": "1"}))).unwrap(), 1);
    assert!(col.find(&Query::new(), &Default::default()).unwrap().is_empty());
}

#[test]
fn s2_compound_index_selection() {
    let col = havendb::Collection::new("products", CollectionConfig::default());
    col.create_index(
        "cat_stock",
        vec!["category".to_string(), "inStock".to_string()],
        IndexKind::Compound,
        IndexOptions::default(),
    )
    .unwrap();
    let cats = ["A", "B", "C"];
    for i in 0..10 {
        col.insert(v(json!({
            "id": i.to_string(),
            "category": cats[i % 3],
            "inStock": i % 2 == 0,
        })))
        .unwrap();
    }

    let before = col.index_scan_count();
    let results = col.find(&q(json!({"category": "B", "inStock": true})), &Default::default()).unwrap();
    assert!(col.index_scan_count() > before, "must consult the compound index, not a full scan");
    for doc in &results {
        assert_eq!(doc.get("category"), Some(&Value::String("B".into())));
        assert_eq!(doc.get("inStock"), Some(&Value::Bool(true)));
    }
}

#[test]
fn s3_unique_violation() {
    let col = havendb::Collection::new("users", CollectionConfig::default());
    col.create_index("email_idx", vec!["email".to_string()], IndexKind::Unique, IndexOptions::default()).unwrap();
    col.insert(v(json!({"id": "1", "email": "a@x"}))).unwrap();

    let err = col.insert(v(json!({"id": "2", "email": "a@x"})));
    assert!(err.is_err());

    let all = col.find(&Query::new(), &Default::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].get("id").is_none(), true); // id isn't a field, it's the Document's id
    assert_eq!(all[0].id.to_string(), "1");
}

#[test]
fn s4_partial_index_transitions() {
    let col = havendb::Collection::new("users", CollectionConfig::default());
    let partial = Query::from_value(v(json!({"active": true})));
    col.create_index(
        "active_last",
        vec!["lastActive".to_string()],
        IndexKind::Single,
        IndexOptions { partial_filter: Some(partial), ..Default::default() },
    )
    .unwrap();

    col.insert(v(json!({"id": "1", "lastActive": 10, "active": true}))).unwrap();
    col.insert(v(json!({"id": "2", "lastActive": 20, "active": true}))).unwrap();
    col.insert(v(json!({"id": "3", "lastActive": 30, "active": false}))).unwrap();

    // All three are present regardless of index membership.
    assert_eq!(col.find(&Query::new(), &Default::default()).unwrap().len(), 3);

    col.update(&q(json!({"id": "2"})), &v(json!({"$set": {"active": false}}))).unwrap();
    col.update(&q(json!({"id": "3"})), &v(json!({"$set": {"active": true}}))).unwrap();

    let explain = col.explain(&q(json!({"lastActive": {"$gte": 0}})));
    assert!(!explain.full_scan, "partial index should still be consulted");
}

#[test]
fn s5_concurrent_update_convergence() {
    // Two peers start from the same document, diverge, then exchange
    // operations in opposite orders and must converge identically.
    let base_vector = VectorClock::new();
    let base = DistributedDocument {
        id: havendb::DocumentId::String("doc1".to_string()),
        fields: [("name".to_string(), v(json!("orig"))), ("age".to_string(), v(json!(0)))]
            .into_iter()
            .collect(),
        vector: base_vector.clone(),
        timestamp: 0,
        peer_id: "seed".to_string(),
        deleted: false,
        field_meta: std::collections::HashMap::new(),
    };

    let v_p1 = base_vector.increment("p1").increment("p1").increment("p2");
    let op_p1 = havendb::Operation {
        id: "op-p1".into(),
        kind: OperationKind::Update,
        collection: "users".into(),
        document_id: base.id.clone(),
        payload: Some([("name".to_string(), v(json!("P1")))].into_iter().collect()),
        vector: v_p1.clone(),
        timestamp: 100,
        peer_id: "p1".into(),
    };

    let v_p2 = base_vector.increment("p1").increment("p2").increment("p2");
    let op_p2 = havendb::Operation {
        id: "op-p2".into(),
        kind: OperationKind::Update,
        collection: "users".into(),
        document_id: base.id.clone(),
        payload: Some([("age".to_string(), v(json!(42)))].into_iter().collect()),
        vector: v_p2.clone(),
        timestamp: 200,
        peer_id: "p2".into(),
    };

    // Peer A applies p1 then p2; peer B applies p2 then p1.
    let a1 = CrdtResolver::apply_operation(Some(&base), &op_p1).unwrap();
    let a2 = CrdtResolver::apply_operation(Some(&a1), &op_p2).unwrap();

    let b1 = CrdtResolver::apply_operation(Some(&base), &op_p2).unwrap();
    let b2 = CrdtResolver::apply_operation(Some(&b1), &op_p1).unwrap();

    assert_eq!(a2.fields.get("name"), b2.fields.get("name"));
    assert_eq!(a2.fields.get("age"), b2.fields.get("age"));
    assert_eq!(a2.vector, b2.vector);
}

#[test]
fn s6_reactive_subscription() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    let col = havendb::Collection::new("users", CollectionConfig::default());
    let snapshots: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let snapshots_cb = snapshots.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cb = calls.clone();

    let _sub = col.subscribe(
        q(json!({"age": {"$gt": 25}})),
        Box::new(move |event| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
            snapshots_cb.lock().unwrap().push(event.matching.len());
        }),
    );
    assert_eq!(*snapshots.lock().unwrap().last().unwrap(), 0);

    col.insert(v(json!({"id": "a", "age": 20}))).unwrap();
    assert_eq!(*snapshots.lock().unwrap().last().unwrap(), 0);

    col.insert(v(json!({"id": "b", "age": 30}))).unwrap();
    assert_eq!(*snapshots.lock().unwrap().last().unwrap(), 1);

    col.update(&q(json!({"id": "a"})), &v(json!({"$set": {"age": 40}}))).unwrap();
    assert_eq!(*snapshots.lock().unwrap().last().unwrap(), 2);

    col.delete(&q(json!({"id": "b"}))).unwrap();
    assert_eq!(*snapshots.lock().unwrap().last().unwrap(), 1);
}
