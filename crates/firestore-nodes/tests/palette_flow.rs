//! End-to-end palette tests: the three Firestore nodes wired to the
//! mock document client, the way a host runtime would assemble them.

use std::sync::{mpsc, Arc, Mutex};

use graph_flow::{Context, Task};
use serde_json::{json, Map, Value};

use fireflow_client_contracts::{
    CompanionGate, DataSnapshot, DocumentChange, DocumentChangeType, MockClient, QueryMethod,
    FIELD_VALUE_TAG,
};
use fireflow_firestore_nodes::{
    FirestoreGetTask, FirestoreInTask, FirestoreOutTask, GetNodeConfig, InNodeConfig,
    MessageSender, OutNodeConfig,
};
use fireflow_node_contracts::ContextKeys;
use fireflow_query::StaticResolver;

fn seeded_snapshot() -> DataSnapshot {
    let mut docs = Map::new();
    docs.insert("alice".to_string(), json!({"age": 30, "city": "paris"}));
    docs.insert("bob".to_string(), json!({"age": 25, "city": "lyon"}));
    DataSnapshot::new(
        docs,
        vec![
            DocumentChange {
                id: "alice".to_string(),
                doc: json!({"age": 30, "city": "paris"}),
                new_index: 0,
                old_index: -1,
                change_type: DocumentChangeType::Added,
            },
            DocumentChange {
                id: "bob".to_string(),
                doc: json!({"age": 25, "city": "lyon"}),
                new_index: 1,
                old_index: 0,
                change_type: DocumentChangeType::Modified,
            },
        ],
    )
}

fn channel_sender() -> (MessageSender, mpsc::Receiver<Value>) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let sender: MessageSender = Arc::new(move |message| {
        if let Ok(tx) = tx.lock() {
            tx.send(message).ok();
        }
    });
    (sender, rx)
}

#[tokio::test]
async fn write_then_read_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let client = Arc::new(MockClient::with_snapshot(seeded_snapshot()));
    let resolver = Arc::new(StaticResolver::new().with_flow("page.limit", json!(10)));

    // firestore-out: set a document, expanding write sentinels
    let out_config: OutNodeConfig = serde_json::from_value(json!({
        "database": "db-1",
        "collection": "users",
        "document": "alice",
        "queryMethod": "msg",
    }))
    .unwrap();
    let out = FirestoreOutTask::new(
        "firestore-out-1",
        out_config,
        client.clone(),
        resolver.clone(),
    );

    let context = Context::new();
    context
        .set(
            &ContextKeys::input("firestore-out-1", "message"),
            json!({
                "method": "set",
                "payload": {
                    "visits": "INCREMENT 1",
                    "tags": {"ARRAY_UNION": ["vip"]},
                    "joined": "TIMESTAMP",
                },
                "options": {"merge": true},
            }),
        )
        .await;
    out.run(context).await.unwrap();

    let writes = client.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, QueryMethod::Set);
    let payload = writes[0].payload.as_ref().unwrap();
    assert_eq!(payload["visits"][FIELD_VALUE_TAG], "increment");
    assert_eq!(payload["tags"][FIELD_VALUE_TAG], "arrayUnion");
    assert_eq!(writes[0].options.as_ref().unwrap().merge, Some(true));

    // firestore-get: query with a constraint resolved from flow context
    let get_config: GetNodeConfig = serde_json::from_value(json!({
        "database": "db-1",
        "collection": "users",
        "constraints": {
            "limitToFirst": {"value": "page.limit", "valueType": "flow"},
            "orderBy": [{"path": "age", "pathType": "str", "direction": "desc"}],
        },
    }))
    .unwrap();
    let get = FirestoreGetTask::new(
        "firestore-get-1",
        get_config,
        client.clone(),
        resolver.clone(),
    );

    let context = Context::new();
    context
        .set(
            &ContextKeys::input("firestore-get-1", "message"),
            json!({"topic": "query"}),
        )
        .await;
    get.run(context.clone()).await.unwrap();

    let outgoing: Value = context
        .get(&ContextKeys::output("firestore-get-1", "message"))
        .await
        .unwrap();
    assert_eq!(outgoing["payload"]["size"], 2);

    let constraints = client.last_query().unwrap().constraints.unwrap();
    assert_eq!(constraints.limit_to_first, Some(10));
    assert_eq!(constraints.order_by[0].field_path, "age");
}

#[tokio::test]
async fn subscription_lifecycle_with_filter() {
    let client = Arc::new(MockClient::new());
    let resolver = Arc::new(StaticResolver::new());
    let (sender, rx) = channel_sender();

    let in_config: InNodeConfig = serde_json::from_value(json!({
        "database": "db-1",
        "collection": "users",
        "filter": "added",
        "inputs": 1,
        "passThrough": true,
    }))
    .unwrap();
    let node = FirestoreInTask::new(
        "firestore-in-1",
        in_config,
        client.clone(),
        resolver.clone(),
        sender,
    );

    // Dynamic node: a message starts the subscription
    let context = Context::new();
    context
        .set(
            &ContextKeys::input("firestore-in-1", "message"),
            json!({"topic": "start"}),
        )
        .await;
    node.run(context.clone()).await.unwrap();
    assert_eq!(client.subscriber_count(), 1);

    // The incoming message passes through
    let passed: Value = context
        .get(&ContextKeys::output("firestore-in-1", "message"))
        .await
        .unwrap();
    assert_eq!(passed["topic"], "start");

    // A delivered snapshot is filtered down to added changes
    client.push_snapshot(seeded_snapshot());
    let message = rx.try_recv().unwrap();
    let changes = message["payload"]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["type"], "added");

    // A reset message detaches the listener
    let context = Context::new();
    context
        .set(
            &ContextKeys::input("firestore-in-1", "message"),
            json!({"filter": "reset"}),
        )
        .await;
    node.run(context).await.unwrap();
    assert_eq!(client.subscriber_count(), 0);
}

#[tokio::test]
async fn unsatisfied_companion_gate_deactivates_the_palette() {
    let client = Arc::new(MockClient::with_snapshot(seeded_snapshot()));
    let resolver = Arc::new(StaticResolver::new());
    let gate = Arc::new(CompanionGate::unsatisfied());
    let (sender, _rx) = channel_sender();

    let get = FirestoreGetTask::new(
        "firestore-get-1",
        GetNodeConfig::default(),
        client.clone(),
        resolver.clone(),
    )
    .with_gate(Arc::clone(&gate));
    let node = FirestoreInTask::new(
        "firestore-in-1",
        InNodeConfig::default(),
        client.clone(),
        resolver.clone(),
        sender,
    )
    .with_gate(Arc::clone(&gate));
    let out = FirestoreOutTask::new(
        "firestore-out-1",
        OutNodeConfig::default(),
        client.clone(),
        resolver.clone(),
    )
    .with_gate(Arc::clone(&gate));

    let context = Context::new();
    context
        .set(&ContextKeys::input("firestore-get-1", "message"), json!({}))
        .await;
    get.run(context).await.unwrap();
    node.subscribe(None).await.unwrap();
    let context = Context::new();
    context
        .set(
            &ContextKeys::input("firestore-out-1", "message"),
            json!({"method": "set", "payload": {}}),
        )
        .await;
    out.run(context).await.unwrap();

    // The client was never touched
    assert!(client.last_query().is_none());
    assert_eq!(client.subscriber_count(), 0);
    assert!(client.writes().is_empty());

    // Once the companion version is observed as satisfied, nodes work
    gate.observe("0.3.2");
    let context = Context::new();
    context
        .set(&ContextKeys::input("firestore-get-1", "message"), json!({}))
        .await;
    get.run(context).await.unwrap();
    assert!(client.last_query().is_some());
}
