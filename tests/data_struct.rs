use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use docstruct::storage::memory::MemoryTransaction;
use docstruct::{
    AggregateOptions, Config, DataStruct, Document, ErrorKind, FieldValue, MemoryStorage, Query, Result, Schema,
    SearchOptions, Storage, StorageTransaction, TransactionMode,
};

fn feed_schema() -> Schema {
    Schema::new()
        .add_text_field("title")
        .add_string_field("tag")
        .add_integer_field("size")
        .add_boolean_field("published")
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("d1")
            .with_field("title", "Rust async runtime internals")
            .with_values("tag", ["rust", "async"])
            .with_field("size", "10")
            .with_field("published", "true"),
        Document::new("d2")
            .with_field("title", "Writing a tokenizer in Rust")
            .with_field("tag", "rust")
            .with_field("size", "20")
            .with_field("published", "false"),
        Document::new("d3")
            .with_field("title", "Async cooking for busy people")
            .with_field("tag", "food")
            .with_field("size", "10")
            .with_field("published", "true"),
        Document::new("d4")
            .with_field("title", "你好世界，阿芬")
            .with_field("tag", "cjk")
            .with_field("size", "-5"),
    ]
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn collection() -> DataStruct {
    init_tracing();
    let data = DataStruct::new(feed_schema(), Config::named("feeds"));
    let mut txn = data.readwrite().await.unwrap();
    data.batch_write(&mut txn, &[], corpus()).await.unwrap();
    txn.commit().await.unwrap();
    data
}

async fn ids(data: &DataStruct, query: &Query) -> BTreeSet<String> {
    let txn = data.readonly().await.unwrap();
    data.search(&txn, query, &SearchOptions::new())
        .await
        .unwrap()
        .nodes
        .into_iter()
        .map(|node| node.id)
        .collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn doc1_scenario() {
    let schema = Schema::new().add_text_field("title").add_boolean_field("published");
    let data = DataStruct::new(schema, Config::default());

    let mut txn = data.readwrite().await.unwrap();
    data.insert(
        &mut txn,
        Document::new("doc1")
            .with_field("title", "hello world")
            .with_field("published", "true"),
    )
    .await
    .unwrap();
    txn.commit().await.unwrap();

    let found = ids(
        &data,
        &Query::must(vec![Query::match_value("title", "hello"), Query::match_value("published", "true")]),
    )
    .await;
    assert_eq!(found, set(&["doc1"]));

    let excluded = ids(&data, &Query::must_not(vec![Query::match_value("published", "true")])).await;
    assert!(excluded.is_empty());
}

#[tokio::test]
async fn must_not_excludes_only_documents_matching_every_subquery() {
    let data = collection().await;

    // d1 is the only rust+async document
    let query = Query::must_not(vec![Query::match_value("tag", "rust"), Query::match_value("tag", "async")]);
    assert_eq!(ids(&data, &query).await, set(&["d2", "d3", "d4"]));
}

#[tokio::test]
async fn ids_are_unique_across_transactions() {
    let data = collection().await;

    let mut txn = data.readwrite().await.unwrap();
    let err = data.insert(&mut txn, Document::new("d1")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    // update = delete then insert
    data.delete(&mut txn, "d1").await.unwrap();
    data.insert(&mut txn, Document::new("d1").with_field("tag", "rewritten"))
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(ids(&data, &Query::match_value("tag", "rewritten")).await, set(&["d1"]));
    assert!(!ids(&data, &Query::match_value("tag", "async")).await.contains("d1"));
}

#[tokio::test]
async fn stored_documents_round_trip() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();

    let docs = data
        .get_all(&txn, &["d2".to_string(), "missing".to_string(), "d1".to_string()])
        .await
        .unwrap();
    let expected = corpus();
    assert_eq!(docs, vec![expected[1].clone(), expected[0].clone()]);

    let result = data
        .search(&txn, &Query::match_value("tag", "async"), &SearchOptions::new().with_fields(["tag", "size"]))
        .await
        .unwrap();
    let fields = result.nodes[0].fields.as_ref().unwrap();
    assert_eq!(fields["tag"], FieldValue::Multiple(vec!["rust".to_string(), "async".to_string()]));
    assert_eq!(fields["size"], FieldValue::Single("10".to_string()));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let data = collection().await;

    for _ in 0..2 {
        let mut txn = data.readwrite().await.unwrap();
        data.delete(&mut txn, "d3").await.unwrap();
        txn.commit().await.unwrap();
    }

    let txn = data.readonly().await.unwrap();
    assert!(!data.has(&txn, "d3").await.unwrap());
    assert!(data.has(&txn, "d1").await.unwrap());
    assert_eq!(ids(&data, &Query::match_value("tag", "food")).await, BTreeSet::new());
    assert_eq!(data.match_all(&txn).await.unwrap().size(), 3);
}

#[tokio::test]
async fn set_algebra_laws() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();

    let a = Query::match_value("title", "async");
    let b = Query::match_value("tag", "rust");
    let ids_a = ids(&data, &a).await;
    let ids_b = ids(&data, &b).await;

    let must = ids(&data, &Query::must(vec![a.clone(), b.clone()])).await;
    let should = ids(&data, &Query::should(vec![a.clone(), b.clone()])).await;
    assert_eq!(must, ids_a.intersection(&ids_b).cloned().collect());
    assert_eq!(must, set(&["d1"]));
    assert_eq!(should, ids_a.union(&ids_b).cloned().collect());

    let plain = data.query(&txn, &a).await.unwrap();
    let boosted = data.query(&txn, &Query::boost(a.clone(), 3.0)).await.unwrap();
    assert_eq!(plain.size(), boosted.size());
    for nid in plain.to_vec() {
        assert_eq!(boosted.score(nid), plain.score(nid).map(|s| s * 3.0));
    }
}

#[tokio::test]
async fn exists_covers_text_without_terms() {
    let data = collection().await;
    let mut txn = data.readwrite().await.unwrap();
    data.insert(&mut txn, Document::new("d5").with_field("title", "!!! ... ???"))
        .await
        .unwrap();
    data.insert(&mut txn, Document::new("d6").with_field("title", ""))
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(
        ids(&data, &Query::exists("title")).await,
        set(&["d1", "d2", "d3", "d4", "d5"])
    );
    assert!(ids(&data, &Query::match_value("title", "!!!")).await.is_empty());
}

#[tokio::test]
async fn match_all_scores_one() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();

    let all = data.query(&txn, &Query::all()).await.unwrap();
    assert_eq!(all.size(), 4);
    assert!(all.to_vec().into_iter().all(|nid| all.score(nid) == Some(1.0)));
}

#[tokio::test]
async fn pagination_slices_ranked_matches() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();
    let query = Query::should(vec![
        Query::boost(Query::match_value("tag", "rust"), 3.0),
        Query::match_value("published", "true"),
    ]);

    let full = data.search(&txn, &query, &SearchOptions::new()).await.unwrap();
    let ranked: Vec<String> = full.nodes.iter().map(|n| n.id.clone()).collect();
    // d1: 3 + 1, d2: 3, d3: 1
    assert_eq!(ranked, vec!["d1", "d2", "d3"]);
    assert_eq!(full.pagination.limit, 100);

    let page = data
        .search(&txn, &query, &SearchOptions::new().paginate(1, 1))
        .await
        .unwrap();
    assert_eq!(page.pagination.count, 3);
    assert!(page.pagination.has_more);
    assert_eq!(page.nodes.len(), 1);
    assert_eq!(page.nodes[0].id, ranked[1]);

    let tail = data
        .search(&txn, &query, &SearchOptions::new().paginate(2, 5))
        .await
        .unwrap();
    assert!(!tail.pagination.has_more);
    assert_eq!(tail.nodes.len(), 1);
}

#[tokio::test]
async fn aggregation_counts_multi_valued_documents_in_each_bucket() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();

    let result = data
        .aggregate(&txn, &Query::all(), "tag", &AggregateOptions::new())
        .await
        .unwrap();

    let rust = result.buckets.iter().find(|b| b.key == "rust").unwrap();
    let async_bucket = result.buckets.iter().find(|b| b.key == "async").unwrap();
    assert_eq!(rust.count, 2);
    assert_eq!(async_bucket.count, 1);
    assert!(result.buckets.iter().all(|b| b.hits.is_none()));

    let total: usize = result.buckets.iter().map(|b| b.count).sum();
    assert!(total >= 4);
    assert_eq!(result.pagination.count, result.buckets.len());

    let paged = data
        .aggregate(&txn, &Query::all(), "tag", &AggregateOptions::new().paginate(1, 2))
        .await
        .unwrap();
    assert_eq!(paged.buckets.len(), 2);
    assert_eq!(paged.buckets[0].key, result.buckets[1].key);
    assert!(paged.pagination.has_more);
}

#[tokio::test]
async fn aggregation_hits_default_to_three() {
    let data = DataStruct::new(Schema::new().add_string_field("tag"), Config::default());
    let mut txn = data.readwrite().await.unwrap();
    for i in 0..5 {
        data.insert(&mut txn, Document::new(format!("n{}", i)).with_field("tag", "same"))
            .await
            .unwrap();
    }
    txn.commit().await.unwrap();

    let txn = data.readonly().await.unwrap();
    let result = data
        .aggregate(&txn, &Query::all(), "tag", &AggregateOptions::new().with_hits(SearchOptions::new()))
        .await
        .unwrap();
    let hits = result.buckets[0].hits.as_ref().unwrap();
    assert_eq!(result.buckets[0].count, 5);
    assert_eq!(hits.nodes.len(), 3);
    assert_eq!(hits.pagination.limit, 3);
    assert!(hits.pagination.has_more);
}

#[tokio::test]
async fn highlights_wrap_verbatim_spans() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();
    let options = SearchOptions::new().with_highlight("title", "<b>", "</b>");

    for (query, raw) in [
        ("RUST runtime", "Rust async runtime internals"),
        ("世界", "你好世界，阿芬"),
    ] {
        let result = data
            .search(&txn, &Query::match_value("title", query), &options)
            .await
            .unwrap();
        let node = result
            .nodes
            .iter()
            .find(|n| corpus().iter().any(|d| d.id == n.id && d.get_field("title")[0] == raw))
            .unwrap();

        let excerpts = &node.highlights.as_ref().unwrap()["title"];
        assert_eq!(excerpts.len(), 1);
        let mut rest = excerpts[0].as_str();
        let mut spans = 0;
        while let Some(open) = rest.find("<b>") {
            let close = rest[open..].find("</b>").unwrap() + open;
            let span = &rest[open + 3..close];
            assert!(raw.contains(span), "{:?} not in {:?}", span, raw);
            spans += 1;
            rest = &rest[close + 4..];
        }
        assert!(spans > 0);
    }
}

#[tokio::test]
async fn highlight_field_without_match_is_omitted() {
    let data = collection().await;
    let txn = data.readonly().await.unwrap();

    let result = data
        .search(
            &txn,
            &Query::match_value("tag", "food"),
            &SearchOptions::new().with_highlight("title", "[", "]"),
        )
        .await
        .unwrap();
    let highlights = result.nodes[0].highlights.as_ref().unwrap();
    assert!(highlights.is_empty());
}

#[tokio::test]
async fn dropped_transaction_discards_writes() {
    let data = collection().await;

    let mut txn = data.readwrite().await.unwrap();
    data.delete(&mut txn, "d1").await.unwrap();
    data.insert(&mut txn, Document::new("d9")).await.unwrap();
    drop(txn);

    let txn = data.readonly().await.unwrap();
    assert!(data.has(&txn, "d1").await.unwrap());
    assert!(!data.has(&txn, "d9").await.unwrap());
}

#[tokio::test]
async fn readonly_transaction_rejects_writes() {
    let data = collection().await;
    let mut txn = data.readonly().await.unwrap();

    let err = data.insert(&mut txn, Document::new("d9")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn json_queries_evaluate() {
    let data = collection().await;

    let query = Query::from_json(
        r#"{"type":"boolean","occur":"must","queries":[
            {"type":"match","field":"title","match":"rust"},
            {"type":"exists","field":"published"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(ids(&data, &query).await, set(&["d1", "d2"]));

    let txn = data.readonly().await.unwrap();
    let err = data
        .search(&txn, &Query::match_value("author", "x"), &SearchOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownField);
}

#[tokio::test]
async fn snapshot_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::named("persisted").with_storage_path(dir.path());

    {
        let data = DataStruct::new(feed_schema(), config.clone());
        let mut txn = data.readwrite().await.unwrap();
        data.batch_write(&mut txn, &[], corpus()).await.unwrap();
        data.set_metadata(&mut txn, "cursor", &"abc".to_string()).await.unwrap();
        txn.commit().await.unwrap();
    }
    assert!(dir.path().join("persisted.idx").exists());

    let reopened = DataStruct::new(feed_schema(), config);
    let txn = reopened.readonly().await.unwrap();
    assert_eq!(reopened.match_all(&txn).await.unwrap().size(), 4);
    assert_eq!(
        reopened.get_metadata::<String>(&txn, "cursor").await.unwrap(),
        Some("abc".to_string())
    );
    drop(txn);
    assert_eq!(ids(&reopened, &Query::match_value("title", "tokenizer")).await, set(&["d2"]));
}

/// Wraps the in-memory storage and counts `open` calls.
#[derive(Clone, Default)]
struct CountingStorage {
    inner: MemoryStorage,
    opens: Arc<AtomicUsize>,
}

#[async_trait]
impl Storage for CountingStorage {
    type Transaction = MemoryTransaction;

    async fn open(&self) -> Result<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.open().await
    }

    async fn begin(&self, mode: TransactionMode) -> Result<Self::Transaction> {
        self.inner.begin(mode).await
    }
}

#[tokio::test]
async fn concurrent_first_use_initializes_once() {
    let storage = CountingStorage::default();
    let opens = storage.opens.clone();
    let data = Arc::new(DataStruct::with_storage(feed_schema(), Config::default(), storage));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let data = data.clone();
        tasks.push(tokio::spawn(async move {
            let txn = data.readonly().await?;
            assert_eq!(txn.mode(), TransactionMode::ReadOnly);
            Ok::<(), docstruct::Error>(())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(opens.load(Ordering::SeqCst), 1);
}
