//! End-to-end: data tree on disk -> Store -> queries.

use pulse_core::{
    Category, DashboardQueries, Entry, FlatRecord, Ingestor, Ranking, Slice, SliceFilter,
    SourceTree, Store,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn agg_trans(name: &str, count: i64, amount: f64) -> String {
    format!(
        r#"{{"success":true,"code":"SUCCESS","data":{{"from":0,"to":1,"transactionData":[
            {{"name":"{name}","paymentInstruments":[{{"type":"TOTAL","count":{count},"amount":{amount}}}]}}
        ]}},"responseTimestamp":0}}"#
    )
}

/// A small tree shaped like the upstream checkout.
fn sample_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "aggregated/transaction/country/india/2022/1.json",
        r#"{"data":{"transactionData":[{"name":"Recharge","count":100,"amount":5000.0}]}}"#,
    );
    write(
        root,
        "aggregated/transaction/country/india/state/goa/2022/1.json",
        &agg_trans("Recharge", 40, 2000.0),
    );
    write(
        root,
        "aggregated/transaction/country/india/state/kerala/2022/1.json",
        &agg_trans("Recharge", 60, 3000.0),
    );
    write(
        root,
        "map/user/hover/country/india/state/goa/2022/1.json",
        r#"{"data":{"hoverData":{
            "north goa district":{"registeredUsers":700,"appOpens":9000},
            "south goa district":{"registeredUsers":500,"appOpens":4000}}}}"#,
    );
    write(
        root,
        "top/user/country/india/state/goa/2022/1.json",
        r#"{"data":{"states":null,
            "districts":[{"name":"north goa","registeredUsers":700}],
            "pincodes":[{"name":"403001","registeredUsers":300},{"name":"403507","registeredUsers":200}]}}"#,
    );
    dir
}

#[test]
fn country_level_example_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "aggregated/transaction/country/india/2022/1.json",
        r#"{"data":{"transactionData":[{"name":"Recharge","count":100,"amount":5000.0}]}}"#,
    );
    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    let report = Ingestor::new(&tree, &mut store).run().unwrap();
    assert_eq!(report.documents(), 1);
    assert_eq!(report.rows(), 1);

    let expected = FlatRecord::new(
        Slice::new("india", 2022, 1),
        Entry::Transaction {
            name: "Recharge".into(),
            count: 100,
            amount: 5000.0,
        },
    );
    let rows = store
        .rows(Category::AggregatedTransaction, &SliceFilter::new())
        .unwrap();
    assert_eq!(rows, vec![expected]);
}

#[test]
fn three_records_no_filter_and_empty_quarter() {
    let dir = sample_tree();
    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    Ingestor::new(&tree, &mut store)
        .categories(&[Category::AggregatedTransaction])
        .run()
        .unwrap();

    let all = store
        .rows(Category::AggregatedTransaction, &SliceFilter::new())
        .unwrap();
    assert_eq!(all.len(), 3);

    let q2 = store
        .rows(Category::AggregatedTransaction, &SliceFilter::new().quarter(2))
        .unwrap();
    assert!(q2.is_empty());
}

#[test]
fn every_loaded_record_is_found_by_its_slice() {
    let dir = sample_tree();
    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    Ingestor::new(&tree, &mut store).run().unwrap();

    for category in Category::ALL {
        for record in store.rows(category, &SliceFilter::new()).unwrap() {
            let filter = SliceFilter::new()
                .state(record.slice.state.clone())
                .year(record.slice.year)
                .quarter(record.slice.quarter);
            assert!(filter.matches(&record.slice));
            assert!(store.rows(category, &filter).unwrap().contains(&record));
        }
    }
}

#[test]
fn dashboard_aggregates_over_ingested_tree() {
    let dir = sample_tree();
    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    let report = Ingestor::new(&tree, &mut store).run().unwrap();
    assert_eq!(report.categories.len(), 9);
    assert_eq!(report.rows(), 3 + 2 + 3);

    let q1 = SliceFilter::new().year(2022).quarter(1);
    let totals = store
        .state_amounts(Category::AggregatedTransaction, &q1, None)
        .unwrap();
    assert_eq!(totals.len(), 2, "country rollup must not appear as a state");

    let top = store
        .rank(Ranking::StatesByTransactionAmount, &q1, 10)
        .unwrap();
    assert_eq!(top[0].state, "kerala");

    let opens = store.app_opens_by_state(&q1).unwrap();
    assert_eq!(opens.len(), 1);
    assert_eq!(opens[0].value, 13000);

    let pins = store
        .rank(Ranking::PincodesByRegisteredUsers, &q1.clone().state("Goa"), 1)
        .unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].entity, "403001");
}

#[test]
fn malformed_document_aborts_and_loads_nothing() {
    let dir = sample_tree();
    write(
        dir.path(),
        "aggregated/transaction/country/india/state/punjab/2022/1.json",
        r#"{"data":{"transactionData":"oops"}}"#,
    );
    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    let err = Ingestor::new(&tree, &mut store)
        .categories(&[Category::AggregatedTransaction])
        .run()
        .unwrap_err();
    assert!(err.is_parse());
    assert!(err.to_string().contains("punjab"));
    assert!(store
        .rows(Category::AggregatedTransaction, &SliceFilter::new())
        .unwrap()
        .is_empty());
}

#[test]
fn replace_prevents_duplicate_rows() {
    let dir = sample_tree();
    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    let only = [Category::MapUser];

    Ingestor::new(&tree, &mut store).categories(&only).run().unwrap();
    Ingestor::new(&tree, &mut store).categories(&only).run().unwrap();
    assert_eq!(store.rows(Category::MapUser, &SliceFilter::new()).unwrap().len(), 4);

    Ingestor::new(&tree, &mut store)
        .categories(&only)
        .replace(true)
        .run()
        .unwrap();
    assert_eq!(store.rows(Category::MapUser, &SliceFilter::new()).unwrap().len(), 2);
}

#[test]
fn file_store_survives_reopen() {
    let dir = sample_tree();
    let db_dir = tempfile::tempdir().unwrap();
    let db = db_dir.path().join("pulse.db");

    {
        let tree = SourceTree::new(dir.path()).unwrap();
        let mut store = Store::open(&db).unwrap();
        Ingestor::new(&tree, &mut store).run().unwrap();
    }

    let store = Store::open(&db).unwrap();
    let counts = store.row_counts().unwrap();
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    assert_eq!(total, 8);
}

#[cfg(feature = "compact")]
#[test]
fn gzipped_documents_are_read() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir
        .path()
        .join("aggregated/user/country/india/state/goa/2021/3.json.gz");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut enc = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    enc.write_all(br#"{"data":{"usersByDevice":[{"brand":"Apple","count":5,"percentage":0.5}]}}"#)
        .unwrap();
    enc.finish().unwrap();

    let tree = SourceTree::new(dir.path()).unwrap();
    let mut store = Store::open_in_memory().unwrap();
    Ingestor::new(&tree, &mut store).run().unwrap();

    let brands = store.device_brands(&SliceFilter::new().year(2021)).unwrap();
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0].brand, "Apple");
    assert_eq!(brands[0].total_users, 5);
}
