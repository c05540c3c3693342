use std::fs::File;

use approx::assert_abs_diff_eq;
use stayprice::dataset::{read_clean_csv, write_clean_csv};
use stayprice::model::design_matrix;
use stayprice::prelude::*;

const RAW_HEADER: &str = "id,host_listings_count,accommodates,bedrooms,beds,price,\
minimum_nights,maximum_nights,availability_30,availability_60,availability_90,\
availability_365,number_of_reviews,latitude,longitude,room_type\n";

/// A raw export with one dense cluster and a distant outlier.
fn raw_export(n: u32) -> String {
    let mut raw = String::from(RAW_HEADER);
    for i in 0..n {
        let lat = 38.70 + 0.0008 * f64::from(i % 13);
        let lon = -9.15 + 0.0006 * f64::from(i % 7);
        let beds = 1 + i % 3;
        let price = 50 + 20 * (i % 9);
        let room = if i % 4 == 0 { "Entire home/apt" } else { "Private room" };
        raw.push_str(&format!(
            "{},2,{},1,{beds},${price}.00,1,60,5,15,25,200,{},{lat:.5},{lon:.5},{room}\n",
            i + 1,
            2 + i % 4,
            i % 20,
        ));
    }
    // Porto, far outside every cluster radius.
    raw.push_str(&format!(
        "{},2,2,1,1,$300.00,1,60,5,15,25,200,3,41.15000,-8.61000,Private room\n",
        n + 1,
    ));
    raw
}

#[test]
fn pipeline_from_raw_export_to_model() {
    let records = clean(read_raw_csv(raw_export(30).as_bytes()).unwrap());
    assert_eq!(records.len(), 31);

    // Clean CSV survives a file round trip unchanged.
    let dir = tempfile::tempdir().unwrap();
    let clean_path = dir.path().join("clean.csv");
    write_clean_csv(File::create(&clean_path).unwrap(), &records).unwrap();
    let records = read_clean_csv(File::open(&clean_path).unwrap()).unwrap();
    assert_eq!(records.len(), 31);

    let table = build_features(&records, &FeatureConfig::default()).unwrap();
    // The Porto outlier has no in-radius neighbor, so its average is
    // undefined and the row is dropped by the final null filter.
    assert_eq!(table.rows.len(), 30);
    let n_nearby = table.column("n_nearby").unwrap();
    assert!(n_nearby.iter().all(|&n| n > 0.0));

    let config = TrainConfig {
        model: ModelKind::Ridge { alpha: 1.0 },
        folds: 3,
        seed: 42,
        log_target: true,
    };
    let report = train(&table, &config).unwrap();
    assert_eq!(report.scores.fold_mse.len(), 3);
    assert!(report.scores.mean_mse.is_finite());

    // A stored model predicts identically after reloading.
    let model_path = dir.path().join("model.json");
    report.artifact.save(File::create(&model_path).unwrap()).unwrap();
    let artifact = ModelArtifact::load(File::open(&model_path).unwrap()).unwrap();
    assert_eq!(artifact.feature_names, report.artifact.feature_names);

    let (x, y, _) = design_matrix(&table, true).unwrap();
    let fresh = report.artifact.to_model();
    let reloaded = artifact.to_model();
    let a = fresh.predict(&x).unwrap();
    let b = reloaded.predict(&x).unwrap();
    assert_eq!(a.len(), y.len());
    for (p, q) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(p, q);
    }
}

#[test]
fn candidate_order_does_not_change_results() {
    // Integer prices keep the neighbor sums exact under any summation order.
    let table: Vec<Listing> = (0..50)
        .map(|i| {
            Listing::new(
                i,
                Some(38.70 + 0.0007 * (i % 11) as f64),
                Some(-9.15 + 0.0009 * (i % 5) as f64),
                (i % 6 != 0).then(|| (40 + 3 * i) as f64),
            )
        })
        .collect();

    let aggregator = NeighborAggregator::new().parallel(false).build().unwrap();
    let base = aggregator.aggregate(&table, &table);

    let mut reversed = table.clone();
    reversed.reverse();
    assert_eq!(base, aggregator.aggregate(&table, &reversed));

    let mut rotated = table.clone();
    rotated.rotate_left(17);
    assert_eq!(base, aggregator.aggregate(&table, &rotated));
}

#[test]
fn index_strategies_agree_on_mixed_data() {
    // Cluster, outliers, an unpriced row, and an unpositioned row.
    let mut table: Vec<Listing> = (0..80)
        .map(|i| {
            Listing::new(
                i,
                Some(38.70 + 0.0011 * (i % 19) as f64),
                Some(-9.15 + 0.0013 * (i % 17) as f64),
                Some((30 + 2 * i) as f64),
            )
        })
        .collect();
    table.push(Listing::new(200, Some(41.15), Some(-8.61), Some(500.0)));
    table.push(Listing::new(201, Some(38.71), Some(-9.14), None));
    table.push(Listing::new(202, None, None, Some(90.0)));

    let scan = NeighborAggregator::new()
        .index(IndexStrategy::Scan)
        .build()
        .unwrap();
    let grid = NeighborAggregator::new()
        .index(IndexStrategy::Grid)
        .build()
        .unwrap();

    assert_eq!(
        scan.aggregate(&table, &table),
        grid.aggregate(&table, &table)
    );
}

#[test]
fn duplicate_position_is_still_a_neighbor() {
    // Distinct ids at the same coordinates count each other, never themselves.
    let table = vec![
        Listing::new(1, Some(38.72), Some(-9.14), Some(100.0)),
        Listing::new(2, Some(38.72), Some(-9.14), Some(300.0)),
    ];
    let aggregator = NeighborAggregator::new().build().unwrap();
    let stats = aggregator.aggregate(&table, &table);

    assert_eq!(stats[0].n_nearby, 1);
    assert_eq!(stats[0].nearby_average_price, Some(300.0));
    assert_eq!(stats[1].nearby_average_price, Some(100.0));
}
