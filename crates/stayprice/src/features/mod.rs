//! Layer 5b: Feature engineering
//!
//! ## Purpose
//!
//! This stage turns cleaned records into the purely numeric table the model
//! trains on: the geospatial neighbor columns (the pipeline's core), binary
//! host/booking flags, missing-value fills, and one-hot encoded categories.
//!
//! ## Design notes
//!
//! * **Aggregation first**: Neighbor statistics are computed before any row
//!   is dropped, against the candidate set selected by
//!   [`CandidateScope`](crate::primitives::CandidateScope).
//! * **Row drops last**: Rows missing a price or any remaining value (no
//!   coordinates, no priced neighbor in radius, absent counts) are dropped
//!   at the end of the stage, mirroring the original pipeline's final
//!   null filter. NaN is used only as the in-stage sentinel and never
//!   survives into the returned table.
//!
//! ## Invariants
//!
//! * Every value in the returned table is finite.
//! * Column names are unique and deterministic for a given input table.

/// One-hot encoding of categorical columns.
pub mod encode;

use std::io::{Read, Write};

use log::info;

use crate::api::{IndexStrategy, NeighborAggregator, DEFAULT_RADIUS_KM};
use crate::dataset::CleanRecord;
use crate::features::encode::OneHotEncoder;
use crate::primitives::{CandidateScope, Listing, PipelineError, Result};

/// Configuration for the feature stage.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Neighbor radius in kilometers.
    pub radius_km: f64,
    /// Which rows serve as neighbor candidates.
    pub scope: CandidateScope,
    /// Parallel aggregation across listings.
    pub parallel: bool,
    /// Candidate lookup strategy.
    pub strategy: IndexStrategy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            scope: CandidateScope::default(),
            parallel: true,
            strategy: IndexStrategy::default(),
        }
    }
}

/// A fully numeric table: one row per surviving listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub ids: Vec<u64>,
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))
    }

    /// Copy of a named column.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Write as CSV with an `id` column first.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = Vec::with_capacity(self.names.len() + 1);
        header.push("id".to_string());
        header.extend(self.names.iter().cloned());
        wtr.write_record(&header)?;

        for (id, row) in self.ids.iter().zip(&self.rows) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(id.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`FeatureTable::write_csv`].
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.get(0) != Some("id") {
            return Err(PipelineError::InvalidInput(
                "feature table must start with an id column".to_string(),
            ));
        }
        let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let id: u64 = record
                .get(0)
                .unwrap_or_default()
                .parse()
                .map_err(|_| PipelineError::InvalidInput("non-numeric id".to_string()))?;
            let row: Vec<f64> = record
                .iter()
                .skip(1)
                .map(|field| {
                    field.parse::<f64>().map_err(|_| {
                        PipelineError::InvalidInput(format!("non-numeric value: {field:?}"))
                    })
                })
                .collect::<Result<_>>()?;
            if row.len() != names.len() {
                return Err(PipelineError::MismatchedInputs {
                    left: row.len(),
                    right: names.len(),
                });
            }
            ids.push(id);
            rows.push(row);
        }
        Ok(Self { ids, names, rows })
    }
}

/// Build the feature table from cleaned records.
pub fn build_features(records: &[CleanRecord], config: &FeatureConfig) -> Result<FeatureTable> {
    info!("generating features for {} rows", records.len());

    let listings: Vec<Listing> = records.iter().map(CleanRecord::to_listing).collect();
    let candidates: Vec<Listing> = match config.scope {
        CandidateScope::AllListings => listings.clone(),
        CandidateScope::PricedOnly => listings
            .iter()
            .filter(|l| l.price.is_some())
            .cloned()
            .collect(),
    };

    let aggregator = NeighborAggregator::new()
        .radius_km(config.radius_km)
        .parallel(config.parallel)
        .index(config.strategy)
        .build()?;
    let stats = aggregator.aggregate(&listings, &candidates);
    info!(
        "neighbor aggregation done ({} listings, radius {} km)",
        listings.len(),
        config.radius_km
    );

    let neighbourhood = OneHotEncoder::fit(
        "neighbourhood",
        records.iter().map(|r| r.neighbourhood_cleansed.as_deref()),
    );
    let property = OneHotEncoder::fit("property", records.iter().map(|r| r.property_type.as_deref()));
    let room = OneHotEncoder::fit("room", records.iter().map(|r| r.room_type.as_deref()));

    let mut names: Vec<String> = [
        "host_response_time",
        "host_response_rate_100",
        "host_is_superhost",
        "host_in_pt",
        "host_listings_count",
        "accommodates",
        "bedrooms",
        "beds",
        "price",
        "minimum_nights",
        "maximum_nights",
        "availability_30",
        "availability_60",
        "availability_90",
        "availability_365",
        "number_of_reviews",
        "review_scores_rating",
        "instant_bookable",
        "reviews_per_month",
        "latitude",
        "longitude",
        "nearby_average_price",
        "n_nearby",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    names.reserve(neighbourhood.width() + property.width() + room.width());
    names.extend(neighbourhood.column_names());
    names.extend(property.column_names());
    names.extend(room.column_names());

    let mut ids = Vec::new();
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (record, stat) in records.iter().zip(&stats) {
        let mut row: Vec<f64> = Vec::with_capacity(names.len());

        row.push(flag_eq(&record.host_response_time, "within an hour"));
        row.push(flag_eq(&record.host_response_rate, "100%"));
        row.push(flag_eq(&record.host_is_superhost, "t"));
        row.push(host_in_pt(&record.host_location));
        row.push(opt(record.host_listings_count));
        row.push(opt(record.accommodates));
        row.push(opt(record.bedrooms));
        row.push(opt(record.beds.or(record.bedrooms)));
        row.push(opt(record.price));
        row.push(opt(record.minimum_nights));
        row.push(opt(record.maximum_nights));
        row.push(opt(record.availability_30));
        row.push(opt(record.availability_60));
        row.push(opt(record.availability_90));
        row.push(opt(record.availability_365));
        row.push(opt(record.number_of_reviews));
        row.push(record.review_scores_rating.unwrap_or(0.0));
        row.push(flag_eq(&record.instant_bookable, "t"));
        row.push(record.reviews_per_month.unwrap_or(0.0));
        row.push(opt(record.latitude));
        row.push(opt(record.longitude));
        row.push(opt(stat.nearby_average_price));
        row.push(stat.n_nearby as f64);

        neighbourhood.encode(record.neighbourhood_cleansed.as_deref(), &mut row);
        property.encode(record.property_type.as_deref(), &mut row);
        room.encode(record.room_type.as_deref(), &mut row);

        // Final null filter: missing price or any other unresolved value.
        if row.iter().any(|v| v.is_nan()) {
            dropped += 1;
            continue;
        }
        ids.push(record.id);
        rows.push(row);
    }

    info!("feature table: {} rows kept, {} dropped", rows.len(), dropped);
    Ok(FeatureTable { ids, names, rows })
}

/// In-stage sentinel for a missing value; filtered before the table returns.
fn opt(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

fn flag_eq(value: &Option<String>, expected: &str) -> f64 {
    match value {
        Some(v) if v == expected => 1.0,
        _ => 0.0,
    }
}

fn host_in_pt(host_location: &Option<String>) -> f64 {
    match host_location {
        Some(loc) if loc.contains("ortugal") || loc.contains("PT") => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn record(id: u64, lat: f64, lon: f64, price: Option<f64>) -> CleanRecord {
        CleanRecord {
            id,
            latitude: Some(lat),
            longitude: Some(lon),
            price,
            host_listings_count: Some(1.0),
            accommodates: Some(2.0),
            bedrooms: Some(1.0),
            beds: Some(1.0),
            minimum_nights: Some(1.0),
            maximum_nights: Some(30.0),
            availability_30: Some(10.0),
            availability_60: Some(20.0),
            availability_90: Some(30.0),
            availability_365: Some(100.0),
            number_of_reviews: Some(5.0),
            room_type: Some("Private room".to_string()),
            ..CleanRecord::default()
        }
    }

    #[test]
    fn neighbor_columns_and_price_drop() {
        // Three co-located listings plus one unpriced and one far away.
        let mut records = vec![
            record(1, 38.72, -9.14, Some(100.0)),
            record(2, 38.72, -9.14, Some(200.0)),
            record(3, 38.72, -9.14, Some(300.0)),
            record(4, 38.72, -9.14, None),
            record(5, 41.15, -8.61, Some(500.0)),
        ];
        records[0].host_response_time = Some("within an hour".to_string());

        let table = build_features(&records, &FeatureConfig::default()).unwrap();

        // Row 4 has no price; row 5 has no neighbor, so no nearby average.
        assert_eq!(table.ids, vec![1, 2, 3]);

        let nearby = table.column("nearby_average_price").unwrap();
        assert_abs_diff_eq!(nearby[0], 250.0);
        assert_abs_diff_eq!(nearby[1], 200.0);

        // The unpriced listing still counts as a neighbor.
        let n_nearby = table.column("n_nearby").unwrap();
        assert_eq!(n_nearby, vec![3.0, 3.0, 3.0]);

        let response = table.column("host_response_time").unwrap();
        assert_eq!(response, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn priced_only_scope_shrinks_candidate_set() {
        let records = vec![
            record(1, 38.72, -9.14, Some(100.0)),
            record(2, 38.72, -9.14, None),
            record(3, 38.72, -9.14, Some(300.0)),
        ];

        let config = FeatureConfig {
            scope: CandidateScope::PricedOnly,
            ..FeatureConfig::default()
        };
        let table = build_features(&records, &config).unwrap();

        let n_nearby = table.column("n_nearby").unwrap();
        // With the unpriced row excluded from candidacy, each kept listing
        // sees exactly one neighbor.
        assert_eq!(n_nearby, vec![1.0, 1.0]);
    }

    #[test]
    fn beds_falls_back_to_bedrooms() {
        let mut a = record(1, 38.72, -9.14, Some(100.0));
        a.beds = None;
        a.bedrooms = Some(3.0);
        let b = record(2, 38.72, -9.14, Some(100.0));

        let table = build_features(&[a, b], &FeatureConfig::default()).unwrap();
        let beds = table.column("beds").unwrap();
        assert_eq!(beds[0], 3.0);
    }

    #[test]
    fn fills_and_flags() {
        let mut a = record(1, 38.72, -9.14, Some(100.0));
        a.review_scores_rating = None;
        a.reviews_per_month = None;
        a.host_location = Some("Lisbon, Portugal".to_string());
        a.instant_bookable = Some("t".to_string());
        let b = record(2, 38.72, -9.14, Some(100.0));

        let table = build_features(&[a, b], &FeatureConfig::default()).unwrap();
        assert_eq!(table.column("review_scores_rating").unwrap()[0], 0.0);
        assert_eq!(table.column("reviews_per_month").unwrap()[0], 0.0);
        assert_eq!(table.column("host_in_pt").unwrap(), vec![1.0, 0.0]);
        assert_eq!(table.column("instant_bookable").unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn csv_round_trip() {
        let records = vec![
            record(1, 38.72, -9.14, Some(100.0)),
            record(2, 38.72, -9.14, Some(200.0)),
        ];
        let table = build_features(&records, &FeatureConfig::default()).unwrap();

        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let back = FeatureTable::read_csv(buf.as_slice()).unwrap();
        assert_eq!(table, back);
    }
}
