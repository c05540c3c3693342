//! Layer 5a: Dataset cleaning
//!
//! ## Purpose
//!
//! This stage turns a raw listings export into the typed, numeric table the
//! feature stage consumes: it selects the columns the pipeline uses, parses
//! currency-formatted prices, and validates coordinates. Column pruning is a
//! schema decision here; deserialization simply ignores everything outside
//! the retained column set.
//!
//! ## Design notes
//!
//! * **Lenient values, strict structure**: A malformed price or coordinate
//!   degrades to `None` on that row; a structurally broken CSV row is an
//!   error surfaced to the caller.
//! * **Round-trippable**: `CleanRecord` serializes back to CSV with empty
//!   fields for missing values, and reads back identically.

use std::io::{Read, Write};

use log::info;
use serde::{Deserialize, Serialize};

use crate::primitives::{Coordinates, Listing, Result};

/// One row of the raw listings export, as scraped. Only the retained columns
/// are mapped; price arrives currency-formatted (`"$1,234.00"`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: u64,
    #[serde(default)]
    pub host_location: Option<String>,
    #[serde(default)]
    pub host_response_time: Option<String>,
    #[serde(default)]
    pub host_response_rate: Option<String>,
    #[serde(default)]
    pub host_is_superhost: Option<String>,
    #[serde(default)]
    pub host_listings_count: Option<f64>,
    #[serde(default)]
    pub neighbourhood_cleansed: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub accommodates: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<f64>,
    #[serde(default)]
    pub beds: Option<f64>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub minimum_nights: Option<f64>,
    #[serde(default)]
    pub maximum_nights: Option<f64>,
    #[serde(default)]
    pub availability_30: Option<f64>,
    #[serde(default)]
    pub availability_60: Option<f64>,
    #[serde(default)]
    pub availability_90: Option<f64>,
    #[serde(default)]
    pub availability_365: Option<f64>,
    #[serde(default)]
    pub number_of_reviews: Option<f64>,
    #[serde(default)]
    pub review_scores_rating: Option<f64>,
    #[serde(default)]
    pub instant_bookable: Option<String>,
    #[serde(default)]
    pub reviews_per_month: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// One cleaned row: same columns, price parsed to a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub id: u64,
    pub host_location: Option<String>,
    pub host_response_time: Option<String>,
    pub host_response_rate: Option<String>,
    pub host_is_superhost: Option<String>,
    pub host_listings_count: Option<f64>,
    pub neighbourhood_cleansed: Option<String>,
    pub property_type: Option<String>,
    pub room_type: Option<String>,
    pub accommodates: Option<f64>,
    pub bedrooms: Option<f64>,
    pub beds: Option<f64>,
    pub price: Option<f64>,
    pub minimum_nights: Option<f64>,
    pub maximum_nights: Option<f64>,
    pub availability_30: Option<f64>,
    pub availability_60: Option<f64>,
    pub availability_90: Option<f64>,
    pub availability_365: Option<f64>,
    pub number_of_reviews: Option<f64>,
    pub review_scores_rating: Option<f64>,
    pub instant_bookable: Option<String>,
    pub reviews_per_month: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CleanRecord {
    /// The record's validated position, if it has one.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => None,
        }
    }

    /// Project down to the view the neighbor aggregator works on.
    pub fn to_listing(&self) -> Listing {
        Listing {
            id: self.id,
            coords: self.coordinates(),
            price: self.price,
        }
    }
}

/// Parse a currency-formatted price (`"$1,234.00"`) or a plain number.
/// Empty or unparseable input yields `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Clean a single raw row.
pub fn clean_record(raw: RawRecord) -> CleanRecord {
    CleanRecord {
        id: raw.id,
        host_location: raw.host_location,
        host_response_time: raw.host_response_time,
        host_response_rate: raw.host_response_rate,
        host_is_superhost: raw.host_is_superhost,
        host_listings_count: raw.host_listings_count,
        neighbourhood_cleansed: raw.neighbourhood_cleansed,
        property_type: raw.property_type,
        room_type: raw.room_type,
        accommodates: raw.accommodates,
        bedrooms: raw.bedrooms,
        beds: raw.beds,
        price: raw.price.as_deref().and_then(parse_price),
        minimum_nights: raw.minimum_nights,
        maximum_nights: raw.maximum_nights,
        availability_30: raw.availability_30,
        availability_60: raw.availability_60,
        availability_90: raw.availability_90,
        availability_365: raw.availability_365,
        number_of_reviews: raw.number_of_reviews,
        review_scores_rating: raw.review_scores_rating,
        instant_bookable: raw.instant_bookable,
        reviews_per_month: raw.reviews_per_month,
        latitude: raw.latitude,
        longitude: raw.longitude,
    }
}

/// Read a raw listings export. Columns outside `RawRecord` are ignored.
pub fn read_raw_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        out.push(row?);
    }
    Ok(out)
}

/// Clean every row of a raw export.
pub fn clean(raw: Vec<RawRecord>) -> Vec<CleanRecord> {
    let total = raw.len();
    let cleaned: Vec<CleanRecord> = raw.into_iter().map(clean_record).collect();
    let priced = cleaned.iter().filter(|r| r.price.is_some()).count();
    info!("cleaned {total} rows ({priced} with a parseable price)");
    cleaned
}

/// Write the cleaned table; missing values become empty fields.
pub fn write_clean_csv<W: Write>(writer: W, records: &[CleanRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a cleaned table back.
pub fn read_clean_csv<R: Read>(reader: R) -> Result<Vec<CleanRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_currency_prices() {
        assert_eq!(parse_price("$1,234.00"), Some(1234.0));
        assert_eq!(parse_price("$85.00"), Some(85.0));
        assert_eq!(parse_price("62.5"), Some(62.5));
        assert_eq!(parse_price(" $99 "), Some(99.0));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("n/a"), None);
    }

    #[test]
    fn clean_parses_price_and_keeps_the_rest() {
        let raw_csv = "\
id,name,price,latitude,longitude,room_type,listing_url
1,Sunny flat,\"$1,250.00\",38.72,-9.14,Entire home/apt,http://x
2,Spare room,,38.71,-9.13,Private room,http://y
";
        let raw = read_raw_csv(raw_csv.as_bytes()).unwrap();
        assert_eq!(raw.len(), 2);

        let records = clean(raw);
        assert_eq!(records[0].price, Some(1250.0));
        assert_eq!(records[0].room_type.as_deref(), Some("Entire home/apt"));
        assert!(records[1].price.is_none());
        assert!(records[0].coordinates().is_some());
    }

    #[test]
    fn clean_csv_round_trip() {
        let raw_csv = "id,price,latitude,longitude\n5,$80.00,38.72,-9.14\n6,,,\n";
        let records = clean(read_raw_csv(raw_csv.as_bytes()).unwrap());

        let mut buf = Vec::new();
        write_clean_csv(&mut buf, &records).unwrap();
        let back = read_clean_csv(buf.as_slice()).unwrap();
        assert_eq!(records, back);
    }

    #[test]
    fn out_of_range_coordinates_have_no_position() {
        let raw_csv = "id,price,latitude,longitude\n1,$10.00,95.0,-9.14\n";
        let records = clean(read_raw_csv(raw_csv.as_bytes()).unwrap());
        assert!(records[0].coordinates().is_none());
        assert!(records[0].to_listing().coords.is_none());
    }
}
