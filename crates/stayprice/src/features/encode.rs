//! One-hot encoding of categorical listing columns.
//!
//! ## Purpose
//!
//! Expands a categorical column into one indicator column per observed
//! category. Column names are `<prefix>_<category>` with the category
//! lowercased and spaces replaced by underscores. A missing category encodes
//! as all zeros; there is no dedicated missing-value column.

use std::collections::BTreeSet;

/// Fitted encoder for one categorical column.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    prefix: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Learn the category set from a pass over the column. Categories are
    /// sanitized first, deduplicated, and kept in sorted order so column
    /// layout is deterministic.
    pub fn fit<'a, I>(prefix: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let categories: BTreeSet<String> = values
            .into_iter()
            .flatten()
            .map(Self::sanitize)
            .collect();
        Self {
            prefix: prefix.to_string(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Number of indicator columns this encoder produces.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Output column names, in encoding order.
    pub fn column_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.prefix, c))
            .collect()
    }

    /// Append the indicator values for one row onto `out`.
    pub fn encode(&self, value: Option<&str>, out: &mut Vec<f64>) {
        let sanitized = value.map(Self::sanitize);
        for category in &self.categories {
            let hit = sanitized.as_deref() == Some(category.as_str());
            out.push(if hit { 1.0 } else { 0.0 });
        }
    }

    fn sanitize(raw: &str) -> String {
        raw.trim().to_lowercase().replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_sorts_and_sanitizes() {
        let values = [
            Some("Entire home/apt"),
            Some("Private room"),
            None,
            Some("Private room"),
        ];
        let enc = OneHotEncoder::fit("room", values);
        assert_eq!(
            enc.column_names(),
            vec!["room_entire_home/apt", "room_private_room"]
        );
    }

    #[test]
    fn encode_hits_one_column() {
        let enc = OneHotEncoder::fit("room", [Some("A"), Some("B")]);
        let mut row = Vec::new();
        enc.encode(Some("b"), &mut row);
        assert_eq!(row, vec![0.0, 1.0]);
    }

    #[test]
    fn missing_category_is_all_zeros() {
        let enc = OneHotEncoder::fit("room", [Some("A"), Some("B")]);
        let mut row = Vec::new();
        enc.encode(None, &mut row);
        assert_eq!(row, vec![0.0, 0.0]);

        row.clear();
        enc.encode(Some("unseen"), &mut row);
        assert_eq!(row, vec![0.0, 0.0]);
    }
}
