//! Incremental secondary index
//!
//! One bucket map per indexed field, from field value to the set of row
//! handles currently holding that value. Rebuilt incrementally as rows are
//! applied; never the source of truth for a field's current value, which is
//! always re-read from the owning row.
//!
//! All indexed fields are immutable once written except `unexecuted_qty`,
//! whose bucket membership must move every time the counter changes.

use crate::query::QueryError;
use std::collections::{BTreeSet, HashMap};

/// Fields the index maintains buckets for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Wire type tag
    MsgType,
    /// Server-assigned order number
    OrderNo,
    /// Ticker symbol
    Ticker,
    /// Limit price
    Price,
    /// Ack success/fail code
    ResponseCode,
    /// Derived remaining quantity (the only mutable key)
    UnexecutedQty,
}

impl Field {
    /// All indexed fields
    pub const ALL: [Field; 6] = [
        Field::MsgType,
        Field::OrderNo,
        Field::Ticker,
        Field::Price,
        Field::ResponseCode,
        Field::UnexecutedQty,
    ];

    /// Resolve a field by its row attribute name
    pub fn parse(name: &str) -> Result<Self, QueryError> {
        match name {
            "msg_type" => Ok(Self::MsgType),
            "order_no" => Ok(Self::OrderNo),
            "ticker" => Ok(Self::Ticker),
            "price" => Ok(Self::Price),
            "response_code" => Ok(Self::ResponseCode),
            "unexecuted_qty" => Ok(Self::UnexecutedQty),
            other => Err(QueryError::UnsupportedParam {
                name: other.to_string(),
            }),
        }
    }

    /// The row attribute name
    pub const fn name(self) -> &'static str {
        match self {
            Self::MsgType => "msg_type",
            Self::OrderNo => "order_no",
            Self::Ticker => "ticker",
            Self::Price => "price",
            Self::ResponseCode => "response_code",
            Self::UnexecutedQty => "unexecuted_qty",
        }
    }
}

/// Field-keyed lookup structure over ledger rows
///
/// Holds row handles only; the ledger owns the rows.
#[derive(Debug, Default)]
pub struct FieldIndex {
    buckets: HashMap<Field, HashMap<String, BTreeSet<usize>>>,
}

impl FieldIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handle into a field bucket
    pub fn insert(&mut self, field: Field, value: &str, handle: usize) {
        self.buckets
            .entry(field)
            .or_default()
            .entry(value.to_string())
            .or_default()
            .insert(handle);
    }

    /// Remove a handle from a field bucket, dropping the bucket when empty
    pub fn remove(&mut self, field: Field, value: &str, handle: usize) {
        if let Some(by_value) = self.buckets.get_mut(&field) {
            if let Some(set) = by_value.get_mut(value) {
                set.remove(&handle);
                if set.is_empty() {
                    by_value.remove(value);
                }
            }
        }
    }

    /// Move a handle between buckets of the same field
    ///
    /// Used for `unexecuted_qty`, whose key changes with every counter
    /// mutation; removal and reinsertion happen together so no intermediate
    /// state is observable.
    pub fn reassign(&mut self, field: Field, old_value: &str, new_value: &str, handle: usize) {
        if old_value == new_value {
            return;
        }
        self.remove(field, old_value, handle);
        self.insert(field, new_value, handle);
    }

    /// Handles currently filed under (field, value)
    pub fn bucket(&self, field: Field, value: &str) -> BTreeSet<usize> {
        self.buckets
            .get(&field)
            .and_then(|by_value| by_value.get(value))
            .cloned()
            .unwrap_or_default()
    }

    /// AND-intersection across criteria
    ///
    /// Zero criteria is a caller error: an intersection over nothing has no
    /// sensible result set, and silence would hide the bug.
    pub fn query(&self, criteria: &[(Field, &str)]) -> Result<BTreeSet<usize>, QueryError> {
        if criteria.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(self.intersect(criteria))
    }

    /// Intersection over one or more criteria; empty input yields the empty set
    pub(crate) fn intersect(&self, criteria: &[(Field, &str)]) -> BTreeSet<usize> {
        let mut iter = criteria.iter();
        let mut result = match iter.next() {
            Some((field, value)) => self.bucket(*field, value),
            None => return BTreeSet::new(),
        };
        for (field, value) in iter {
            if result.is_empty() {
                break;
            }
            let next = self.bucket(*field, value);
            result = result.intersection(&next).copied().collect();
        }
        result
    }

    /// Single-field NOT: every handle filed under `field` with a different value
    ///
    /// Rows that never had the field at all are not filed anywhere under it
    /// and therefore do not appear here either.
    pub fn exclude(&self, field: Field, value: &str) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        if let Some(by_value) = self.buckets.get(&field) {
            for (bucket_value, handles) in by_value {
                if bucket_value != value {
                    result.extend(handles.iter().copied());
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FieldIndex {
        let mut index = FieldIndex::new();
        // rows 0 and 1 on ticker A, row 2 on ticker B
        index.insert(Field::Ticker, "000660", 0);
        index.insert(Field::Ticker, "000660", 1);
        index.insert(Field::Ticker, "005930", 2);
        index.insert(Field::Price, "60000", 0);
        index.insert(Field::Price, "61000", 1);
        index.insert(Field::Price, "60000", 2);
        index.insert(Field::UnexecutedQty, "00020", 0);
        index.insert(Field::UnexecutedQty, "00000", 1);
        index.insert(Field::UnexecutedQty, "00005", 2);
        index
    }

    #[test]
    fn test_and_intersection() {
        let index = sample_index();
        let hits = index
            .query(&[(Field::Ticker, "000660"), (Field::Price, "60000")])
            .unwrap();
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_empty_query_is_an_error() {
        let index = sample_index();
        assert!(matches!(index.query(&[]), Err(QueryError::EmptyQuery)));
    }

    #[test]
    fn test_missing_value_yields_empty_set() {
        let index = sample_index();
        let hits = index.query(&[(Field::Ticker, "999999")]).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_exclude() {
        let index = sample_index();
        let live = index.exclude(Field::UnexecutedQty, "00000");
        assert_eq!(live.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_reassign_moves_bucket_membership() {
        let mut index = sample_index();
        index.reassign(Field::UnexecutedQty, "00020", "00010", 0);

        assert!(index.bucket(Field::UnexecutedQty, "00020").is_empty());
        assert!(index.bucket(Field::UnexecutedQty, "00010").contains(&0));

        // no-op when the value is unchanged
        index.reassign(Field::UnexecutedQty, "00010", "00010", 0);
        assert!(index.bucket(Field::UnexecutedQty, "00010").contains(&0));
    }

    #[test]
    fn test_field_parse() {
        assert_eq!(Field::parse("ticker").unwrap(), Field::Ticker);
        assert_eq!(Field::parse("unexecuted_qty").unwrap(), Field::UnexecutedQty);
        let err = Field::parse("venue").unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedParam { .. }));
    }

    #[test]
    fn test_every_field_name_parses_back() {
        for field in Field::ALL {
            assert_eq!(Field::parse(field.name()).unwrap(), field);
        }
    }
}
