use serde::{Deserialize, Serialize};

use crate::models::{
    value_lists::{apply_value_lists, RawValueList, ValueLists},
    Metadata, Record,
};

/// The body of a data response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub(crate) data: Data,
    #[serde(default)]
    pub(crate) value_lists: Vec<RawValueList>,
}

/// `data` is an array on list endpoints and an object on single-record endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Data {
    Many(Vec<Record>),
    One(Record),
}

impl Data {
    pub(crate) fn into_records(self) -> Vec<Record> {
        match self {
            Data::Many(records) => records,
            Data::One(record) => vec![record],
        }
    }
}

/// The accumulated result of a pull.
///
/// Records are kept in the order the API returned them, page by page.
/// Value lists are present when they were requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_lists: Option<ValueLists>,
    #[serde(skip)]
    pub(crate) metadata: Metadata,
}

impl Records {
    pub(crate) fn new(url: String, with_value_lists: bool) -> Self {
        Self {
            records: Vec::new(),
            value_lists: with_value_lists.then(ValueLists::new),
            metadata: Metadata::new(url),
        }
    }

    /// Appends one page worth of data.
    pub(crate) fn push_page(&mut self, envelope: Envelope) -> usize {
        let page = envelope.data.into_records();
        let count = page.len();
        self.records.extend(page);
        if let Some(lists) = self.value_lists.as_mut() {
            lists.merge(ValueLists::from_wire(&envelope.value_lists));
        }
        self.metadata.pages += 1;
        count
    }

    /// Returns the value lists returned alongside the records (if requested).
    pub fn value_lists(&self) -> Option<&ValueLists> {
        self.value_lists.as_ref()
    }

    /// Replaces coded values with their descriptions in place.
    ///
    /// Returns how many values were substituted. Does nothing if no value
    /// lists were requested.
    pub fn resolve(&mut self) -> usize {
        match &self.value_lists {
            Some(lists) => apply_value_lists(&mut self.records, lists),
            None => 0,
        }
    }

    /// Returns the URL the records were pulled from.
    pub fn url(&self) -> &str {
        self.metadata.url()
    }

    /// Returns how many pages were requested.
    pub fn pages(&self) -> u32 {
        self.metadata.pages
    }

    /// Returns the total count reported by the API (if any).
    pub fn total_count(&self) -> Option<u64> {
        self.metadata.total_count
    }

    /// Consumes `self`, returning the records and the value lists.
    pub fn into_parts(self) -> (Vec<Record>, Option<ValueLists>) {
        (self.records, self.value_lists)
    }

    /// Consumes `self`, returning only the records.
    pub fn into_inner(self) -> Vec<Record> {
        self.records
    }
}

impl std::ops::Deref for Records {
    type Target = Vec<Record>;

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl IntoIterator for Records {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for Records {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for record in &self.records {
            let line = serde_json::to_string(record).map_err(|_| std::fmt::Error)?;
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
