/// [`Records`]: the accumulated result of a pull.
///
/// [`Records`]: crate::records::Records
pub mod records;

/// [`Token`]: the bearer token and its metadata.
///
/// [`Token`]: crate::token::Token
pub mod token;

/// [`ValueLists`] and [`apply_value_lists`].
///
/// [`ValueLists`]: crate::value_lists::ValueLists
/// [`apply_value_lists`]: crate::value_lists::apply_value_lists
pub mod value_lists;

/// A single schemaless record as returned by the API.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default)]
pub(crate) struct Metadata {
    url: String,
    pub(crate) pages: u32,
    pub(crate) total_count: Option<u64>,
}

impl Metadata {
    pub(crate) fn new(url: String) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }
}

pub(crate) mod macros {
    macro_rules! str_opt_ref {
        ($x:expr) => {
            $x.as_ref().map(|x| x.as_ref())
        };
    }

    pub(crate) use str_opt_ref;
}
