use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("The cacher has no backing atlas to read sprites from.")]
    AtlasUnset,
    #[error(
        "Packed sprite name `{name}` is shorter than the {suffix_len}-character clone suffix."
    )]
    MalformedSpriteName { name: String, suffix_len: usize },
    #[error("The atlas reported {expected} sprites but only filled {filled} slots.")]
    IncompleteBulkFetch { expected: usize, filled: usize },
}
