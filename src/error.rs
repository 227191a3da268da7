use thiserror::Error;

/// Errors returned by both engines. Always raised before any simulation state exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An address maps to a page index outside the configured page count
    #[error("address {address} maps to page {page}, but only {pages} pages are configured")]
    AddressOutOfRange { address: u64, page: u64, pages: usize },

    /// A paging/scheduling configuration or workload violates a documented constraint
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
