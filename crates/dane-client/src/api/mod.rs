//! Client operations.

mod scan;
mod tlsa;

pub use scan::ScanBuilder;
pub use tlsa::TlsaApi;
