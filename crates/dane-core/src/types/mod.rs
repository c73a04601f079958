mod chain;
mod query;
mod scan;
mod tlsa;

pub use chain::*;
pub use query::*;
pub use scan::*;
pub use tlsa::*;
