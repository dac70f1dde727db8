//! Auth-domain identifiers, bearer-token claims, and freshness verdicts.

pub mod claims;
pub mod freshness;
pub mod id;
pub mod secret;

pub use claims::*;
pub use freshness::*;
pub use id::*;
pub use secret::*;
