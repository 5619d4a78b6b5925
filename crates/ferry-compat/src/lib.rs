//! Ferry Site Compatibility
//!
//! Advisory lookup consulted before a page is relayed. Some sites refuse to be
//! embedded or depend on heavy client-side code; relaying them usually ends in
//! a blank page. The check never blocks anything by itself, it only produces a
//! level and a warning the caller can show with a "try anyway" option.

mod advisory;

pub use advisory::{CompatibilityChecker, CompatibilityLevel, KnownSite, COMPATIBLE_EXAMPLES};
