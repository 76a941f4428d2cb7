//! Archive cache: content-addressed local storage gating network
//! fetches, plus fuzzy-name archive reads (spec §4.1).

mod archive;
mod fetch;
mod store;

pub use archive::ArchiveHandle;
pub use fetch::ByteFetcher;
#[cfg(feature = "http")]
pub use fetch::EhttpFetcher;
pub use fetch::NullFetcher;
pub use store::{ArchiveCache, ServerCredentials};
