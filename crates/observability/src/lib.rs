//! Process-wide logging setup shared by the invoicer binaries.

pub mod tracing;

pub use self::tracing::DEFAULT_FILTER;

/// Install the JSON tracing subscriber.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    self::tracing::init(DEFAULT_FILTER);
}
