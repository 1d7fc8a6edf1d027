/* 📖 # Why have portfolio_base as a core library?
portfolio_base provides the foundational error handling, logging setup and platform
abstraction used by the other crates. The engine depends on these abstractions
rather than on std::fs or tiny_http directly, which keeps it testable with MockPal.
*/

pub mod error;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, FieldError, PortfolioError, PortfolioResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
