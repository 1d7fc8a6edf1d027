use std::sync::Arc;

use crate::PortfolioResult;

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/* 📖 # Why is Pal a trait instead of a struct?

Using a trait enables two key benefits:
1. **Testability**: MockPal implements Pal for fast, deterministic tests without
   filesystem or network side effects
2. **Flexibility**: Code depends on the abstraction, not the concrete implementation
*/

/// Platform Abstraction Layer (PAL) trait.
///
/// Two implementations are provided:
/// - `RealPal`: std::fs and a tiny_http server
/// - `MockPal`: in-memory files and in-process request dispatch
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> PortfolioResult<bool>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> PortfolioResult<String>;

    /// Start an HTTP server with the given service.
    ///
    /// The server starts immediately. Dropping the returned handle (or calling
    /// `shutdown()` on it) stops it.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> PortfolioResult<HttpServerHandle>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// ```
/// use portfolio_base::{MockPal, PalHandle};
///
/// let pal = PalHandle::new(MockPal::new());
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
