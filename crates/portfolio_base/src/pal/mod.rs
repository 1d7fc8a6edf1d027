/* 📖 # What is the Platform Abstraction Layer?

The PAL is the single seam through which the application touches the outside world:
reading its configuration file and serving HTTP. Key benefits:
- Testability: MockPal keeps files in memory and dispatches requests to services
  without opening sockets
- Consistency: all side effects share the same error handling
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle};
