/* 📖 # Why is the API split into router, body, errors and service?

- `router`: the dispatch table and path-template matching, independent of projects
- `body`: turning request bodies into typed payloads, with the 400/422 split
- `errors`: turning failures into client responses
- `service`: the project handlers themselves, implementing `HttpService`

The service is the only part that knows about the store.
*/

mod body;
mod errors;
mod router;
mod service;

pub use router::{PathParams, PathTemplate, RouteMatch, Router};
pub use service::{ApiService, ApiSettings, BoundPort};
