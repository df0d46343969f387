//! HTTP value objects: headers, methods, status codes, validators,
//! requests and responses. Everything here is immutable and `Send + Sync`.

pub mod cache_control;
pub mod conditionals;
pub mod date;
pub mod header;
pub mod method;
pub mod payload;
pub mod preferences;
pub mod request;
pub mod response;
pub mod status;
pub mod tag;
pub mod uri;

pub use cache_control::CacheControl;
pub use conditionals::Conditionals;
pub use header::{Header, Headers};
pub use method::Method;
pub use payload::Payload;
pub use preferences::{Preference, Preferences};
pub use request::{Challenge, HttpRequest};
pub use response::HttpResponse;
pub use status::Status;
pub use tag::Tag;
