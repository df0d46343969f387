//! The network collaborator.

use async_trait::async_trait;

use crate::Error;
use crate::http::{HttpRequest, HttpResponse};

/// Sends a request to the origin and returns whatever it answered.
///
/// Implementations own timeouts, retries and connection handling. Failures
/// are reported as [`Error::Transport`] (or one of its siblings) and must not
/// be converted into synthetic responses.
#[async_trait]
pub trait NetworkExchanger: Send + Sync {
    async fn exchange(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}
