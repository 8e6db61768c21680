use aws_smithy_runtime_api::box_error::BoxError;
use aws_smithy_runtime_api::client::interceptors::Intercept;
use aws_smithy_runtime_api::client::interceptors::context::BeforeTransmitInterceptorContextRef;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_types::config_bag::ConfigBag;

use std::fmt;
use std::sync::{Arc, Mutex};

/// Captures the URL a request was sent to.
///
/// The store's responses do not carry the canonical URL of the object, so
/// this interceptor watches the outbound request at transmit time and
/// records its URL with the query string stripped. Registered per request
/// by [`SdkClient`](super::SdkClient) on the operations whose output feeds
/// `UploadOutput.location`.
#[derive(Clone, Default)]
pub(crate) struct LocationRecorder {
    location: Arc<Mutex<Option<String>>>,
}

impl LocationRecorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The most recently observed URL, if any request has been transmitted.
    pub(crate) fn take(&self) -> Option<String> {
        self.location.lock().unwrap().take()
    }
}

impl Intercept for LocationRecorder {
    fn name(&self) -> &'static str {
        "LocationRecorder"
    }

    fn read_before_transmit(
        &self,
        context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let uri = context.request().uri().to_string();
        let location = match uri.split_once('?') {
            Some((base, _)) => base.to_string(),
            None => uri,
        };
        *self.location.lock().unwrap() = Some(location);
        Ok(())
    }
}

impl fmt::Debug for LocationRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationRecorder")
            .field("location", &self.location.lock().unwrap())
            .finish()
    }
}
