//! Mock delivery API for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::schedule::{DeliveryApi, DeliveryError, UploadRequest};

/// Mock implementation of the [`DeliveryApi`] trait. Records uploads and
/// hands out sequential remote ids.
#[derive(Default)]
pub struct MockDeliveryApi {
    requests: Mutex<Vec<UploadRequest>>,
    next_error: Mutex<Option<String>>,
}

impl MockDeliveryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `upload` call fail; consumed once.
    pub fn fail_next(&self, message: &str) {
        *self.next_error.lock().unwrap() = Some(message.to_string());
    }

    /// Uploads accepted so far, in order.
    pub fn requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryApi for MockDeliveryApi {
    async fn upload(&self, request: &UploadRequest) -> Result<String, DeliveryError> {
        if let Some(message) = self.next_error.lock().unwrap().take() {
            return Err(DeliveryError::Upload(message));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(format!("remote-{}", requests.len()))
    }
}
