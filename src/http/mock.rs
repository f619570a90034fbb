use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ApiRequest, Transport};
use crate::error::Result;

/// Records every request and answers from a queue of canned replies.
#[derive(Default)]
pub(crate) struct MockTransport {
    requests: Mutex<Vec<ApiRequest>>,
    replies: Mutex<VecDeque<Result<Vec<u8>>>>,
}

impl MockTransport {
    pub(crate) fn reply(&self, body: impl Into<Vec<u8>>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(body.into()));
        self
    }
    pub(crate) fn fail(&self, error: crate::Error) -> &Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }
    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
    pub(crate) fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(b"{}".to_vec()))
    }
}
