use std::sync::Arc;

use crate::providers::completion::ChatCompletionClient;
use crate::providers::identification::IdentificationClient;
use crate::sessions::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub identification: IdentificationClient,
    pub completion: ChatCompletionClient,
}
