use serde::{Deserialize, Serialize};

use crate::domain::{Message, Origin};

/// Wire record shared by all three backend surfaces: elements of the
/// `GET /recent` response, elements of a live push batch, and the body of
/// `POST /message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub sender: String,
    pub message: String,
}

impl ChatRecord {
    pub fn into_message(self, origin: Origin) -> Message {
        Message {
            text: self.message,
            sender: self.sender,
            origin,
        }
    }
}
