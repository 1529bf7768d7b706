use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pseudonymous sender label, generated once per session and immutable for
/// its lifetime. Not a credential: uniqueness rests on the uuid-v4 space
/// being large enough for a room of tens to low-hundreds of users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn generate() -> Self {
        Self(format!("user-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which producer introduced a message into the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    History,
    Live,
    Optimistic,
}

/// Display-side attribution, derived from the sender label. Never stored on
/// the message itself so it cannot diverge from `sender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Own,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: String,
    pub origin: Origin,
}

impl Message {
    pub fn orientation(&self, local: &Identity) -> Orientation {
        if self.sender == local.0 {
            Orientation::Own
        } else {
            Orientation::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identities_are_distinct_and_labeled() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("user-"));
        assert!(a.as_str().len() > "user-".len());
    }

    #[test]
    fn orientation_follows_sender_regardless_of_origin() {
        let local = Identity("user-local".to_string());
        for origin in [Origin::History, Origin::Live, Origin::Optimistic] {
            let own = Message {
                text: "hi".to_string(),
                sender: "user-local".to_string(),
                origin,
            };
            let other = Message {
                text: "hi".to_string(),
                sender: "user-remote".to_string(),
                origin,
            };
            assert_eq!(own.orientation(&local), Orientation::Own);
            assert_eq!(other.orientation(&local), Orientation::Other);
        }
    }
}
