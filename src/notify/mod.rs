pub mod broadcast;

use crate::model::Joke;

pub use broadcast::BroadcastHub;

/// Fire-and-forget fan-out of a new joke to everyone listening on `topic`.
///
/// No acknowledgment and no retry; implementations must not block.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, joke: &Joke);
}
