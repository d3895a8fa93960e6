use std::sync::Mutex;

use crate::proto::Message;

/// A freelist of [`Message`] response objects
///
/// Every [`ResponsePool::get`] must be paired with a [`ResponsePool::put`],
/// including on error paths, or entries leak indefinitely.
#[derive(Debug, Default)]
pub struct ResponsePool {
    free: Mutex<Vec<Message>>,
}

impl ResponsePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Message {
        self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pop().unwrap_or_default()
    }

    pub fn put(&self, mut message: Message) {
        message.subject.clear();
        message.data.clear();
        self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::ResponsePool;

    #[test]
    fn reuses_reset_entries() {
        let pool = ResponsePool::new();
        let mut msg = pool.get();
        msg.subject = "test.subject".to_owned();
        msg.data = vec![1, 2, 3];
        pool.put(msg);

        let reused = pool.get();
        assert!(reused.subject.is_empty());
        assert!(reused.data.is_empty());
    }
}
