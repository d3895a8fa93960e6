/// Configuration for a [`crate::WorkerPool`]
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Subject to subscribe to.
    pub subject: String,
    /// Optional queue group; when set, only one worker pool member in the
    /// group receives any given message.
    pub queue_group: Option<String>,
    /// Maximum number of messages processed concurrently. Also used as the
    /// row limit for the outbound scanner's periodic query.
    pub batch_size: usize,
}

impl WorkerConfig {
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.batch_size.max(1)
    }
}
