use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::Notify;

/// Default runtime sampler: records a heartbeat and the process's available
/// parallelism on every tick, until `stop` is notified.
pub(crate) async fn run(interval: Duration, stop: Arc<Notify>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => sample_once(),
            () = stop.notified() => return,
        }
    }
}

fn sample_once() {
    counter!("busline_metrics_sampler_ticks_total").increment(1);
    if let Ok(parallelism) = std::thread::available_parallelism() {
        gauge!("busline_process_available_parallelism").set(parallelism.get() as f64);
    }
}
