use std::future::Future;

use tokio::task::JoinHandle;
use tracing::info;

/// Owns the single task producing positions (simulator or GPS). Starting a
/// new producer aborts the previous one, so two sources never interleave.
#[derive(Debug, Default)]
pub struct PositionFeed {
    current: Option<(String, JoinHandle<()>)>,
}

impl PositionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch_to<F>(&mut self, name: &str, producer: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        info!("feed: {} started", name);
        self.current = Some((name.to_string(), tokio::spawn(producer)));
    }

    /// Take over an already spawned producer.
    pub fn adopt(&mut self, name: &str, handle: JoinHandle<()>) {
        self.stop();
        info!("feed: {} adopted", name);
        self.current = Some((name.to_string(), handle));
    }

    pub fn stop(&mut self) {
        if let Some((name, handle)) = self.current.take() {
            if !handle.is_finished() {
                info!("feed: {} aborted", name);
            }
            handle.abort();
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.current.as_ref().filter(|(_, h)| !h.is_finished()).map(|(n, _)| n.as_str())
    }
}

impl Drop for PositionFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
