use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Background tick source for the focus countdown.
///
/// Ticks queue on a channel; the owner drains them with [`Ticker::poll`]
/// from its own loop. Starting a running ticker cancels the old thread
/// first, so at most one tick source exists at a time.
#[derive(Debug)]
pub struct Ticker {
    interval: Duration,
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    ticks: mpsc::Receiver<()>,
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker {
            interval,
            running: None,
        }
    }

    /// One tick per second
    pub fn per_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// (Re)start ticking. Ticks still queued from a previous run are dropped.
    pub fn start(&mut self) {
        self.stop();
        let (tick_tx, ticks) = mpsc::channel();
        let (stop, stop_rx) = mpsc::channel::<()>();
        let interval = self.interval;
        let spawned = std::thread::Builder::new()
            .name("taskdeck-focus".into())
            .spawn(move || {
                while let Err(mpsc::RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
                    if tick_tx.send(()).is_err() {
                        break;
                    }
                }
            });
        match spawned {
            Ok(handle) => {
                self.running = Some(Running {
                    ticks,
                    stop,
                    handle,
                })
            }
            Err(e) => tracing::warn!(error = %e, "could not start focus ticker"),
        }
    }

    /// Cancel the tick thread. No-op when stopped.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            drop(running.stop);
            if running.handle.join().is_err() {
                tracing::warn!("focus ticker panicked");
            }
        }
    }

    /// Non-blocking: number of ticks that arrived since the last poll.
    pub fn poll(&self) -> usize {
        match &self.running {
            Some(running) => running.ticks.try_iter().count(),
            None => 0,
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_arrive_while_running() {
        let mut ticker = Ticker::new(Duration::from_millis(5));
        ticker.start();
        assert!(ticker.is_running());
        std::thread::sleep(Duration::from_millis(60));
        assert!(ticker.poll() > 0);
        ticker.stop();
        assert!(!ticker.is_running());
        assert_eq!(ticker.poll(), 0);
    }

    #[test]
    fn test_restart_replaces_previous_thread() {
        let mut ticker = Ticker::new(Duration::from_secs(3600));
        ticker.start();
        ticker.start();
        assert!(ticker.is_running());
        assert_eq!(ticker.poll(), 0);
        ticker.stop();
        ticker.stop();
    }
}
