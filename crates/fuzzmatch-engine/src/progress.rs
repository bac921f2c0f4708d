//! Rate-limited progress reporting from the match worker.
//!
//! The worker owns the only [`ProgressSender`]; the caller owns the only
//! [`ProgressReceiver`] and polls it without blocking. At most about eleven
//! `Progress` messages are sent per run, followed by a single `Done`.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Message sent from the worker to the polling caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// `completed` of `total` units (left records) are finished.
    Progress { completed: usize, total: usize },
    /// Matching and assembly are complete; the result can be collected.
    Done,
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (sender, receiver) = mpsc::channel();
    (ProgressSender { sender }, ProgressReceiver { receiver })
}

/// Worker side of the progress channel.
#[derive(Debug)]
pub struct ProgressSender {
    sender: Sender<ProgressUpdate>,
}

impl ProgressSender {
    /// Start counting `total` units of work.
    pub fn reporter(&self, total: usize) -> ProgressReporter<'_> {
        ProgressReporter {
            sender: self,
            completed: 0,
            total,
            step: report_step(total),
        }
    }

    /// Signal that the run has finished.
    pub fn done(&self) {
        self.send(ProgressUpdate::Done);
    }

    fn send(&self, update: ProgressUpdate) {
        // A dropped receiver only means nobody is watching.
        let _ = self.sender.send(update);
    }
}

/// Counts finished units and forwards boundary crossings to the channel.
#[derive(Debug)]
pub struct ProgressReporter<'a> {
    sender: &'a ProgressSender,
    completed: usize,
    total: usize,
    step: usize,
}

impl ProgressReporter<'_> {
    /// Record one finished unit of work.
    pub fn tick(&mut self) {
        self.completed += 1;
        if self.completed % self.step == 0 || self.completed == self.total {
            self.sender.send(ProgressUpdate::Progress {
                completed: self.completed,
                total: self.total,
            });
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}

/// Caller side of the progress channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    receiver: Receiver<ProgressUpdate>,
}

impl ProgressReceiver {
    /// Next pending update, without blocking.
    pub fn try_next(&self) -> Option<ProgressUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next update.
    pub fn next_timeout(&self, timeout: Duration) -> Option<ProgressUpdate> {
        match self.receiver.recv_timeout(timeout) {
            Ok(update) => Some(update),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All updates currently queued.
    pub fn drain(&self) -> Vec<ProgressUpdate> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

/// 10% of `total`, rounded up, never below one unit.
fn report_step(total: usize) -> usize {
    total.div_ceil(10).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_values(updates: &[ProgressUpdate]) -> Vec<usize> {
        updates
            .iter()
            .filter_map(|u| match u {
                ProgressUpdate::Progress { completed, .. } => Some(*completed),
                ProgressUpdate::Done => None,
            })
            .collect()
    }

    #[test]
    fn reports_every_tenth_and_the_last_unit() {
        let (sender, receiver) = channel();
        let mut reporter = sender.reporter(25);
        for _ in 0..25 {
            reporter.tick();
        }
        sender.done();

        let updates = receiver.drain();
        // step = ceil(2.5) = 3
        assert_eq!(
            completed_values(&updates),
            vec![3, 6, 9, 12, 15, 18, 21, 24, 25]
        );
        assert_eq!(updates.last(), Some(&ProgressUpdate::Done));
    }

    #[test]
    fn small_runs_report_each_unit() {
        let (sender, receiver) = channel();
        let mut reporter = sender.reporter(3);
        for _ in 0..3 {
            reporter.tick();
        }
        assert_eq!(completed_values(&receiver.drain()), vec![1, 2, 3]);
    }

    #[test]
    fn message_count_is_bounded() {
        let (sender, receiver) = channel();
        let mut reporter = sender.reporter(100_000);
        for _ in 0..100_000 {
            reporter.tick();
        }
        assert_eq!(receiver.drain().len(), 10);
    }

    #[test]
    fn short_runs_stay_within_eleven_messages() {
        for total in 1..=200 {
            let (sender, receiver) = channel();
            let mut reporter = sender.reporter(total);
            for _ in 0..total {
                reporter.tick();
            }
            let updates = receiver.drain();
            assert!(updates.len() <= 11, "total {total}: {} messages", updates.len());
            assert_eq!(
                updates.last(),
                Some(&ProgressUpdate::Progress {
                    completed: total,
                    total
                })
            );
        }

        let (sender, receiver) = channel();
        let mut reporter = sender.reporter(12);
        for _ in 0..12 {
            reporter.tick();
        }
        assert_eq!(completed_values(&receiver.drain()), vec![2, 4, 6, 8, 10, 12]);
    }

    #[test]
    fn try_next_is_empty_when_nothing_sent() {
        let (_sender, receiver) = channel();
        assert_eq!(receiver.try_next(), None);
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (sender, receiver) = channel();
        drop(receiver);
        let mut reporter = sender.reporter(1);
        reporter.tick();
        sender.done();
    }
}
