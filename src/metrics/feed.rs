use std::sync::mpsc::{self, Receiver, Sender};

use super::Sample;

/// Creates the hand-off channel between the sampler and the presenter
pub fn feed() -> (FeedSender, FeedReceiver) {
    let (tx, rx) = mpsc::channel();
    (FeedSender { tx }, FeedReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: Sender<Sample>,
}

impl FeedSender {
    /// Queues a sample without blocking.
    ///
    /// Returns `false` once the receiving side has been dropped.
    pub fn push(&self, sample: Sample) -> bool {
        self.tx.send(sample).is_ok()
    }
}

/// Result of emptying the feed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Drained {
    /// How many samples were pending
    pub count: usize,
    /// The newest of them
    pub latest: Option<Sample>,
}

#[derive(Debug)]
pub struct FeedReceiver {
    rx: Receiver<Sample>,
}

impl FeedReceiver {
    /// Takes every pending sample, oldest to newest, without blocking
    pub fn drain(&self) -> Drained {
        self.rx
            .try_iter()
            .fold(Drained::default(), |drained, sample| Drained {
                count: drained.count + 1,
                latest: Some(sample),
            })
    }
}
