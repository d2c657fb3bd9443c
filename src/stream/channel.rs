//! Push channel between the engine thread and a connection's writer.

use std::cell::RefCell;

use crossbeam::channel::{Receiver, Sender, unbounded};

use super::Fragment;
use crate::core::LiveError;

/// Outbound side of a push channel.
pub trait PushSink {
    /// Queue one fragment. Fails with `ChannelFault` once the reader is gone.
    fn push(&self, fragment: Fragment) -> Result<(), LiveError>;

    /// Stop accepting pushes; the reader sees the end of the stream.
    fn close(&self);
}

/// Engine-side end of an unbounded crossbeam channel.
pub struct ChannelSink {
    tx: RefCell<Option<Sender<Fragment>>>,
}

/// Create a connected sink and receiver.
pub fn channel() -> (ChannelSink, Receiver<Fragment>) {
    let (tx, rx) = unbounded();
    (
        ChannelSink {
            tx: RefCell::new(Some(tx)),
        },
        rx,
    )
}

impl PushSink for ChannelSink {
    fn push(&self, fragment: Fragment) -> Result<(), LiveError> {
        let tx = self.tx.borrow();
        let tx = tx.as_ref().ok_or(LiveError::ChannelFault)?;
        tx.send(fragment).map_err(|_| LiveError::ChannelFault)
    }

    fn close(&self) {
        self.tx.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::TryRecvError;

    #[test]
    fn test_push_in_order() {
        let (sink, rx) = channel();
        sink.push(Fragment::merge("a")).unwrap();
        sink.push(Fragment::merge("b")).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Fragment::merge("a"));
        assert_eq!(rx.try_recv().unwrap(), Fragment::merge("b"));
    }

    #[test]
    fn test_dropped_reader_is_fault() {
        let (sink, rx) = channel();
        drop(rx);
        assert!(matches!(
            sink.push(Fragment::merge("a")),
            Err(LiveError::ChannelFault)
        ));
    }

    #[test]
    fn test_close_disconnects_reader() {
        let (sink, rx) = channel();
        sink.push(Fragment::merge("last")).unwrap();
        sink.close();

        assert_eq!(rx.try_recv().unwrap(), Fragment::merge("last"));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
        assert!(sink.push(Fragment::merge("late")).is_err());
    }
}
