//! Per-connection lifecycle: cancellation, state, and the SSE writer loop.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};

use super::Fragment;
use super::sse::{HEARTBEAT, STREAM_HEAD};
use crate::core::LiveError;
use crate::document::SubscriptionId;

/// First-wins cancellation flag shared by every teardown path.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that actually cancelled.
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Name validated, initial read done, nothing observed yet.
    Opening,
    /// Effect registered; pushes flow.
    Streaming,
    /// Terminal.
    Closed,
}

impl ConnState {
    pub fn can_move_to(self, next: ConnState) -> bool {
        matches!(
            (self, next),
            (Self::Opening, Self::Streaming) | (Self::Opening, Self::Closed) | (Self::Streaming, Self::Closed)
        )
    }
}

/// Releases the engine-side subscription of a connection.
pub trait Release {
    fn release(&self, id: SubscriptionId);
}

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The push channel was closed by the server side.
    Finished,
    /// The cancel token fired.
    Cancelled,
}

/// Server side of one open stream.
///
/// Every exit path, `Drop` included, funnels into a single release of the
/// subscription.
pub struct Connection<R: Release> {
    state: ConnState,
    subscription: Option<SubscriptionId>,
    cancel: CancelToken,
    release: R,
}

impl<R: Release> Connection<R> {
    pub fn new(release: R) -> Self {
        Self {
            state: ConnState::Opening,
            subscription: None,
            cancel: CancelToken::new(),
            release,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnState {
        self.state
    }

    #[cfg(test)]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Record the registered subscription.
    pub fn start(&mut self, id: SubscriptionId) -> Result<(), LiveError> {
        if !self.state.can_move_to(ConnState::Streaming) {
            return Err(LiveError::ChannelFault);
        }
        self.state = ConnState::Streaming;
        self.subscription = Some(id);
        Ok(())
    }

    /// Tear down. Only the first call releases anything.
    pub fn close(&mut self) -> bool {
        if !self.state.can_move_to(ConnState::Closed) {
            return false;
        }
        self.state = ConnState::Closed;
        self.cancel.cancel();
        if let Some(id) = self.subscription.take() {
            self.release.release(id);
        }
        true
    }

    /// Write pushes from `rx` to `out` until the stream ends.
    ///
    /// A heartbeat comment is written whenever `heartbeat` passes without a
    /// push, so a departed client is noticed even on an idle document.
    pub fn pump<W: Write>(
        &mut self,
        out: &mut W,
        rx: &Receiver<Fragment>,
        heartbeat: Duration,
    ) -> Result<StreamEnd, LiveError> {
        let result = pump(out, rx, heartbeat, &self.cancel);
        self.close();
        result
    }
}

impl<R: Release> Drop for Connection<R> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Write the stream head and then every fragment, flushing each one.
pub fn pump<W: Write>(
    out: &mut W,
    rx: &Receiver<Fragment>,
    heartbeat: Duration,
    cancel: &CancelToken,
) -> Result<StreamEnd, LiveError> {
    send(out, STREAM_HEAD)?;

    loop {
        if cancel.is_cancelled() {
            return Ok(StreamEnd::Cancelled);
        }
        match rx.recv_timeout(heartbeat) {
            Ok(fragment) => send(out, &fragment.encode())?,
            Err(RecvTimeoutError::Timeout) => send(out, HEARTBEAT)?,
            Err(RecvTimeoutError::Disconnected) => return Ok(StreamEnd::Finished),
        }
    }
}

fn send<W: Write>(out: &mut W, text: &str) -> Result<(), LiveError> {
    write_flush(out, text).map_err(|e| {
        crate::debug!("sse"; "write failed: {}", e);
        LiveError::ChannelFault
    })
}

fn write_flush<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crossbeam::channel::unbounded;

    use super::*;

    #[derive(Clone, Default)]
    struct Released(Rc<RefCell<Vec<SubscriptionId>>>);

    impl Release for Released {
        fn release(&self, id: SubscriptionId) {
            self.0.borrow_mut().push(id);
        }
    }

    fn some_id() -> SubscriptionId {
        SubscriptionId::from_raw(7)
    }

    /// Writer that fails after `budget` bytes.
    struct Failing {
        budget: usize,
    }

    impl Write for Failing {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cancel_token_first_wins() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.cancel());
        assert!(!other.cancel());
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_state_transitions() {
        use ConnState::*;
        assert!(Opening.can_move_to(Streaming));
        assert!(Opening.can_move_to(Closed));
        assert!(Streaming.can_move_to(Closed));
        assert!(!Closed.can_move_to(Streaming));
        assert!(!Closed.can_move_to(Opening));
        assert!(!Streaming.can_move_to(Opening));
    }

    #[test]
    fn test_close_releases_once() {
        let released = Released::default();
        let id = some_id();
        let mut conn = Connection::new(released.clone());
        conn.start(id).unwrap();

        assert!(conn.close());
        assert!(!conn.close());
        assert!(conn.cancel_token().is_cancelled());
        drop(conn);
        assert_eq!(*released.0.borrow(), vec![id]);
    }

    #[test]
    fn test_drop_releases() {
        let released = Released::default();
        let id = some_id();
        {
            let mut conn = Connection::new(released.clone());
            conn.start(id).unwrap();
        }
        assert_eq!(*released.0.borrow(), vec![id]);
    }

    #[test]
    fn test_closed_cannot_restart() {
        let mut conn = Connection::new(Released::default());
        conn.close();
        assert!(conn.start(some_id()).is_err());
        assert_eq!(conn.state(), ConnState::Closed);
    }

    #[test]
    fn test_pump_writes_head_and_events() {
        let (tx, rx) = unbounded();
        tx.send(Fragment::merge("<p>a</p>")).unwrap();
        tx.send(Fragment::remove("#x")).unwrap();
        drop(tx);

        let mut out = Vec::new();
        let end = pump(&mut out, &rx, Duration::from_secs(5), &CancelToken::new()).unwrap();
        assert_eq!(end, StreamEnd::Finished);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(STREAM_HEAD));
        let merge = text.find("datastar-merge-fragments").unwrap();
        let remove = text.find("datastar-remove-fragments").unwrap();
        assert!(merge < remove);
    }

    #[test]
    fn test_pump_heartbeat_on_idle() {
        let (tx, rx) = unbounded::<Fragment>();
        let cancel = CancelToken::new();

        let canceller = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            canceller.cancel();
            drop(tx);
        });

        let mut out = Vec::new();
        pump(&mut out, &rx, Duration::from_millis(10), &cancel).unwrap();
        handle.join().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(HEARTBEAT));
    }

    #[test]
    fn test_pump_write_failure_is_fault() {
        let (tx, rx) = unbounded();
        tx.send(Fragment::merge("<p>a</p>")).unwrap();

        let mut out = Failing {
            budget: STREAM_HEAD.len(),
        };
        let result = pump(&mut out, &rx, Duration::from_secs(5), &CancelToken::new());
        assert!(matches!(result, Err(LiveError::ChannelFault)));
    }

    #[test]
    fn test_connection_pump_closes() {
        let released = Released::default();
        let id = some_id();
        let (tx, rx) = unbounded();
        drop(tx);

        let mut conn = Connection::new(released.clone());
        conn.start(id).unwrap();
        conn.pump(&mut Vec::new(), &rx, Duration::from_secs(5)).unwrap();

        assert_eq!(conn.state(), ConnState::Closed);
        assert_eq!(*released.0.borrow(), vec![id]);
    }
}
