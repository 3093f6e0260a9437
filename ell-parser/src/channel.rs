// ell-parser - Channels
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Named, bounded FIFO channels used for message passing between flows.
//!
//! Every blocking operation takes a [`Timeout`] built from a single number:
//! `0` polls, a negative value blocks forever, a positive value waits up to
//! that many seconds.
//!
//! Closing drops the channel's sender. Values already buffered can still be
//! received; once the buffer drains, `receive` yields `None` immediately.
//! Sending on a closed channel reports failure instead of panicking.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::value::Value;

static NEXT_CHANNEL_ID: AtomicUsize = AtomicUsize::new(1);

/// How long a channel operation may wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timeout {
    /// Return immediately.
    Poll,
    /// Block until the operation can complete.
    Forever,
    /// Block for at most this long.
    Bounded(Duration),
}

impl Timeout {
    /// Interpret a timeout given in seconds. Waits too long to represent
    /// are treated as forever.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds == 0.0 {
            Timeout::Poll
        } else if seconds < 0.0 || !seconds.is_finite() {
            Timeout::Forever
        } else {
            Duration::try_from_secs_f64(seconds).map_or(Timeout::Forever, Timeout::Bounded)
        }
    }
}

/// A shared handle to a channel. Clones refer to the same queue.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    name: String,
    id: usize,
    capacity: usize,
    sender: Mutex<Option<Sender<Value>>>,
    receiver: Receiver<Value>,
    closed: AtomicBool,
}

impl Channel {
    /// Create a channel buffering up to `capacity` values. A capacity of 0
    /// makes a rendezvous channel.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::SeqCst);
        Channel {
            inner: Arc::new(ChannelInner {
                name: name.into(),
                id,
                capacity,
                sender: Mutex::new(Some(sender)),
                receiver,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// The channel's name (may be empty).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Buffer capacity.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.inner.receiver.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.receiver.is_empty()
    }

    /// Send a value. Returns false if the channel is closed or the timeout
    /// expired before buffer space became available.
    pub fn send(&self, value: Value, timeout: Timeout) -> bool {
        let Some(sender) = self.inner.sender.lock().clone() else {
            return false;
        };
        match timeout {
            Timeout::Poll => sender.try_send(value).is_ok(),
            Timeout::Forever => sender.send(value).is_ok(),
            Timeout::Bounded(wait) => sender.send_timeout(value, wait).is_ok(),
        }
    }

    /// Receive a value. Returns `None` on timeout, or once the channel is
    /// closed and drained.
    pub fn receive(&self, timeout: Timeout) -> Option<Value> {
        let receiver = &self.inner.receiver;
        if self.is_closed() {
            return match receiver.try_recv() {
                Ok(value) => Some(value),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
            };
        }
        match timeout {
            Timeout::Poll => receiver.try_recv().ok(),
            Timeout::Forever => receiver.recv().ok(),
            Timeout::Bounded(wait) => match receiver.recv_timeout(wait) {
                Ok(value) => Some(value),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
            },
        }
    }

    /// Close the channel. Closing twice is harmless.
    pub fn close(&self) {
        self.inner.sender.lock().take();
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.name.is_empty() {
            write!(f, "#[channel {}]", self.inner.id)
        } else {
            write!(f, "#[channel {}]", self.inner.name)
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Channel {{ id: {}, capacity: {}, len: {}, closed: {} }}",
            self.inner.id,
            self.inner.capacity,
            self.len(),
            self.is_closed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_timeout_from_seconds() {
        assert_eq!(Timeout::from_seconds(0.0), Timeout::Poll);
        assert_eq!(Timeout::from_seconds(-1.0), Timeout::Forever);
        assert_eq!(Timeout::from_seconds(1e20), Timeout::Forever);
        assert_eq!(
            Timeout::from_seconds(0.5),
            Timeout::Bounded(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_fifo() {
        let ch = Channel::new("fifo", 3);
        for i in 0..3 {
            assert!(ch.send(Value::Number(i as f64), Timeout::Poll));
        }
        for i in 0..3 {
            assert_eq!(ch.receive(Timeout::Poll), Some(Value::Number(i as f64)));
        }
    }

    #[test]
    fn test_poll_send_on_full_buffer_fails_fast() {
        let ch = Channel::new("full", 1);
        assert!(ch.send(Value::Null, Timeout::Poll));
        let start = Instant::now();
        assert!(!ch.send(Value::Null, Timeout::Poll));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_bounded_receive_times_out() {
        let ch = Channel::new("", 1);
        let start = Instant::now();
        assert_eq!(ch.receive(Timeout::from_seconds(0.02)), None);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_closed_channel() {
        let ch = Channel::new("c", 2);
        assert!(ch.send(Value::Boolean(true), Timeout::Poll));
        ch.close();
        ch.close();
        assert!(!ch.send(Value::Null, Timeout::Forever));
        assert_eq!(ch.receive(Timeout::Forever), Some(Value::Boolean(true)));
        assert_eq!(ch.receive(Timeout::Forever), None);
    }

    #[test]
    fn test_cross_thread() {
        let ch = Channel::new("xt", 0);
        let tx = ch.clone();
        let handle = std::thread::spawn(move || tx.send(Value::Number(42.0), Timeout::Forever));
        assert_eq!(ch.receive(Timeout::Forever), Some(Value::Number(42.0)));
        assert!(handle.join().unwrap());
    }
}
