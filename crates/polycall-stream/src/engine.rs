use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use parking_lot::Mutex;
use polycall_state::Engine as TransitionEngine;
use polycall_wire::Message;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::observer::StreamObserver;
use crate::reconnect::backoff_delay_ms;
use crate::state::StreamState;
use crate::stats::{StatsInner, StreamStats};

type ThresholdCallback = Box<dyn Fn(usize) + Send + Sync>;

/// A buffered, observable duplex stream layered on `polycall-wire` frames
/// (`spec.md` §4.4). Send-side backpressure is enforced against
/// `config.buffer_size`; receive-side buffering is exposed through
/// [`DuplexStream::poll`] / [`DuplexStream::receive`].
pub struct DuplexStream {
    config: StreamConfig,
    engine: TransitionEngine<StreamState>,
    inbox: Mutex<VecDeque<Message>>,
    buffered_bytes: AtomicUsize,
    observers: Mutex<Vec<Box<dyn StreamObserver>>>,
    threshold_callback: Mutex<Option<(usize, ThresholdCallback)>>,
    stats: StatsInner,
    reconnect_attempts: AtomicU32,
}

impl DuplexStream {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            engine: TransitionEngine::new(StreamState::Init),
            inbox: Mutex::new(VecDeque::new()),
            buffered_bytes: AtomicUsize::new(0),
            observers: Mutex::new(Vec::new()),
            threshold_callback: Mutex::new(None),
            stats: StatsInner::default(),
            reconnect_attempts: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn state(&self) -> StreamState {
        self.engine.snapshot().state
    }

    pub fn add_observer(&self, observer: Box<dyn StreamObserver>) {
        self.observers.lock().push(observer);
    }

    /// Installs the callback fired when buffered bytes cross
    /// `threshold_bytes` (`spec.md` §4.4: "a configured threshold" /
    /// "on_buffer_threshold"). This threshold is independent of
    /// `config.buffer_size`, the cap `send` enforces in non-blocking mode.
    pub fn set_threshold_callback(&self, threshold_bytes: usize, callback: impl Fn(usize) + Send + Sync + 'static) {
        *self.threshold_callback.lock() = Some((threshold_bytes, Box::new(callback)));
    }

    pub fn open(&self) -> Result<(), StreamError> {
        self.engine
            .request_transition(StreamState::Init, StreamState::Open)
            .map(|_| ())
            .map_err(|_| StreamError::NotActive)
    }

    pub fn activate(&self) -> Result<(), StreamError> {
        self.engine
            .request_transition(StreamState::Open, StreamState::Active)
            .map(|_| ())
            .map_err(|_| StreamError::NotActive)
    }

    pub fn pause(&self) -> Result<(), StreamError> {
        self.engine
            .request_transition(StreamState::Active, StreamState::Paused)
            .map(|_| ())
            .map_err(|_| StreamError::NotActive)
    }

    pub fn resume(&self) -> Result<(), StreamError> {
        self.engine
            .request_transition(StreamState::Paused, StreamState::Active)
            .map(|_| ())
            .map_err(|_| StreamError::NotActive)
    }

    pub fn close(&self) {
        let current = self.state();
        if current != StreamState::Closed {
            let _ = self.engine.request_transition(current, StreamState::Closing);
            let _ = self.engine.request_transition(StreamState::Closing, StreamState::Closed);
        }
        for observer in self.observers.lock().iter() {
            observer.on_complete();
        }
    }

    /// Sends a message. `non_blocking` mirrors `spec.md` §4.4: once buffered
    /// bytes cross `config.buffer_size`, a non-blocking send returns
    /// `WouldBlock` instead of buffering further.
    pub fn send(&self, message: Message, non_blocking: bool) -> Result<(), StreamError> {
        if self.state() != StreamState::Active {
            return Err(StreamError::NotActive);
        }
        if message.payload.len() > self.config.max_message_size {
            return Err(StreamError::MessageTooLarge {
                size: message.payload.len(),
                max: self.config.max_message_size,
            });
        }

        let buffered = self.buffered_bytes.load(Ordering::Acquire);
        if non_blocking && buffered + message.payload.len() > self.config.buffer_size {
            let err = StreamError::WouldBlock;
            for observer in self.observers.lock().iter() {
                observer.on_error(&err);
            }
            return Err(err);
        }

        self.stats.record_send(message.payload.len());
        Ok(())
    }

    /// Delivers a message arriving off the underlying transport into the
    /// receive buffer, notifying observers and firing the backpressure
    /// callback if the new total crosses the threshold.
    pub fn deliver(&self, message: Message) {
        let size = message.payload.len();
        self.stats.record_receive(size);

        let mut inbox = self.inbox.lock();
        inbox.push_back(message.clone());
        drop(inbox);

        let before = self.buffered_bytes.fetch_add(size, Ordering::AcqRel);
        let after = before + size;
        if let Some((threshold, callback)) = self.threshold_callback.lock().as_ref() {
            if before <= *threshold && after > *threshold {
                callback(after);
            }
        }

        for observer in self.observers.lock().iter() {
            observer.on_next(&message);
        }
    }

    /// True when at least one complete message is buffered for receipt
    /// (`spec.md` §4.4: "Polling returns true when >=1 complete message is
    /// buffered.").
    pub fn poll(&self) -> bool {
        !self.inbox.lock().is_empty()
    }

    pub fn receive(&self) -> Option<Message> {
        let mut inbox = self.inbox.lock();
        let message = inbox.pop_front()?;
        drop(inbox);
        self.buffered_bytes.fetch_sub(message.payload.len(), Ordering::AcqRel);
        Some(message)
    }

    pub fn stats(&self) -> StreamStats {
        self.stats.snapshot()
    }

    /// Computes the next auto-reconnect delay and bumps the attempt
    /// counter. Only meaningful when `config.auto_reconnect` is set; callers
    /// drive the actual retry loop.
    pub fn next_reconnect_delay_ms(&self) -> u64 {
        let attempt = self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
        backoff_delay_ms(attempt, self.config.reconnect_timeout_ms)
    }

    pub fn reset_reconnect_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycall_wire::MessageType;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn active_stream(buffer_size: usize) -> DuplexStream {
        let stream = DuplexStream::new(StreamConfig { buffer_size, ..StreamConfig::default() });
        stream.open().unwrap();
        stream.activate().unwrap();
        stream
    }

    #[test]
    fn send_then_receive_round_trips_through_deliver() {
        let stream = active_stream(1024);
        assert!(!stream.poll());
        stream.deliver(Message::new(MessageType::Stream, 1, b"hello".to_vec()));
        assert!(stream.poll());
        let msg = stream.receive().unwrap();
        assert_eq!(msg.payload, b"hello");
        assert!(!stream.poll());
    }

    #[test]
    fn non_blocking_send_over_threshold_returns_would_block() {
        let stream = active_stream(4);
        stream.deliver(Message::new(MessageType::Stream, 1, b"xxxxx".to_vec()));
        let err = stream
            .send(Message::new(MessageType::Stream, 2, b"more".to_vec()), true)
            .unwrap_err();
        assert_eq!(err, StreamError::WouldBlock);
    }

    #[test]
    fn threshold_callback_fires_once_crossed() {
        let stream = active_stream(4);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        stream.set_threshold_callback(4, move |_| flag.store(true, Ordering::SeqCst));
        stream.deliver(Message::new(MessageType::Stream, 1, b"xxxxx".to_vec()));
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn threshold_callback_uses_its_own_threshold_not_buffer_size() {
        let stream = active_stream(1024);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        stream.set_threshold_callback(4, move |_| flag.store(true, Ordering::SeqCst));

        stream.deliver(Message::new(MessageType::Stream, 1, b"xx".to_vec()));
        assert!(!fired.load(Ordering::SeqCst), "2 bytes is under the 4-byte threshold");

        stream.deliver(Message::new(MessageType::Stream, 2, b"xxx".to_vec()));
        assert!(fired.load(Ordering::SeqCst), "5 buffered bytes crossed the 4-byte threshold");
    }

    #[test]
    fn oversized_message_is_rejected() {
        let stream = DuplexStream::new(StreamConfig { max_message_size: 4, ..StreamConfig::default() });
        stream.open().unwrap();
        stream.activate().unwrap();
        let err = stream
            .send(Message::new(MessageType::Stream, 1, b"toolong".to_vec()), false)
            .unwrap_err();
        assert!(matches!(err, StreamError::MessageTooLarge { .. }));
    }

    #[test]
    fn send_before_active_is_rejected() {
        let stream = DuplexStream::new(StreamConfig::default());
        let err = stream
            .send(Message::new(MessageType::Stream, 1, b"hi".to_vec()), false)
            .unwrap_err();
        assert_eq!(err, StreamError::NotActive);
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let stream = active_stream(1024);
        stream.pause().unwrap();
        assert_eq!(stream.state(), StreamState::Paused);
        stream.resume().unwrap();
        assert_eq!(stream.state(), StreamState::Active);
    }

    #[test]
    fn stats_track_sent_and_received_messages() {
        let stream = active_stream(1024);
        stream.send(Message::new(MessageType::Stream, 1, b"out".to_vec()), false).unwrap();
        stream.deliver(Message::new(MessageType::Stream, 2, b"in".to_vec()));
        let stats = stream.stats();
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.messages_received, 1);
    }

    #[test]
    fn reconnect_backoff_increases_with_each_call() {
        let stream = DuplexStream::new(StreamConfig { reconnect_timeout_ms: 10_000, ..StreamConfig::default() });
        let first = stream.next_reconnect_delay_ms();
        let second = stream.next_reconnect_delay_ms();
        assert!(second > first);
        stream.reset_reconnect_attempts();
        assert_eq!(stream.next_reconnect_delay_ms(), first);
    }
}
