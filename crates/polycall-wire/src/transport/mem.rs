use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::message::Message;

use super::ByteTransport;

const CHANNEL_CAPACITY: usize = 64;

/// In-process transport backed by a pair of cross-wired `tokio::mpsc` channels.
/// Grounded in the teacher's `MemTransport`.
#[derive(Clone, Debug)]
pub struct MemTransport {
    inner: Arc<InProcInner>,
}

#[derive(Debug)]
struct InProcInner {
    tx: mpsc::Sender<Message>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Message>>,
    closed: AtomicBool,
}

impl MemTransport {
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel(CHANNEL_CAPACITY);
        let (tx_b, rx_b) = mpsc::channel(CHANNEL_CAPACITY);

        let inner_a = Arc::new(InProcInner {
            tx: tx_b,
            rx: tokio::sync::Mutex::new(rx_a),
            closed: AtomicBool::new(false),
        });
        let inner_b = Arc::new(InProcInner {
            tx: tx_a,
            rx: tokio::sync::Mutex::new(rx_b),
            closed: AtomicBool::new(false),
        });

        (Self { inner: inner_a }, Self { inner: inner_b })
    }

    fn is_closed_inner(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl ByteTransport for MemTransport {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.is_closed_inner() {
            return Err(TransportError::Closed);
        }
        self.inner
            .tx
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&self) -> Result<Message, TransportError> {
        if self.is_closed_inner() {
            return Err(TransportError::Closed);
        }
        let mut rx = self.inner.rx.lock().await;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.is_closed_inner()
    }
}
