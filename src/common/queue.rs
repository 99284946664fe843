//! Message queues between the editor and its front ends.
//!
//! `Queue` carries commands to exactly one consumer; `BroadcastQueue` fans
//! editor events out to every subscriber.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{Result, StateflowError};

/// Bounded MPMC queue backed by flume.
#[derive(Clone)]
pub struct Queue<T> {
    receiver: Arc<flume::Receiver<T>>,
    sender: Arc<flume::Sender<T>>,
}

impl<T> Queue<T> {
    /// create a new queue
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, rx) = flume::bounded(cap);

        Arc::new(Self {
            receiver: Arc::new(rx),
            sender: Arc::new(tx),
        })
    }

    /// receive a message from the queue asynchronously
    pub async fn next_async(&self) -> Option<T> {
        self.receiver.recv_async().await.ok()
    }

    /// send a message to the queue asynchronously, waiting while it is full
    pub async fn send_async(
        &self,
        msg: T,
    ) -> Result<()> {
        self.sender.send_async(msg).await.map_err(|e| StateflowError::Queue(e.to_string()))
    }

    /// take a message without waiting
    pub fn try_next(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// number of queued messages
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

/// Broadcast queue for one-to-many message distribution.
///
/// Backed by tokio's broadcast channel. Sending with no subscriber is an error.
#[derive(Clone)]
pub struct BroadcastQueue<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    /// create a new broadcast queue
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(cap);

        Arc::new(Self {
            sender: Arc::new(tx),
        })
    }

    /// send a message to the queue
    pub fn send(
        &self,
        msg: T,
    ) -> Result<()> {
        self.sender.send(msg).map_err(|e| StateflowError::Queue(e.to_string()))?;
        Ok(())
    }

    /// subscribe to the queue
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::{BroadcastQueue, Queue};

    #[tokio::test]
    async fn test_queue_is_fifo() {
        let queue = Queue::new(4);
        queue.send_async(1).await.unwrap();
        queue.send_async(2).await.unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_async().await, Some(1));
        assert_eq!(queue.try_next(), Some(2));
        assert_eq!(queue.try_next(), None);
    }

    #[tokio::test]
    async fn test_broadcast_needs_subscriber() {
        let queue = BroadcastQueue::new(4);
        assert!(queue.send("lost").is_err());

        let mut rx = queue.subscribe();
        queue.send("seen").unwrap();
        assert_eq!(rx.recv().await.unwrap(), "seen");
    }
}
