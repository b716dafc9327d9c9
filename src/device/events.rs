use std::sync::{Arc, Mutex};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use log::debug;
use serde_json::Value;

use crate::error::DeviceError;

/**
 * The channel the scale SDK bridge publishes events on. Clones share the same channel.
 * At most one listener is attached at a time; events emitted while nobody listens are dropped.
 */
#[derive(Clone, Default)]
pub struct ScaleEventChannel {
    listener: Arc<Mutex<Option<UnboundedSender<Value>>>>,
}

impl ScaleEventChannel {
    pub fn new() -> Self {
        ScaleEventChannel::default()
    }

    pub fn add_listener(&self) -> Result<EventSubscription, DeviceError> {
        let mut listener = self.listener.lock().expect("Failed to lock ScaleEventChannel listener");

        if let Some(sender) = listener.as_ref() {
            if !sender.is_closed() {
                return Err(DeviceError::AlreadySubscribed);
            }
        }

        let (sender, receiver) = unbounded::<Value>();
        *listener = Some(sender);

        Ok(EventSubscription {
            receiver,
            channel: self.clone(),
        })
    }

    /// Returns false if the event was dropped because there is no listener.
    pub fn emit(&self, payload: Value) -> bool {
        let listener = self.listener.lock().expect("Failed to lock ScaleEventChannel listener");

        match listener.as_ref() {
            Some(sender) => sender.unbounded_send(payload).is_ok(),
            None => {
                debug!("No listener for scale event, dropping it");
                false
            },
        }
    }

    pub fn has_listener(&self) -> bool {
        let listener = self.listener.lock().expect("Failed to lock ScaleEventChannel listener");
        listener.as_ref().map_or(false, |sender| !sender.is_closed())
    }

    /// Closes the channel for the current listener; it sees the end of the stream once it has
    /// drained the events already queued.
    pub fn close(&self) {
        let listener = self.listener.lock().expect("Failed to lock ScaleEventChannel listener");
        if let Some(sender) = listener.as_ref() {
            sender.close_channel();
        }
    }

    fn release(&self, receiver: &UnboundedReceiver<Value>) {
        let mut listener = self.listener.lock().expect("Failed to lock ScaleEventChannel listener");

        // a closed channel may already have been handed to a newer listener
        if listener.as_ref().map_or(false, |sender| sender.is_connected_to(receiver)) {
            listener.take();
        }
    }
}

/// The receiving end held by the single listener. Dropping it releases the channel.
pub struct EventSubscription {
    receiver: UnboundedReceiver<Value>,
    channel: ScaleEventChannel,
}

impl EventSubscription {
    /// Waits for the next event; `None` once the channel is closed.
    pub async fn next(&mut self) -> Option<Value> {
        self.receiver.next().await
    }

    /// The next event if one is already queued.
    pub fn try_next(&mut self) -> Option<Value> {
        match self.receiver.try_next() {
            Ok(Some(payload)) => Some(payload),
            _ => None,
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.channel.release(&self.receiver);
        self.receiver.close();
    }
}
