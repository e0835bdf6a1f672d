//! Actors own their state and are driven by messages. Every message carries the
//! sender's tracing span so the handler logs in the caller's context.

pub mod menu_bar;

use std::fmt;

use tokio::sync::mpsc;
use tracing::Span;

pub type Receiver<Event> = mpsc::UnboundedReceiver<(Span, Event)>;

pub struct Sender<Event>(mpsc::UnboundedSender<(Span, Event)>);

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Sender(self.0.clone()) }
}

impl<Event> fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sender").field(&self.0.is_closed()).finish()
    }
}

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    pub fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.0
            .send((Span::current(), event))
            .map_err(|mpsc::error::SendError((_, event))| mpsc::error::SendError(event))
    }

    /// Like [`Sender::send`], for callers that do not care whether the
    /// receiving actor is still alive.
    pub fn try_send(&self, event: Event) -> bool { self.send(event).is_ok() }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}
