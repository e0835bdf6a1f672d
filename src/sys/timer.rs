use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::{Instant, Sleep, sleep_until};

/// A re-armable one-shot timer. A manual timer never fires until
/// [`Timer::set_next_fire`] is called, and fires once per arming.
pub struct Timer {
    sleep: Pin<Box<Sleep>>,
    armed: bool,
}

impl Timer {
    pub fn manual() -> Self {
        Timer {
            sleep: Box::pin(sleep_until(Instant::now())),
            armed: false,
        }
    }

    pub fn set_next_fire(&mut self, after: Duration) {
        self.sleep.as_mut().reset(Instant::now() + after);
        self.armed = true;
    }

    pub fn cancel(&mut self) { self.armed = false; }

    pub fn is_armed(&self) -> bool { self.armed }
}

impl Future for Timer {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if !self.armed {
            return Poll::Pending;
        }
        match self.sleep.as_mut().poll(cx) {
            Poll::Ready(()) => {
                self.armed = false;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
