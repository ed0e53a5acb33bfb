//! Message sinks

use super::Message;
use std::ops::ControlFlow;

/// Receiver for messages produced by a read.
///
/// Returning `ControlFlow::Break` asks the producer to stop; no further
/// fetches should be issued once a sink has broken.
pub trait MessageSink: Send {
    /// Accept one message
    fn emit(&mut self, message: Message) -> ControlFlow<()>;
}

impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> ControlFlow<()> {
        self.push(message);
        ControlFlow::Continue(())
    }
}
