use crate::{Event, Result as WsErrorResult};

use futures::stream::BoxStream;

/// Lazily produced events. An `Err` item is a transient producer failure;
/// the end of the stream means the source is exhausted.
pub type EventStream = BoxStream<'static, WsErrorResult<Event>>;

/// Anything that can feed the broadcast coordinator
pub trait EventSource: Send + 'static {
    fn into_stream(self) -> EventStream;
}

impl EventSource for EventStream {
    fn into_stream(self) -> EventStream {
        self
    }
}
