use core::any::Any;
use core::fmt;

/// Default fifo element: a state tag plus optional owned payloads.
///
/// The fifo never looks inside a message. `state` is whatever the two ends agree on; by
/// convention [`Message::QUIT_STATE`] asks the consumer to stop.
#[derive(Default)]
pub struct Message {
    pub state: i32,
    pub text: Option<String>,
    pub data: Option<Box<dyn Any + Send>>,
}

impl Message {
    pub const QUIT_STATE: i32 = -1;

    pub fn new(state: i32) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn quit() -> Self {
        Self::new(Self::QUIT_STATE)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_data<D: Any + Send>(mut self, data: D) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    pub fn is_quit(&self) -> bool {
        self.state == Self::QUIT_STATE
    }

    /// Takes the payload out if it is a `D`. A payload of another type is left in place.
    pub fn take_data<D: Any + Send>(&mut self) -> Option<D> {
        match self.data.take()?.downcast::<D>() {
            Ok(d) => Some(*d),
            Err(other) => {
                self.data = Some(other);
                None
            }
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("state", &self.state)
            .field("text", &self.text)
            .field("data", &self.data.as_ref().map(|_| "<opaque>"))
            .finish()
    }
}
