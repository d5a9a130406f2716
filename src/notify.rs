use serde_json::Value;

/// Receives the complete persisted form of whatever changed, once per
/// committed edit, synchronously on the editing call stack.
pub trait ChangeSink {
    fn changed(&mut self, current: &Value);
}

impl<F> ChangeSink for F
where
    F: FnMut(&Value),
{
    fn changed(&mut self, current: &Value) {
        self(current)
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl ChangeSink for Discard {
    fn changed(&mut self, _current: &Value) {}
}
