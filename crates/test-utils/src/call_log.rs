use std::cell::RefCell;
use std::rc::Rc;

/// Shared record of which factories ran, in invocation order.
///
/// Cheap to clone; every clone appends to the same log, so a test can hand
/// one clone to each factory closure and inspect the original afterwards.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.calls.borrow_mut().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.as_str() == name).count()
    }

    /// Position of the first call to `name`, if it ran at all.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}
