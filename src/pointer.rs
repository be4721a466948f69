//! Registry of pointer listeners and the global pointer style.
//!
//! Listeners are held as [`Subscription`] guards and the style as a
//! [`StyleOverride`] guard; dropping either undoes it, so every exit path
//! (normal release, focus loss, view teardown) releases what was acquired.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Pointer release inside a passage or question region.
    Selection,
    /// Pointer press anywhere, used to dismiss the highlight popup.
    Dismiss,
    DragMove,
    DragRelease,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    ColumnResize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerStyle {
    pub cursor: CursorStyle,
    pub text_selection: bool,
}

impl Default for PointerStyle {
    fn default() -> Self {
        Self {
            cursor: CursorStyle::Default,
            text_selection: true,
        }
    }
}

#[derive(Debug, Default)]
struct HubState {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
    style: PointerStyle,
}

#[derive(Clone, Debug, Default)]
pub struct PointerHub {
    state: Rc<RefCell<HubState>>,
}

impl PointerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, listener);
        Subscription {
            id,
            listener,
            hub: Rc::downgrade(&self.state),
        }
    }

    pub fn is_listening(&self, listener: Listener) -> bool {
        self.state
            .borrow()
            .listeners
            .values()
            .any(|&l| l == listener)
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn style(&self) -> PointerStyle {
        self.state.borrow().style
    }

    /// Replace the pointer style until the returned guard is dropped.
    pub fn override_style(&self, style: PointerStyle) -> StyleOverride {
        let previous = std::mem::replace(&mut self.state.borrow_mut().style, style);
        StyleOverride {
            previous,
            hub: Rc::downgrade(&self.state),
        }
    }
}

#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listener: Listener,
    hub: Weak<RefCell<HubState>>,
}

impl Subscription {
    pub fn listener(&self) -> Listener {
        self.listener
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.hub.upgrade() {
            state.borrow_mut().listeners.remove(&self.id);
        }
    }
}

#[derive(Debug)]
pub struct StyleOverride {
    previous: PointerStyle,
    hub: Weak<RefCell<HubState>>,
}

impl Drop for StyleOverride {
    fn drop(&mut self) {
        if let Some(state) = self.hub.upgrade() {
            state.borrow_mut().style = self.previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_released_on_drop() {
        let hub = PointerHub::new();
        let sub = hub.subscribe(Listener::Selection);
        assert!(hub.is_listening(Listener::Selection));
        assert_eq!(sub.listener(), Listener::Selection);
        drop(sub);
        assert!(!hub.is_listening(Listener::Selection));
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_same_kind_counted_independently() {
        let hub = PointerHub::new();
        let a = hub.subscribe(Listener::Dismiss);
        let b = hub.subscribe(Listener::Dismiss);
        drop(a);
        assert!(hub.is_listening(Listener::Dismiss));
        drop(b);
        assert!(!hub.is_listening(Listener::Dismiss));
    }

    #[test]
    fn test_style_override_restores_previous() {
        let hub = PointerHub::new();
        let guard = hub.override_style(PointerStyle {
            cursor: CursorStyle::ColumnResize,
            text_selection: false,
        });
        assert_eq!(hub.style().cursor, CursorStyle::ColumnResize);
        assert!(!hub.style().text_selection);
        drop(guard);
        assert_eq!(hub.style(), PointerStyle::default());
    }

    #[test]
    fn test_guard_outliving_hub_is_harmless() {
        let hub = PointerHub::new();
        let sub = hub.subscribe(Listener::DragMove);
        drop(hub);
        drop(sub);
    }
}
