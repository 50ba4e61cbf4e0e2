//! Widget Registry
//!
//! Live widgets on the page, addressable by instance id. Outer integrations
//! (for instance a message listener for the hosted iframe) signal
//! completion through [`WidgetRegistry::notify_external_completion`]
//! instead of a page-global callback.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::widget::{InstanceId, Widget};

/// Registry of mounted widgets
#[derive(Debug)]
pub struct WidgetRegistry {
    next_id: Cell<InstanceId>,
    widgets: RefCell<BTreeMap<InstanceId, Widget>>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetRegistry {
    pub const fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            widgets: RefCell::new(BTreeMap::new()),
        }
    }

    /// Reserve the next instance id
    pub fn allocate_id(&self) -> InstanceId {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1).max(1));
        id
    }

    pub fn insert(&self, widget: Widget) {
        self.widgets.borrow_mut().insert(widget.id(), widget);
    }

    pub fn get(&self, id: InstanceId) -> Option<Widget> {
        self.widgets.borrow().get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.widgets.borrow().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.widgets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.borrow().is_empty()
    }

    /// Resolve a widget on behalf of an outer integration.
    ///
    /// Same transition as a terminal poll. Returns `false` for unknown or
    /// already resolved instances.
    pub fn notify_external_completion(&self, id: InstanceId) -> bool {
        let Some(widget) = self.get(id) else {
            tracing::debug!(instance = id, "Completion notice for unknown widget");
            return false;
        };
        let resolved = widget.resolve();
        if resolved {
            tracing::info!(instance = id, "Widget resolved by external completion");
        }
        resolved
    }

    /// Drop resolved widgets; returns how many were removed
    pub fn prune_resolved(&self) -> usize {
        let mut widgets = self.widgets.borrow_mut();
        let before = widgets.len();
        widgets.retain(|_, widget| !widget.is_resolved());
        before - widgets.len()
    }
}
