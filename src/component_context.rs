//! What a panel may know about the window it is drawn in.

/// Passed to every [`Component`](crate::components::Component) call. Panels
/// never see the window controller; this is the whole of their view of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentContext {
    focused: bool,
    capturing: bool,
}

impl ComponentContext {
    /// Context for a panel whose window is (or is not) the active one.
    pub const fn new(focused: bool) -> Self {
        Self {
            focused,
            capturing: false,
        }
    }

    /// The owning window is on top and receives keys.
    pub const fn focused(&self) -> bool {
        self.focused
    }

    /// A window drag or resize owns the pointer. Panels ignore mouse input
    /// while this is set.
    pub const fn capturing(&self) -> bool {
        self.capturing
    }

    pub const fn with_capturing(self, capturing: bool) -> Self {
        Self { capturing, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unfocused_and_free() {
        let ctx = ComponentContext::default();
        assert!(!ctx.focused());
        assert!(!ctx.capturing());
        let ctx = ComponentContext::new(true).with_capturing(true);
        assert!(ctx.focused() && ctx.capturing());
    }
}
