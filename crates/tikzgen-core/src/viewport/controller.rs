use super::{PointerEvent, ViewportState};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The surface that can install document-level pointer listeners (move + up).
pub trait ListenerHost {
    fn attach_global_drag(&self) -> ListenerId;
    fn detach_global_drag(&self, id: ListenerId);
}

/// Host for headless use, where there is nothing to attach.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListenerHost;

impl ListenerHost for NoopListenerHost {
    fn attach_global_drag(&self) -> ListenerId {
        ListenerId(0)
    }

    fn detach_global_drag(&self, _id: ListenerId) {}
}

/// Document-level drag listeners, detached when dropped.
pub struct GlobalDragGuard {
    host: Rc<dyn ListenerHost>,
    id: ListenerId,
}

impl GlobalDragGuard {
    pub fn acquire(host: Rc<dyn ListenerHost>) -> Self {
        let id = host.attach_global_drag();
        tracing::trace!(listener = id.0, "global drag listeners attached");
        Self { host, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for GlobalDragGuard {
    fn drop(&mut self) {
        self.host.detach_global_drag(self.id);
        tracing::trace!(listener = self.id.0, "global drag listeners detached");
    }
}

/// [`ViewportState`] plus the listener scope of the current crop drag.
///
/// Listeners are held exactly while the state is in a crop drag. Every way out of the drag
/// (pointer-up, leaving the window, leaving crop mode, a reset, dropping the controller) releases
/// them.
pub struct ViewportController {
    state: ViewportState,
    host: Rc<dyn ListenerHost>,
    drag: Option<GlobalDragGuard>,
}

impl ViewportController {
    pub fn new(host: Rc<dyn ListenerHost>) -> Self {
        Self::with_state(host, ViewportState::default())
    }

    pub fn headless() -> Self {
        Self::new(Rc::new(NoopListenerHost))
    }

    pub fn with_state(host: Rc<dyn ListenerHost>, state: ViewportState) -> Self {
        let mut this = Self {
            state,
            host,
            drag: None,
        };
        this.sync_listeners();
        this
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle(&mut self, event: PointerEvent, has_image: bool) -> &ViewportState {
        self.state = self.state.apply(event, has_image);
        self.sync_listeners();
        &self.state
    }

    pub fn enter_crop_mode(&mut self) {
        self.state = self.state.enter_crop_mode();
        self.sync_listeners();
    }

    pub fn exit_crop_mode(&mut self) {
        self.state = self.state.exit_crop_mode();
        self.sync_listeners();
    }

    pub fn reset(&mut self) {
        self.state = self.state.reset();
        self.sync_listeners();
    }

    /// The "reset view" button: pan and zoom only.
    pub fn reset_view(&mut self) {
        self.state = self.state.reset_view();
        self.sync_listeners();
    }

    fn sync_listeners(&mut self) {
        let wants = self.state.interaction.is_global_drag();
        match (wants, self.drag.is_some()) {
            (true, false) => self.drag = Some(GlobalDragGuard::acquire(Rc::clone(&self.host))),
            (false, true) => self.drag = None,
            _ => {}
        }
    }
}
