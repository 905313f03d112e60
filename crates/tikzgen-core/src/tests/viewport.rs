use crate::viewport::*;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn cropping() -> ViewportState {
    ViewportState::default().enter_crop_mode()
}

#[derive(Default)]
struct CountingHost {
    next: Cell<u64>,
    live: RefCell<HashSet<u64>>,
    attaches: Cell<usize>,
    detaches: Cell<usize>,
}

impl ListenerHost for CountingHost {
    fn attach_global_drag(&self) -> ListenerId {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.live.borrow_mut().insert(id);
        self.attaches.set(self.attaches.get() + 1);
        ListenerId(id)
    }

    fn detach_global_drag(&self, id: ListenerId) {
        assert!(self.live.borrow_mut().remove(&id.0), "double detach of {id:?}");
        self.detaches.set(self.detaches.get() + 1);
    }
}

#[test]
fn defaults_match_a_fresh_surface() {
    let s = ViewportState::default();
    assert_eq!(s.pan, Point::ORIGIN);
    assert_eq!(s.zoom, 1.0);
    assert_eq!(s.crop, Rect::new(100.0, 100.0, 400.0, 300.0));
    assert!(!s.crop_mode);
    assert_eq!(s.interaction, Interaction::Idle);
}

#[test]
fn pan_drag_follows_the_pointer_from_the_current_offset() {
    let mut s = ViewportState::default();
    s.pan = p(10.0, 20.0);
    s = s.apply(PointerEvent::SurfaceDown(p(100.0, 100.0)), true);
    assert_eq!(
        s.interaction,
        Interaction::Panning {
            anchor: p(90.0, 80.0)
        }
    );
    s = s.apply(PointerEvent::Move(p(130.0, 90.0)), true);
    assert_eq!(s.pan, p(40.0, 10.0));
    s = s.apply(PointerEvent::SurfaceLeave, true);
    assert_eq!(s.interaction, Interaction::Idle);
    s = s.apply(PointerEvent::Move(p(500.0, 500.0)), true);
    assert_eq!(s.pan, p(40.0, 10.0));
}

#[test]
fn panning_needs_an_image_and_crop_mode_off() {
    let down = PointerEvent::SurfaceDown(p(1.0, 1.0));
    assert_eq!(
        ViewportState::default().apply(down, false).interaction,
        Interaction::Idle
    );
    assert_eq!(cropping().apply(down, true).interaction, Interaction::Idle);
}

#[test]
fn wheel_steps_zoom_and_never_drops_below_minimum() {
    let mut s = ViewportState::default();
    s = s.apply(PointerEvent::Wheel { delta_y: -100.0 }, true);
    assert!((s.zoom - 1.1).abs() < 1e-9);
    for _ in 0..100 {
        s = s.apply(PointerEvent::Wheel { delta_y: 100.0 }, true);
        assert!(s.zoom >= MIN_ZOOM);
    }
    assert_eq!(s.zoom, MIN_ZOOM);

    for _ in 0..50 {
        s = s.apply(PointerEvent::Wheel { delta_y: -1.0 }, true);
    }
    assert!(s.zoom > 5.0, "no upper clamp, got {}", s.zoom);
}

#[test]
fn wheel_works_while_panning_but_not_in_crop_mode_or_without_image() {
    let s = ViewportState::default()
        .apply(PointerEvent::SurfaceDown(p(0.0, 0.0)), true)
        .apply(PointerEvent::Wheel { delta_y: -1.0 }, true);
    assert!(s.zoom > 1.0);
    assert!(matches!(s.interaction, Interaction::Panning { .. }));

    let zoom_out = PointerEvent::Wheel { delta_y: 1.0 };
    assert_eq!(cropping().apply(zoom_out, true).zoom, 1.0);
    assert_eq!(ViewportState::default().apply(zoom_out, false).zoom, 1.0);
}

#[test]
fn crop_move_translates_by_pointer_delta_at_any_zoom() {
    for zoom in [0.1, 1.0, 3.7] {
        let mut s = cropping();
        s.zoom = zoom;
        s.pan = p(-33.0, 12.0);
        let before = s.crop;
        s = s.apply(PointerEvent::CropBodyDown(p(150.0, 140.0)), true);
        s = s.apply(PointerEvent::Move(p(175.0, 100.0)), true);
        assert_eq!(s.crop.left, before.left + 25.0);
        assert_eq!(s.crop.top, before.top - 40.0);
        assert_eq!(s.crop.size(), before.size());
    }
}

#[test]
fn crop_can_move_off_screen() {
    let s = cropping()
        .apply(PointerEvent::CropBodyDown(p(100.0, 100.0)), false)
        .apply(PointerEvent::Move(p(-900.0, -900.0)), false);
    assert_eq!(s.crop.top_left(), p(-900.0, -900.0));
}

#[test]
fn crop_resize_is_floored_at_minimum_size() {
    let s = cropping().apply(PointerEvent::ResizeHandleDown(p(500.0, 400.0)), true);
    let grown = s.apply(PointerEvent::Move(p(560.0, 410.0)), true);
    assert_eq!(grown.crop.size(), Size::new(460.0, 310.0));
    assert_eq!(grown.crop.top_left(), p(100.0, 100.0));

    for delta in [-350.0, -400.0, -10_000.0] {
        let shrunk = s.apply(PointerEvent::Move(p(500.0 + delta, 400.0 + delta)), true);
        assert_eq!(shrunk.crop.width, MIN_CROP_SIZE.max(400.0 + delta));
        assert_eq!(shrunk.crop.height, MIN_CROP_SIZE.max(300.0 + delta));
        assert!(shrunk.crop.width >= MIN_CROP_SIZE);
        assert!(shrunk.crop.height >= MIN_CROP_SIZE);
    }
}

#[test]
fn crop_drag_ignores_surface_leave_but_ends_on_up_or_window_leave() {
    let moving = cropping().apply(PointerEvent::CropBodyDown(p(120.0, 120.0)), true);
    assert_eq!(
        moving.apply(PointerEvent::SurfaceLeave, true).interaction,
        moving.interaction
    );
    assert_eq!(moving.apply(PointerEvent::Up, true).interaction, Interaction::Idle);
    assert_eq!(
        moving.apply(PointerEvent::WindowLeave, true).interaction,
        Interaction::Idle
    );
}

#[test]
fn crop_gestures_need_crop_mode() {
    let s = ViewportState::default()
        .apply(PointerEvent::CropBodyDown(p(120.0, 120.0)), true)
        .apply(PointerEvent::ResizeHandleDown(p(500.0, 400.0)), true);
    assert_eq!(s.interaction, Interaction::Idle);
}

#[test]
fn reset_restores_view_but_keeps_crop_geometry() {
    let mut s = cropping();
    s.crop = Rect::new(5.0, 6.0, 70.0, 80.0);
    s.pan = p(3.0, 4.0);
    s.zoom = 2.5;
    let r = s.apply(PointerEvent::CropBodyDown(p(10.0, 10.0)), true).reset();
    assert_eq!(r.pan, Point::ORIGIN);
    assert_eq!(r.zoom, 1.0);
    assert!(!r.crop_mode);
    assert_eq!(r.interaction, Interaction::Idle);
    assert_eq!(r.crop, Rect::new(5.0, 6.0, 70.0, 80.0));
}

#[test]
fn content_rect_centers_scales_and_pans() {
    let mut s = ViewportState::default();
    let container = Size::new(800.0, 600.0);
    let natural = Size::new(200.0, 100.0);
    assert_eq!(
        s.content_rect(container, natural),
        Rect::new(300.0, 250.0, 200.0, 100.0)
    );

    s.zoom = 2.0;
    s.pan = p(10.0, -20.0);
    assert_eq!(
        s.content_rect(container, natural),
        Rect::new(210.0, 180.0, 400.0, 200.0)
    );
}

#[test]
fn controller_holds_listeners_only_during_crop_drags() {
    let host = Rc::new(CountingHost::default());
    let mut c = ViewportController::new(host.clone());

    c.handle(PointerEvent::SurfaceDown(p(0.0, 0.0)), true);
    assert!(!c.is_listening(), "panning stays on the surface");
    c.handle(PointerEvent::Up, true);

    c.enter_crop_mode();
    c.handle(PointerEvent::CropBodyDown(p(150.0, 150.0)), true);
    assert!(c.is_listening());
    c.handle(PointerEvent::Move(p(160.0, 150.0)), true);
    c.handle(PointerEvent::SurfaceLeave, true);
    assert!(c.is_listening());
    assert_eq!(host.attaches.get(), 1);

    c.handle(PointerEvent::Up, true);
    assert!(!c.is_listening());
    assert_eq!(host.detaches.get(), 1);
    assert!(host.live.borrow().is_empty());
}

#[test]
fn every_exit_path_releases_listeners_exactly_once() {
    let host = Rc::new(CountingHost::default());
    let mut c = ViewportController::new(host.clone());
    c.enter_crop_mode();

    c.handle(PointerEvent::ResizeHandleDown(p(500.0, 400.0)), true);
    c.handle(PointerEvent::WindowLeave, true);
    assert_eq!(host.detaches.get(), 1);

    c.handle(PointerEvent::CropBodyDown(p(150.0, 150.0)), true);
    c.exit_crop_mode();
    assert_eq!(host.detaches.get(), 2);

    c.enter_crop_mode();
    c.handle(PointerEvent::CropBodyDown(p(150.0, 150.0)), true);
    c.reset();
    assert_eq!(host.detaches.get(), 3);

    c.enter_crop_mode();
    c.handle(PointerEvent::CropBodyDown(p(150.0, 150.0)), true);
    assert_eq!(host.live.borrow().len(), 1);
    drop(c);
    assert_eq!(host.attaches.get(), 4);
    assert_eq!(host.detaches.get(), 4);
    assert!(host.live.borrow().is_empty());
}

#[test]
fn wheel_without_vertical_delta_zooms_out() {
    let s = ViewportState::default().apply(PointerEvent::Wheel { delta_y: 0.0 }, true);
    assert!((s.zoom - 0.9).abs() < 1e-9, "got {}", s.zoom);
    let floor = ViewportState {
        zoom: MIN_ZOOM,
        ..ViewportState::default()
    };
    assert_eq!(floor.apply(PointerEvent::Wheel { delta_y: 0.0 }, true).zoom, MIN_ZOOM);
}

#[test]
fn reset_view_keeps_crop_mode_and_rectangle() {
    let mut s = cropping();
    s.crop = Rect::new(5.0, 6.0, 70.0, 80.0);
    s.pan = p(30.0, -4.0);
    s.zoom = 1.7;
    let moving = s.apply(PointerEvent::CropBodyDown(p(10.0, 10.0)), true);

    let r = moving.reset_view();
    assert_eq!(r.pan, Point::ORIGIN);
    assert_eq!(r.zoom, 1.0);
    assert!(r.crop_mode);
    assert_eq!(r.crop, Rect::new(5.0, 6.0, 70.0, 80.0));
    assert_eq!(r.interaction, moving.interaction);

    let panning = ViewportState::default().apply(PointerEvent::SurfaceDown(p(0.0, 0.0)), true);
    assert_eq!(panning.reset_view().interaction, Interaction::Idle);
}

#[test]
fn controller_reset_view_keeps_an_active_crop_drag() {
    let host = Rc::new(CountingHost::default());
    let mut c = ViewportController::new(host.clone());
    c.enter_crop_mode();
    c.handle(PointerEvent::CropBodyDown(p(150.0, 150.0)), true);
    c.reset_view();
    assert!(c.is_listening());
    assert!(c.state().crop_mode);
    c.handle(PointerEvent::Up, true);
    assert_eq!(host.detaches.get(), 1);
}

#[test]
fn normalized_clamps_state_from_outside_the_gesture_path() {
    let s: ViewportState = serde_json::from_str(
        r#"{"zoom":0.0,"crop":{"left":1.0,"top":2.0,"width":10.0,"height":-5.0}}"#,
    )
    .unwrap();
    assert_eq!(s.zoom, 0.0);

    let n = s.normalized();
    assert_eq!(n.zoom, MIN_ZOOM);
    assert_eq!(n.crop, Rect::new(1.0, 2.0, MIN_CROP_SIZE, MIN_CROP_SIZE));

    let fine = ViewportState {
        zoom: 2.5,
        crop: Rect::new(0.0, 0.0, 60.0, 70.0),
        ..ViewportState::default()
    };
    assert_eq!(fine.normalized(), fine);

    let nan = ViewportState {
        zoom: f64::NAN,
        ..ViewportState::default()
    };
    assert_eq!(nan.normalized().zoom, 1.0);
}
