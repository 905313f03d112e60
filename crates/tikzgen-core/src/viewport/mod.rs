//! Pan/zoom/crop state for a displayed vector image.
//!
//! [`ViewportState`] is a plain value updated by [`ViewportState::apply`]; it needs no rendering
//! surface. [`ViewportController`] wraps it and owns the document-level drag listeners that crop
//! gestures require.

mod controller;
mod geometry;

pub use controller::{GlobalDragGuard, ListenerHost, ListenerId, NoopListenerHost, ViewportController};
pub use geometry::{Point, Rect, Size};

use serde::{Deserialize, Serialize};

pub const ZOOM_STEP: f64 = 0.1;
pub const MIN_ZOOM: f64 = 0.1;
pub const MIN_CROP_SIZE: f64 = 50.0;
pub const DEFAULT_CROP: Rect = Rect::new(100.0, 100.0, 400.0, 300.0);

/// Current pointer interaction. At most one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Interaction {
    #[default]
    Idle,
    /// `anchor` is the pointer position minus the pan offset at pointer-down.
    Panning { anchor: Point },
    /// `offset` is the pointer position minus the crop top-left at pointer-down.
    MovingCrop { offset: Point },
    ResizingCrop { origin: Point, initial: Size },
}

impl Interaction {
    /// Crop drags are tracked at document level so they survive leaving the crop rectangle.
    pub fn is_global_drag(&self) -> bool {
        matches!(
            self,
            Interaction::MovingCrop { .. } | Interaction::ResizingCrop { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on the image surface outside the crop rectangle.
    SurfaceDown(Point),
    /// Pointer pressed on the crop rectangle body.
    CropBodyDown(Point),
    /// Pointer pressed on the crop rectangle's resize handle.
    ResizeHandleDown(Point),
    Move(Point),
    /// Pointer released anywhere in the document.
    Up,
    /// Pointer left the image surface.
    SurfaceLeave,
    /// Pointer left the window; ends every drag.
    WindowLeave,
    /// Negative `delta_y` zooms in; zero or positive zooms out.
    Wheel { delta_y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportState {
    pub pan: Point,
    pub zoom: f64,
    pub crop: Rect,
    pub crop_mode: bool,
    pub interaction: Interaction,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            pan: Point::ORIGIN,
            zoom: 1.0,
            crop: DEFAULT_CROP,
            crop_mode: false,
            interaction: Interaction::Idle,
        }
    }
}

impl ViewportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one pointer event. `has_image` tells whether an image is currently displayed;
    /// panning and zooming are inert without one.
    pub fn apply(mut self, event: PointerEvent, has_image: bool) -> Self {
        let view_gestures = has_image && !self.crop_mode;

        match (self.interaction, event) {
            (_, PointerEvent::Wheel { delta_y }) => {
                if view_gestures {
                    self.zoom = step_zoom(self.zoom, delta_y);
                }
            }
            (Interaction::Idle, PointerEvent::SurfaceDown(p)) if view_gestures => {
                self.interaction = Interaction::Panning {
                    anchor: p - self.pan,
                };
            }
            (Interaction::Idle, PointerEvent::CropBodyDown(p)) if self.crop_mode => {
                self.interaction = Interaction::MovingCrop {
                    offset: p - self.crop.top_left(),
                };
            }
            (Interaction::Idle, PointerEvent::ResizeHandleDown(p)) if self.crop_mode => {
                self.interaction = Interaction::ResizingCrop {
                    origin: p,
                    initial: self.crop.size(),
                };
            }
            (Interaction::Panning { anchor }, PointerEvent::Move(p)) => {
                self.pan = p - anchor;
            }
            (Interaction::MovingCrop { offset }, PointerEvent::Move(p)) => {
                self.crop = self.crop.with_top_left(p - offset);
            }
            (Interaction::ResizingCrop { origin, initial }, PointerEvent::Move(p)) => {
                let delta = p - origin;
                self.crop.width = (initial.width + delta.x).max(MIN_CROP_SIZE);
                self.crop.height = (initial.height + delta.y).max(MIN_CROP_SIZE);
            }
            (
                Interaction::Panning { .. },
                PointerEvent::Up | PointerEvent::SurfaceLeave | PointerEvent::WindowLeave,
            )
            | (
                Interaction::MovingCrop { .. } | Interaction::ResizingCrop { .. },
                PointerEvent::Up | PointerEvent::WindowLeave,
            ) => {
                self.interaction = Interaction::Idle;
            }
            _ => {}
        }
        self
    }

    pub fn enter_crop_mode(mut self) -> Self {
        self.crop_mode = true;
        self.interaction = Interaction::Idle;
        self
    }

    pub fn exit_crop_mode(mut self) -> Self {
        self.crop_mode = false;
        self.interaction = Interaction::Idle;
        self
    }

    /// State for a freshly started image: centered, unzoomed, crop mode off.
    ///
    /// The crop rectangle keeps its geometry so a user re-cropping successive renders does not
    /// have to redraw it.
    pub fn reset(self) -> Self {
        Self {
            crop: self.crop,
            ..Self::default()
        }
    }

    /// Back to centered and unzoomed; crop mode and the crop rectangle are untouched.
    pub fn reset_view(mut self) -> Self {
        self.pan = Point::ORIGIN;
        self.zoom = 1.0;
        if matches!(self.interaction, Interaction::Panning { .. }) {
            self.interaction = Interaction::Idle;
        }
        self
    }

    /// Clamps state built outside the gesture path (deserialized, hand-edited) to the limits
    /// gestures maintain: `zoom >= MIN_ZOOM`, crop sides `>= MIN_CROP_SIZE`.
    pub fn normalized(mut self) -> Self {
        self.zoom = if self.zoom.is_finite() {
            self.zoom.max(MIN_ZOOM)
        } else {
            1.0
        };
        self.crop.width = self.crop.width.max(MIN_CROP_SIZE);
        self.crop.height = self.crop.height.max(MIN_CROP_SIZE);
        self
    }

    /// Screen-space bounding box of the image content.
    ///
    /// Content of `natural` size is centered in `container`, scaled by `zoom` about its center,
    /// then translated by `pan`.
    pub fn content_rect(&self, container: Size, natural: Size) -> Rect {
        let width = natural.width * self.zoom;
        let height = natural.height * self.zoom;
        let cx = container.width / 2.0 + self.pan.x;
        let cy = container.height / 2.0 + self.pan.y;
        Rect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }
}

/// Only scrolling up zooms in; a zero `delta_y` (horizontal scroll) zooms out.
fn step_zoom(zoom: f64, delta_y: f64) -> f64 {
    if delta_y < 0.0 {
        zoom + ZOOM_STEP
    } else {
        (zoom - ZOOM_STEP).max(MIN_ZOOM)
    }
}
