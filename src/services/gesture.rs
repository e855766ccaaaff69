//! Transient interaction state layered over the persistent stores: dragging,
//! resizing, connection drawing, camera panning, and pinch zooming. The
//! machine owns no card data; it mutates the store only through its defined
//! operations, and every terminal pointer event returns it to `Idle` so no
//! gesture can outlive the pointer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::camera::{Camera, MAX_ZOOM, MIN_ZOOM, ScreenPoint, Viewport};
use crate::domain::card::{CardKind, CardPatch, MIN_CARD_SIZE, Position};
use crate::domain::ui_state::UiState;
use crate::services::spatial::CardIndex;
use crate::store::CardStore;

pub const PINCH_SENSITIVITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    fn affects_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    fn affects_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    fn affects_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    fn affects_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    /// Side handles drive width and derive height under an aspect lock;
    /// every other handle derives width from height.
    fn derives_height_from_width(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureState {
    Idle,
    PanningCamera {
        last: ScreenPoint,
    },
    DraggingCard {
        id: Uuid,
        last: ScreenPoint,
        touch_origin: Option<ScreenPoint>,
    },
    ResizingCard {
        id: Uuid,
        handle: ResizeHandle,
        start_origin: Position,
        start_width: f64,
        start_height: f64,
        start_pointer: ScreenPoint,
        aspect_ratio: Option<f64>,
    },
    DrawingConnection {
        source_id: Uuid,
        cursor: Position,
    },
    PinchZooming {
        initial_distance: f64,
        initial_zoom: f64,
    },
}

/// Outcomes a gesture hands back to the host beyond store/camera mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// Connection drag released over empty canvas: offer "add card"/"add
    /// note" as the new endpoint, anchored at the drop point.
    OpenConnectMenu { at: Position, source_id: Uuid },
}

#[derive(Debug, Default)]
pub struct GestureMachine {
    state: GestureState,
}

impl Default for GestureState {
    fn default() -> Self {
        Self::Idle
    }
}

impl GestureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// Pointer down on a card body. Dragging is disabled entirely while
    /// focus mode is active.
    pub fn pointer_down_on_card(&mut self, id: Uuid, at: ScreenPoint, is_touch: bool, ui: &UiState) {
        if ui.focus_mode_active {
            return;
        }
        self.state = GestureState::DraggingCard {
            id,
            last: at,
            touch_origin: is_touch.then_some(at),
        };
    }

    /// Pointer down on empty canvas starts a pan, unless focus mode holds
    /// the camera locked.
    pub fn pointer_down_on_canvas(&mut self, at: ScreenPoint, ui: &UiState) {
        if ui.focus_mode_active && ui.camera_locked {
            return;
        }
        self.state = GestureState::PanningCamera { last: at };
    }

    pub fn resize_start(
        &mut self,
        id: Uuid,
        handle: ResizeHandle,
        at: ScreenPoint,
        store: &CardStore,
    ) {
        let Some(card) = store.get(id) else { return };
        let (width, height) = card.bounds();
        self.state = GestureState::ResizingCard {
            id,
            handle,
            start_origin: card.position,
            start_width: width,
            start_height: height,
            start_pointer: at,
            aspect_ratio: card.aspect_ratio,
        };
    }

    pub fn connect_start(
        &mut self,
        source_id: Uuid,
        at: ScreenPoint,
        camera: &Camera,
        viewport: &Viewport,
        ui: &UiState,
    ) {
        if ui.focus_mode_active {
            return;
        }
        self.state = GestureState::DrawingConnection {
            source_id,
            cursor: camera.screen_to_world(at, viewport),
        };
    }

    pub fn pinch_start(&mut self, initial_distance: f64, camera: &Camera) {
        if initial_distance <= 0.0 {
            return;
        }
        self.state = GestureState::PinchZooming {
            initial_distance,
            initial_zoom: camera.zoom,
        };
    }

    pub fn pointer_move(
        &mut self,
        at: ScreenPoint,
        camera: &mut Camera,
        viewport: &Viewport,
        store: &mut CardStore,
    ) {
        match &mut self.state {
            GestureState::DraggingCard { id, last, .. } => {
                // World-space delta: screen delta divided by zoom keeps the
                // card 1:1 under the pointer at any zoom level.
                let dx = (at.x - last.x) / camera.zoom;
                let dy = (at.y - last.y) / camera.zoom;
                let id = *id;
                *last = at;
                store.move_card_by(id, dx, dy);
            }
            GestureState::PanningCamera { last } => {
                let dx = at.x - last.x;
                let dy = at.y - last.y;
                *last = at;
                *camera = camera.panned_by(dx, dy);
            }
            GestureState::ResizingCard {
                id,
                handle,
                start_origin,
                start_width,
                start_height,
                start_pointer,
                aspect_ratio,
            } => {
                let dx = (at.x - start_pointer.x) / camera.zoom;
                let dy = (at.y - start_pointer.y) / camera.zoom;
                let (id, handle) = (*id, *handle);
                let (ox, oy) = (start_origin.x, start_origin.y);
                let (sw, sh) = (*start_width, *start_height);
                let aspect = *aspect_ratio;

                let mut width = sw;
                let mut height = sh;
                if handle.affects_right() {
                    width = sw + dx;
                }
                if handle.affects_left() {
                    width = sw - dx;
                }
                if handle.affects_bottom() {
                    height = sh + dy;
                }
                if handle.affects_top() {
                    height = sh - dy;
                }

                if let Some(ratio) = aspect {
                    if handle.derives_height_from_width() {
                        height = width / ratio;
                    } else {
                        width = height * ratio;
                    }
                }

                width = width.max(MIN_CARD_SIZE);
                height = height.max(MIN_CARD_SIZE);

                // Left/top handles keep the opposite edge fixed.
                let x = if handle.affects_left() { ox + (sw - width) } else { ox };
                let y = if handle.affects_top() { oy + (sh - height) } else { oy };

                store.set_card_geometry(id, x, y, width, height);
            }
            GestureState::DrawingConnection { cursor, .. } => {
                *cursor = camera.screen_to_world(at, viewport);
            }
            _ => {}
        }
    }

    pub fn pinch_move(&mut self, distance: f64, camera: &mut Camera) {
        if let GestureState::PinchZooming {
            initial_distance,
            initial_zoom,
        } = self.state
        {
            let factor = 1.0 + (distance / initial_distance - 1.0) * PINCH_SENSITIVITY;
            camera.zoom = (initial_zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Pointer up / touch end: resolves the gesture's terminal effect and
    /// unconditionally returns to `Idle`.
    pub fn pointer_up(
        &mut self,
        at: ScreenPoint,
        camera: &Camera,
        viewport: &Viewport,
        store: &mut CardStore,
    ) -> Vec<GestureEvent> {
        let state = std::mem::take(&mut self.state);
        let mut events = Vec::new();
        match state {
            GestureState::DraggingCard { id, .. } => {
                resolve_drop(id, camera.screen_to_world(at, viewport), store);
            }
            GestureState::DrawingConnection { source_id, .. } => {
                let world = camera.screen_to_world(at, viewport);
                let index = CardIndex::rendered(store);
                match index.hit_test(world, None) {
                    Some(target) if target != source_id => {
                        store.create_connection(source_id, target, None);
                    }
                    Some(_) => {}
                    None => events.push(GestureEvent::OpenConnectMenu {
                        at: world,
                        source_id,
                    }),
                }
            }
            _ => {}
        }
        events
    }

    /// Pointer left the canvas (or the gesture was aborted): drop all
    /// transient state without side effects.
    pub fn pointer_leave(&mut self) {
        self.state = GestureState::Idle;
    }
}

/// Drop resolution: a note released over another card is absorbed into it;
/// a single-attachment media card merges its attachment into the target and
/// disappears; an internal note released over empty canvas is freed back to
/// the top level.
fn resolve_drop(id: Uuid, release: Position, store: &mut CardStore) {
    let Some(dragged) = store.get(id) else { return };
    let kind = dragged.kind;
    let was_internal = dragged.is_internal;
    let single_attachment = if dragged.attachments.len() == 1 {
        Some(dragged.attachments[0].clone())
    } else {
        None
    };

    let index = CardIndex::rendered(store);
    match index.hit_test(release, Some(id)) {
        Some(target) => match kind {
            CardKind::Note => {
                store.update_card(
                    id,
                    CardPatch {
                        parent_id: Some(Some(target)),
                        is_internal: Some(true),
                        ..Default::default()
                    },
                );
            }
            CardKind::Media => {
                if let Some(attachment) = single_attachment {
                    store.add_attachment(target, attachment);
                    store.delete_card(id);
                }
            }
            CardKind::Task => {}
        },
        None if was_internal => {
            store.update_card(
                id,
                CardPatch {
                    parent_id: Some(None),
                    is_internal: Some(false),
                    ..Default::default()
                },
            );
        }
        None => {}
    }
}
