//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Pointer and touch coordinates mapped into the play field
//! - Frame scheduling (requestAnimationFrame handle with explicit stop)
//! - Event listeners detached when their handle is dropped

use crate::{clamp_player_x, client_to_percent};

/// Play field bounding rectangle in client (CSS pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayfieldRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PlayfieldRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Collector x (percent, clamped) for a client-space x
    pub fn pointer_x(&self, client_x: f32) -> f32 {
        clamp_player_x(client_to_percent(client_x, self.left, self.width))
    }

    /// Bounding rect of a DOM element
    #[cfg(target_arch = "wasm32")]
    pub fn of_element(element: &web_sys::Element) -> Self {
        let rect = element.get_bounding_client_rect();
        Self::new(
            rect.left() as f32,
            rect.top() as f32,
            rect.width() as f32,
            rect.height() as f32,
        )
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{FrameLoop, ListenerHandle};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{AddEventListenerOptions, Event, EventTarget};

    type FrameClosure = Closure<dyn FnMut(f64)>;

    /// Owned requestAnimationFrame loop.
    ///
    /// The frame callback returns whether another frame should be scheduled.
    /// `stop` cancels the pending frame synchronously; dropping the loop stops
    /// it and releases the callback. Must not be dropped from inside its own
    /// frame callback.
    pub struct FrameLoop {
        pending: Rc<Cell<Option<i32>>>,
        callback: Rc<RefCell<Option<FrameClosure>>>,
    }

    impl FrameLoop {
        pub fn new(mut on_frame: impl FnMut(f64) -> bool + 'static) -> Self {
            let pending = Rc::new(Cell::new(None));
            let callback: Rc<RefCell<Option<FrameClosure>>> = Rc::new(RefCell::new(None));

            let again = callback.clone();
            let handle = pending.clone();
            *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
                handle.set(None);
                if on_frame(time) && handle.get().is_none() {
                    if let Some(closure) = again.borrow().as_ref() {
                        handle.set(request_frame(closure));
                    }
                }
            }));

            Self { pending, callback }
        }

        /// Schedule the next frame if none is pending
        pub fn start(&self) {
            if self.pending.get().is_some() {
                return;
            }
            if let Some(closure) = self.callback.borrow().as_ref() {
                self.pending.set(request_frame(closure));
            }
        }

        /// Cancel the pending frame, if any
        pub fn stop(&self) {
            if let Some(id) = self.pending.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
            }
        }

        pub fn is_running(&self) -> bool {
            self.pending.get().is_some()
        }
    }

    impl Drop for FrameLoop {
        fn drop(&mut self) {
            self.stop();
            // Break the closure's reference back to its own slot
            self.callback.borrow_mut().take();
        }
    }

    fn request_frame(closure: &FrameClosure) -> Option<i32> {
        web_sys::window()?
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok()
    }

    /// An attached DOM event listener, removed when dropped
    pub struct ListenerHandle {
        target: EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    }

    impl ListenerHandle {
        pub fn attach(
            target: &EventTarget,
            event: &'static str,
            handler: impl FnMut(Event) + 'static,
        ) -> Result<Self, JsValue> {
            let closure = Closure::<dyn FnMut(Event)>::new(handler);
            target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
            Ok(Self {
                target: target.clone(),
                event,
                closure,
            })
        }

        /// Attach a non-passive listener, so the handler may call
        /// `prevent_default` (touch scrolling)
        pub fn attach_active(
            target: &EventTarget,
            event: &'static str,
            handler: impl FnMut(Event) + 'static,
        ) -> Result<Self, JsValue> {
            let closure = Closure::<dyn FnMut(Event)>::new(handler);
            let options = AddEventListenerOptions::new();
            options.set_passive(false);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                event,
                closure.as_ref().unchecked_ref(),
                &options,
            )?;
            Ok(Self {
                target: target.clone(),
                event,
                closure,
            })
        }
    }

    impl Drop for ListenerHandle {
        fn drop(&mut self) {
            let _ = self
                .target
                .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_pointer_x_maps_through_rect() {
        let rect = PlayfieldRect::new(100.0, 20.0, 400.0, 300.0);
        assert!((rect.pointer_x(300.0) - 50.0).abs() < 1e-4);
        assert!((rect.pointer_x(180.0) - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_x_is_clamped() {
        let rect = PlayfieldRect::new(100.0, 20.0, 400.0, 300.0);
        assert_eq!(rect.pointer_x(0.0), PLAYER_MIN_X);
        assert_eq!(rect.pointer_x(100.0), PLAYER_MIN_X);
        assert_eq!(rect.pointer_x(900.0), PLAYER_MAX_X);
    }

    #[test]
    fn test_zero_sized_rect_centers() {
        let rect = PlayfieldRect::default();
        assert_eq!(rect.pointer_x(42.0), PLAYER_START_X);
    }
}
