//! The OS window and its event pump.
//!
//! The engine owns the frame loop, so instead of handing control to winit with
//! `run_app` the window pumps pending events once per frame and translates them into
//! [`InputEvent`]s.

use std::{sync::Arc, time::Duration};

use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{CursorGrabMode, Fullscreen, WindowAttributes, WindowId},
};

use crate::{
    config::WindowParams,
    error::InitError,
    input::{InputEvent, MouseMotion},
};

/// Pumps allowed for the platform to deliver `resumed` and create the window.
const CREATE_ATTEMPTS: usize = 16;
/// Scroll distance in pixels that counts as one wheel notch.
const PIXELS_PER_LINE: f64 = 20.0;

pub trait Window {
    fn is_pending_close(&self) -> bool;

    fn close(&mut self);

    /// Appends every event received since the last poll to `events`.
    fn poll_events(&mut self, events: &mut Vec<InputEvent>);

    /// Shows the cursor, or hides and captures it.
    fn show_cursor(&mut self, show: bool);

    fn is_cursor_hidden(&self) -> bool;

    fn aspect_ratio(&self) -> f32;
}

pub struct WinitWindow {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
    window: Arc<winit::window::Window>,
}

impl WinitWindow {
    pub fn new(params: &WindowParams) -> Result<Self, InitError> {
        let mut event_loop = EventLoop::new().map_err(|e| InitError::Window(e.to_string()))?;

        let mut attributes = winit::window::Window::default_attributes()
            .with_title(params.title.clone())
            .with_inner_size(PhysicalSize::new(params.width, params.height))
            .with_position(PhysicalPosition::new(params.x, params.y));
        if params.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let mut handler = WindowHandler::new(attributes);

        for _ in 0..CREATE_ATTEMPTS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut handler)
            {
                return Err(InitError::Window(format!(
                    "event loop exited with {code} before the window opened"
                )));
            }
            if handler.window.is_some() || handler.error.is_some() {
                break;
            }
        }
        if let Some(e) = handler.error.take() {
            return Err(InitError::Window(e));
        }
        let window = handler
            .window
            .clone()
            .ok_or_else(|| InitError::Window("the platform never resumed the app".into()))?;
        log::info!(
            "Opened window {:?} at {}x{}",
            params.title,
            params.width,
            params.height
        );

        Ok(Self {
            event_loop,
            handler,
            window,
        })
    }

    /// The winit window, shared with the GPU surface.
    pub fn handle(&self) -> Arc<winit::window::Window> {
        self.window.clone()
    }
}

impl Window for WinitWindow {
    fn is_pending_close(&self) -> bool {
        self.handler.pending_close
    }

    fn close(&mut self) {
        self.handler.pending_close = true;
    }

    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        if let PumpStatus::Exit(_) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            self.handler.pending_close = true;
        }
        events.append(&mut self.handler.events);
    }

    fn show_cursor(&mut self, show: bool) {
        self.window.set_cursor_visible(show);
        let grab = if show {
            self.window.set_cursor_grab(CursorGrabMode::None)
        } else {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        };
        if let Err(e) = grab {
            log::warn!("Could not change cursor grab: {}", e);
        }
        self.handler.cursor_hidden = !show;
    }

    fn is_cursor_hidden(&self) -> bool {
        self.handler.cursor_hidden
    }

    fn aspect_ratio(&self) -> f32 {
        let size = self.window.inner_size();
        if size.height == 0 {
            return 1.0;
        }
        size.width as f32 / size.height as f32
    }
}

struct WindowHandler {
    attributes: Option<WindowAttributes>,
    window: Option<Arc<winit::window::Window>>,
    error: Option<String>,
    events: Vec<InputEvent>,
    cursor: (f32, f32),
    pending_close: bool,
    cursor_hidden: bool,
}

impl WindowHandler {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes: Some(attributes),
            window: None,
            error: None,
            events: Vec::new(),
            cursor: (0.0, 0.0),
            pending_close: false,
            cursor_hidden: false,
        }
    }
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attributes) = self.attributes.take() else {
            return;
        };
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.events.push(InputEvent::CloseRequested),
            WindowEvent::Resized(size) => {
                self.events
                    .push(InputEvent::Resized(size.width, size.height));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed if !repeat => self.events.push(InputEvent::KeyPressed(code)),
                ElementState::Released => self.events.push(InputEvent::KeyReleased(code)),
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                self.events.push(InputEvent::Scrolled(amount));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.events.push(match state {
                    ElementState::Pressed => InputEvent::MousePressed(button),
                    ElementState::Released => InputEvent::MouseReleased(button),
                });
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.events.push(InputEvent::MouseMoved(MouseMotion {
                x: self.cursor.0,
                y: self.cursor.1,
                dx: dx as f32,
                dy: dy as f32,
            }));
        }
    }
}
