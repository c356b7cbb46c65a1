//! Input events and the callback registries they are dispatched through.
//!
//! The window collaborator translates platform events into [`InputEvent`]s. During the
//! input phase the engine hands each polled batch to [`Input::dispatch`], which runs
//! the matching registry synchronously with the engine's [`Stage`] as context.

use winit::{event::MouseButton, keyboard::KeyCode};

use crate::{
    events::{Events, ListenerId},
    scene::Stage,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Only the initial press; key repeats are not reported.
    KeyPressed(KeyCode),
    KeyReleased(KeyCode),
    MouseMoved(MouseMotion),
    /// Vertical scroll amount, positive away from the user.
    Scrolled(f32),
    MousePressed(MouseButton),
    MouseReleased(MouseButton),
    Resized(u32, u32),
    CloseRequested,
}

/// Cursor position together with the relative motion since the last event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseMotion {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

pub struct Input<C> {
    pub on_key_press: Events<C, KeyCode>,
    pub on_key_release: Events<C, KeyCode>,
    pub on_mouse_move: Events<C, MouseMotion>,
    pub on_mouse_scroll: Events<C, f32>,
    pub on_mouse_press: Events<C, MouseButton>,
    pub on_mouse_release: Events<C, MouseButton>,
    last_motion: MouseMotion,
    mouse_moving: bool,
}

impl<C> Default for Input<C> {
    fn default() -> Self {
        Self {
            on_key_press: Events::new(),
            on_key_release: Events::new(),
            on_mouse_move: Events::new(),
            on_mouse_scroll: Events::new(),
            on_mouse_press: Events::new(),
            on_mouse_release: Events::new(),
            last_motion: MouseMotion::default(),
            mouse_moving: false,
        }
    }
}

impl<C> Input<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the registered callbacks for one frame's worth of events.
    ///
    /// When the mouse moved last frame but not in this one, listeners get a single
    /// motion event with zero relative movement so anything integrating motion settles.
    /// Window events (`Resized`, `CloseRequested`) are handled by the engine and
    /// skipped here.
    pub fn dispatch(&mut self, ctx: &mut C, events: &[InputEvent]) {
        let mut moved = false;
        for event in events {
            match event {
                InputEvent::KeyPressed(key) => self.on_key_press.run(ctx, key),
                InputEvent::KeyReleased(key) => self.on_key_release.run(ctx, key),
                InputEvent::MouseMoved(motion) => {
                    moved = true;
                    self.last_motion = *motion;
                    self.on_mouse_move.run(ctx, motion);
                }
                InputEvent::Scrolled(delta) => self.on_mouse_scroll.run(ctx, delta),
                InputEvent::MousePressed(button) => self.on_mouse_press.run(ctx, button),
                InputEvent::MouseReleased(button) => self.on_mouse_release.run(ctx, button),
                InputEvent::Resized(..) | InputEvent::CloseRequested => {}
            }
        }
        if !moved && self.mouse_moving {
            let still = MouseMotion {
                dx: 0.0,
                dy: 0.0,
                ..self.last_motion
            };
            self.on_mouse_move.run(ctx, &still);
        }
        self.mouse_moving = moved;
    }

    /// Drops every registered callback.
    pub fn clear(&mut self) {
        self.on_key_press.clear();
        self.on_key_release.clear();
        self.on_mouse_move.clear();
        self.on_mouse_scroll.clear();
        self.on_mouse_press.clear();
        self.on_mouse_release.clear();
    }
}

/// Listener ids of the built-in camera controls.
#[derive(Debug, Clone)]
pub struct CameraBindings {
    pub key_press: ListenerId,
    pub key_release: ListenerId,
    pub mouse_move: ListenerId,
    pub mouse_scroll: ListenerId,
    pub mouse_press: ListenerId,
    pub mouse_release: ListenerId,
}

/// Binds the default free-fly controls.
///
/// Esc closes the window, `.` toggles between camera and cursor mode, WASD and QE
/// accumulate movement, the mouse turns the camera and scrolling zooms while the right
/// button is held.
pub fn register_camera_controls(input: &mut Input<Stage>) -> CameraBindings {
    let key_press = input.on_key_press.bind(|stage: &mut Stage, key: &KeyCode| {
        match key {
            KeyCode::Escape => stage.request_close(),
            KeyCode::Period => {
                let hidden = stage.is_cursor_hidden();
                stage.show_cursor(hidden);
                stage.controls.input_mode = !stage.is_cursor_hidden();
            }
            _ => {}
        }
        if let Some(step) = movement_for(*key) {
            stage.controls.direction += step;
        }
    });

    let key_release = input.on_key_release.bind(|stage: &mut Stage, key: &KeyCode| {
        if let Some(step) = movement_for(*key) {
            stage.controls.direction -= step;
        }
    });

    let mouse_move = input.on_mouse_move.bind(|stage: &mut Stage, motion: &MouseMotion| {
        stage.controls.rotation.y = -motion.dx;
        stage.controls.rotation.x = -motion.dy;
    });

    let mouse_scroll = input.on_mouse_scroll.bind(|stage: &mut Stage, delta: &f32| {
        if stage.controls.can_zoom {
            stage.camera_mut().zoom(*delta);
        }
    });

    let mouse_press = input.on_mouse_press.bind(|stage: &mut Stage, button: &MouseButton| {
        if *button == MouseButton::Right {
            stage.controls.can_zoom = true;
        }
    });

    let mouse_release = input.on_mouse_release.bind(|stage: &mut Stage, button: &MouseButton| {
        if *button == MouseButton::Right {
            stage.controls.can_zoom = false;
            stage.camera_mut().reset_zoom();
        }
    });

    CameraBindings {
        key_press,
        key_release,
        mouse_move,
        mouse_scroll,
        mouse_press,
        mouse_release,
    }
}

fn movement_for(key: KeyCode) -> Option<cgmath::Vector3<f32>> {
    let step: [f32; 3] = match key {
        KeyCode::KeyW => [0.0, 0.0, 1.0],
        KeyCode::KeyS => [0.0, 0.0, -1.0],
        KeyCode::KeyA => [-1.0, 0.0, 0.0],
        KeyCode::KeyD => [1.0, 0.0, 0.0],
        KeyCode::KeyQ => [0.0, -1.0, 0.0],
        KeyCode::KeyE => [0.0, 1.0, 0.0],
        _ => return None,
    };
    Some(step.into())
}
