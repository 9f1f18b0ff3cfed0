//! Abstract input events
//!
//! Hosts translate mouse/touch/button events into [`InputEvent`]s. Positions
//! arrive in client (page) coordinates and are mapped into the container with
//! [`ContainerRect::to_local_x`].

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CONTAINER_HEIGHT, DEFAULT_CONTAINER_WIDTH};

/// Placement of the play container on the page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerRect {
    /// Client x of the container's left edge
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ContainerRect {
    fn default() -> Self {
        Self {
            left: 0.0,
            width: DEFAULT_CONTAINER_WIDTH,
            height: DEFAULT_CONTAINER_HEIGHT,
        }
    }
}

impl ContainerRect {
    pub fn new(left: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            width,
            height,
        }
    }

    /// Replace a collapsed (not yet laid out) size with the default 400x600
    pub fn or_default_size(self) -> Self {
        let width = if self.width > 0.0 {
            self.width
        } else {
            DEFAULT_CONTAINER_WIDTH
        };
        let height = if self.height > 0.0 {
            self.height
        } else {
            DEFAULT_CONTAINER_HEIGHT
        };
        Self {
            left: self.left,
            width,
            height,
        }
    }

    /// Client x to container-local x
    #[inline]
    pub fn to_local_x(&self, client_x: f32) -> f32 {
        client_x - self.left
    }
}

/// Player interactions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse or touch moved
    PointerMove { client_x: f32 },
    /// Mouse button or touch pressed
    PointerDown { client_x: f32, on_overlay: bool },
    /// Mouse button or touch released
    PointerUp,
    /// Pointer left the window
    PointerLeave,
    /// Completed click/tap
    Click { on_overlay: bool },
    /// Continuous-drop button
    ToggleContinuous,
    /// Music button
    ToggleMusic,
    /// Restart button
    Restart,
}

impl InputEvent {
    /// Counts as a user gesture for the browser autoplay policy
    pub fn is_gesture(&self) -> bool {
        !matches!(
            self,
            InputEvent::PointerMove { .. } | InputEvent::PointerUp | InputEvent::PointerLeave
        )
    }
}
