/// FPS overlay text and periodic frontend notifications.
pub mod fps_overlay;

/// Keyboard shortcuts for bake, export and wireframe toggling.
pub mod shortcuts;

/// Wireframe overlay state management.
pub mod wireframe;
