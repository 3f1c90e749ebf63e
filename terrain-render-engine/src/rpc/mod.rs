//! # Web RPC Bridge
//!
//! JSON-RPC 2.0 communication between the embedding frontend and the Bevy
//! viewer. The engine runs inside an iframe; the frontend posts requests via
//! `window.postMessage` and the engine replies to the parent window.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Existing Methods
//!
//! ### Terrain Operations
//! - `load_heightmap`: Stage user-uploaded heightmap bytes for baking
//! - `bake_terrain`: Queue a displacement bake from the default or uploaded heightmap
//!
//! ### Export Operations
//! - `export_terrain`: Serialise the baked terrain into .gltf or .glb
//!
//! ### Render Control
//! - `set_wireframe`: Toggle the wireframe overlay
//!
//! ### Diagnostics
//! - `get_fps`: Retrieve current frame rate
//!
//! Completion of queued work is reported with `bake_complete`/`bake_failed`
//! and `export_complete`/`export_failed` notifications.

/// JSON-RPC 2.0 bidirectional communication system for frontend integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
