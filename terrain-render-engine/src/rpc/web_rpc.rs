use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use terrain_mesh::ExportOptions;

use crate::engine::export::ExportRequested;
use crate::engine::systems::wireframe::WireframeState;
use crate::engine::terrain::bake::{BakeRequested, BakeSource, UserHeightmap};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the frontend
/// and Bevy. Handles both request-response patterns and notification
/// broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the frontend without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the frontend.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            // Attempt JSON parsing to validate RPC format before queuing.
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .expect("Failed to register message listener");
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the frontend.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    diagnostics: Res<DiagnosticsStore>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut user_heightmap: ResMut<UserHeightmap>,
    mut wireframe: ResMut<WireframeState>,
    mut bake_events: EventWriter<BakeRequested>,
    mut export_events: EventWriter<ExportRequested>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                let mut context = RpcContext {
                    diagnostics: &diagnostics,
                    user_heightmap: &mut user_heightmap,
                    wireframe: &mut wireframe,
                    bake_events: &mut bake_events,
                    export_events: &mut export_events,
                };

                if let Some(response) = handle_rpc_request(&request, &mut context) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("RPC parse error: {}", parse_error);
                rpc_interface.send_notification(
                    "debug_message",
                    serde_json::json!({
                        "message": format!("Parse error: {}", parse_error)
                    }),
                );
            }
        }
    }
}

struct RpcContext<'w1, 'w2, 'a> {
    diagnostics: &'a DiagnosticsStore,
    user_heightmap: &'a mut UserHeightmap,
    wireframe: &'a mut WireframeState,
    bake_events: &'a mut EventWriter<'w1, BakeRequested>,
    export_events: &'a mut EventWriter<'w2, ExportRequested>,
}

/// Handle individual RPC request and generate response based on method.
fn handle_rpc_request(request: &RpcRequest, context: &mut RpcContext) -> Option<RpcResponse> {
    // Only generate responses for requests with IDs (notifications have no ID).
    let id = request.id.clone()?;

    let result = match request.method.as_str() {
        "load_heightmap" => handle_load_heightmap(&request.params, context.user_heightmap),
        "bake_terrain" => handle_bake_terrain(&request.params, context.bake_events),
        "export_terrain" => handle_export_terrain(&request.params, context.export_events),
        "set_wireframe" => handle_set_wireframe(&request.params, context.wireframe),
        "get_fps" => handle_get_fps(context.diagnostics),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(serde_json::json!({"method": request.method})),
            ));
        }
    };

    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Stage uploaded heightmap bytes. Accepts plain base64 or a data URL; the
/// image itself is decoded when a bake consumes it.
fn handle_load_heightmap(
    params: &serde_json::Value,
    user_heightmap: &mut UserHeightmap,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize)]
    struct LoadHeightmapParams {
        data: String,
    }

    let load_params = serde_json::from_value::<LoadHeightmapParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected base64 'data' parameter"))?;

    let encoded = match load_params.data.split_once(";base64,") {
        Some((_, tail)) => tail,
        None => load_params.data.as_str(),
    };

    let bytes = BASE64
        .decode(encoded)
        .map_err(|err| RpcError::invalid_params(&format!("Invalid base64 payload: {err}")))?;

    info!("✓ Heightmap upload staged ({} bytes)", bytes.len());
    let byte_count = bytes.len();
    user_heightmap.bytes = Some(bytes);

    Ok(serde_json::json!({
        "success": true,
        "bytes": byte_count
    }))
}

/// Queue a displacement bake; completion arrives as a `bake_complete` or
/// `bake_failed` notification.
fn handle_bake_terrain(
    params: &serde_json::Value,
    bake_events: &mut EventWriter<BakeRequested>,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize, Default)]
    #[serde(default)]
    struct BakeTerrainParams {
        source: Option<String>,
        scale: Option<f32>,
    }

    let bake_params = serde_json::from_value::<BakeTerrainParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected optional 'source' and 'scale'"))?;

    if let Some(scale) = bake_params.scale {
        if !scale.is_finite() || scale < 0.0 {
            return Err(RpcError::invalid_params(
                "'scale' must be a finite value >= 0",
            ));
        }
    }

    let source = match bake_params.source.as_deref() {
        None | Some("default") => BakeSource::DefaultHeightmap,
        Some("upload") => BakeSource::UserUpload,
        Some(other) => {
            return Err(RpcError::invalid_params(&format!(
                "Unknown heightmap source: {other}"
            )));
        }
    };

    bake_events.write(BakeRequested {
        source,
        scale: bake_params.scale,
    });

    Ok(serde_json::json!({
        "queued": true
    }))
}

/// Queue a terrain export; completion arrives as an `export_complete` or
/// `export_failed` notification.
fn handle_export_terrain(
    params: &serde_json::Value,
    export_events: &mut EventWriter<ExportRequested>,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize, Default)]
    #[serde(default)]
    struct ExportTerrainParams {
        include_transforms: Option<bool>,
        only_visible_nodes: Option<bool>,
        binary_output: Option<bool>,
        max_texture_dimension: Option<u32>,
    }

    let export_params = serde_json::from_value::<ExportTerrainParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Malformed export options"))?;

    if let Some(dimension) = export_params.max_texture_dimension {
        if dimension == 0 {
            return Err(RpcError::invalid_params(
                "'max_texture_dimension' must be at least 1",
            ));
        }
    }

    let defaults = ExportOptions::default();
    let options = ExportOptions {
        include_transforms: export_params
            .include_transforms
            .unwrap_or(defaults.include_transforms),
        only_visible_nodes: export_params
            .only_visible_nodes
            .unwrap_or(defaults.only_visible_nodes),
        binary_output: export_params.binary_output.unwrap_or(defaults.binary_output),
        max_texture_dimension: export_params
            .max_texture_dimension
            .unwrap_or(defaults.max_texture_dimension),
    };

    let binary = options.binary_output;
    export_events.write(ExportRequested { options });

    Ok(serde_json::json!({
        "queued": true,
        "binary": binary
    }))
}

fn handle_set_wireframe(
    params: &serde_json::Value,
    wireframe: &mut WireframeState,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize)]
    struct SetWireframeParams {
        enabled: bool,
    }

    let wireframe_params = serde_json::from_value::<SetWireframeParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected boolean 'enabled' parameter"))?;

    wireframe.enabled = wireframe_params.enabled;

    Ok(serde_json::json!({
        "success": true,
        "enabled": wireframe_params.enabled
    }))
}

/// Handle FPS retrieval with diagnostic system integration.
fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(serde_json::json!({
        "fps": fps
    }))
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the frontend.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window (embedding frontend).
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_heightmap_accepts_data_urls() {
        let mut heightmap = UserHeightmap::default();
        let params = serde_json::json!({
            "data": format!("data:image/png;base64,{}", BASE64.encode([1u8, 2, 3, 4]))
        });

        let result = handle_load_heightmap(&params, &mut heightmap).unwrap();
        assert_eq!(result["bytes"], 4);
        assert_eq!(heightmap.bytes.as_deref(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn load_heightmap_rejects_garbage() {
        let mut heightmap = UserHeightmap::default();
        let params = serde_json::json!({"data": "not!!base64"});

        assert!(handle_load_heightmap(&params, &mut heightmap).is_err());
        assert!(heightmap.bytes.is_none());
    }
}
