use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::pbr::wireframe::WireframePlugin;
use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy_common_assets::json::JsonAssetPlugin;

mod engine;
mod rpc;

use engine::assets::manifest::TerrainManifest;
use engine::assets::terrain_assets::TerrainAssets;
use engine::camera::orbit_camera::{OrbitCamera, camera_controller};
use engine::export::{ExportRequested, handle_export_requests};
use engine::loading::manifest_loader::{ManifestLoader, load_manifest_system, start_loading};
use engine::loading::progress::LoadingProgress;
use engine::loading::texture_loader::check_texture_loading;
use engine::systems::fps_overlay::{
    fps_notification_system, fps_text_update_system, spawn_fps_overlay,
};
use engine::systems::shortcuts::handle_keyboard_shortcuts;
use engine::systems::wireframe::{WireframeState, sync_wireframe_system};
use engine::terrain::bake::{
    BakeQueue, BakeRequested, UserHeightmap, complete_pending_bakes, process_bake_requests,
};
use rpc::web_rpc::WebRpcPlugin;

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

/// Create the terrain viewer application
fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(JsonAssetPlugin::<TerrainManifest>::new(&["json"]))
        .add_plugins(WireframePlugin::default())
        .add_plugins(WebRpcPlugin);

    app.init_resource::<ManifestLoader>()
        .init_resource::<LoadingProgress>()
        .init_resource::<TerrainAssets>()
        .init_resource::<BakeQueue>()
        .init_resource::<UserHeightmap>()
        .init_resource::<WireframeState>()
        .init_resource::<OrbitCamera>()
        .add_event::<BakeRequested>()
        .add_event::<ExportRequested>()
        .add_systems(Startup, (setup, start_loading))
        .add_systems(
            Update,
            (
                load_manifest_system,
                check_texture_loading,
                process_bake_requests,
                complete_pending_bakes,
                handle_export_requests,
                camera_controller,
                handle_keyboard_shortcuts,
                sync_wireframe_system,
                fps_text_update_system,
                fps_notification_system,
            ),
        );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}

/// Spawn camera, lighting and the FPS overlay; the terrain entity follows
/// once the manifest is loaded.
fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(60.0, 40.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 100.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 80.0,
        ..default()
    });

    spawn_fps_overlay(&mut commands);
}
