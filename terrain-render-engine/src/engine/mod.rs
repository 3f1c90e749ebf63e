pub mod assets;
pub mod camera;
pub mod export;
pub mod loading;
pub mod systems;
pub mod terrain;
