pub mod bake;
pub mod mesh;
pub mod scene;
