#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

//! Loads legacy RenderWare Script (RWX) models — the ActiveWorlds /
//! Virtual Paradise 3-D object format — into a runtime scene graph of
//! meshes, materials, and textures.
//!
//! [`scene::SceneAssembler`] is the entry point: it owns the archive
//! cache, the texture loader, and the process-wide prefab cache, and
//! turns a model name into a [`scene::ModelPrefab`] via
//! [`parser::parse_model`].

pub mod bmp;
pub mod cache;
pub mod errors;
pub mod material;
pub mod mesh;
pub mod parser;
pub mod pixel_buffer;
pub mod prototype;
pub mod scene;
pub mod texture;
pub mod transform;
pub mod worker;

pub use cache::{ArchiveCache, ArchiveHandle, ByteFetcher, NullFetcher, ServerCredentials};
#[cfg(feature = "http")]
pub use cache::EhttpFetcher;
pub use errors::{Result, RwxError};
pub use material::{MaterialMode, MaterialRecord, MaterialState};
pub use mesh::{MeshBuilder, Primitive, SubMesh, Vertex};
pub use parser::parse_model;
pub use pixel_buffer::PixelBuffer;
pub use prototype::PrototypeDefinition;
pub use scene::{ModelNode, ModelPrefab, SceneAssembler};
pub use texture::TextureLoader;
pub use worker::WorkerPool;
