pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod gateway;
pub mod judge;
pub mod logging;
pub mod reference;
pub mod server;

pub use config::{Config, DimensionPolicy};
pub use error::{DetectorError, ImageRole};
pub use gateway::{allowed_file, sanitize_filename, StagedUpload, UploadGateway};
pub use judge::{SimilarityJudge, Verdict, NOT_TAMPERED_MESSAGE, TAMPERED_MESSAGE};
pub use reference::{FsReference, InMemoryReference, ReferenceProvider};
pub use server::{build_router, AppState, TamperServer};
