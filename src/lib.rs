pub mod error;
pub mod export;
pub mod format;
pub mod provider;
pub mod quantization;
pub mod tensors;

pub use error::ExportError;
