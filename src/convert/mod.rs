//! Document-to-message conversion: property application and session orchestration.

pub mod apply;
pub mod session;

pub use apply::{apply, resolve_folder, ApplyOptions, IndexBase};
pub use session::{AttachmentBase, ConversionSession, ConvertOptions};
