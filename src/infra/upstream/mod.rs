//! HTTP clients for the image host and the diagnosis model.

mod cloudinary;
mod gemini;

pub use cloudinary::CloudinaryUploader;
pub use gemini::GeminiDiagnoser;

pub(crate) fn user_agent() -> &'static str {
    concat!("plantlog/", env!("CARGO_PKG_VERSION"))
}
