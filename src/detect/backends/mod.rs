mod color;
mod stub;

pub use color::ColorBackend;
pub use stub::StubBackend;
