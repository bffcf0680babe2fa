//! Poll interceptors, one per device family.

pub mod vpad;
pub mod wpad;

pub use vpad::{SamplingMode, VpadHost, VpadInterceptor, VpadReadError, VpadStatus, VpadTracker};
pub use wpad::{WpadHost, WpadInterceptor, WpadSample, WpadStatus, WpadTracker};
