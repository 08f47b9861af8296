//! Frame sources and game window lookup
//!
//! The capture loop talks to these through the [`FrameSource`] and
//! [`WindowLocator`] traits. Still images back offline runs and tests; live
//! screen capture needs the `screen-capture` feature.

pub mod error;
#[cfg(feature = "screen-capture")]
pub mod live;
pub mod still;
pub mod types;
pub mod window;

pub use error::{CaptureError, CaptureResult};
#[cfg(feature = "screen-capture")]
pub use live::{ScreenSource, TitleWindowLocator};
pub use still::StillImageSource;
pub use types::{Frame, FramePlacement, FrameSource, ScreenPoint, ScreenRect, WindowLocator};
pub use window::{DEFAULT_WINDOW_TITLES, FALLBACK_SCREEN, FixedWindow};
