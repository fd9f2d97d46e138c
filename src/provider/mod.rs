//! Native upload provider abstraction
//!
//! The platform service that actually performs uploads sits behind the
//! [`NativeUploadProvider`] trait. The crate never talks HTTP itself; it only
//! dispatches requests through this trait and republishes the events the
//! provider emits.
//!
//! - [`NativeUploadProvider`]: the seam native bridges implement
//! - [`NoOpProvider`]: stub for builds without a bridge

mod noop;
mod traits;

pub use noop::NoOpProvider;
pub use traits::NativeUploadProvider;
