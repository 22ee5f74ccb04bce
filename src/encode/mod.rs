//! Model encoding: the encoder trait and the per-field dispatch layer.

pub mod dispatcher;
pub mod encoder;
pub mod precomputed;

pub use dispatcher::EncodingDispatcher;
pub use encoder::Encoder;
pub use precomputed::PrecomputedEncoder;
