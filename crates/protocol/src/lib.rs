//! plauder-protocol – Nachrichtenmodell und Wire-Format
//!
//! Definiert die Nachrichten, die zwischen Client und Relay ausgetauscht
//! werden, und deren explizites Frame-Format (Typ-Byte + Laenge + Payload).

pub mod error;
pub mod message;
pub mod wire;

pub use error::FrameError;
pub use message::{Nachricht, NachrichtenTyp};
pub use wire::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
