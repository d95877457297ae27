//! Session save/resume.
//!
//! - [`codec::SessionCodec`]: state ⇄ portable text token

pub mod codec;
