//! Command encoders and transports for the TVs and decoders the `samsung`,
//! `sharpaquos` and `uraytech` binaries drive. Each module is self-contained:
//! one device, one wire protocol.

pub mod aquos;
pub mod samsung;
pub mod uraytech;
