pub mod encaste;
pub mod gallo;

pub use encaste::{EncasteInput, EstadoEncaste};
pub use gallo::{GalloInput, TipoBrida};
