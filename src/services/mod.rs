pub mod edit_gate;
pub use edit_gate::{EditGate, GateError, Verdict};

pub mod edit_gate_impl;
pub use edit_gate_impl::SeaOrmEditGate;

pub mod photos;
pub use photos::{PhotoStore, PhotoStoreError, UploadBatch};
