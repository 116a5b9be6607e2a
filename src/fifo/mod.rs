pub mod ring;
pub mod gray;
pub mod sync;
pub mod flags;
mod controller;

pub use controller::AsyncFifo;
pub use controller::Domain;
pub use controller::ResetHandle;
pub use controller::{WritePort, WriteCycle};
pub use controller::{ReadPort, ReadCycle};
