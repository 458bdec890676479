pub mod probe;

pub use probe::WsProbe;
