mod context;
mod present;

pub use context::GpuContext;
pub use present::Presenter;
