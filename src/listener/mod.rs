mod error;
mod listener;
mod packet;
mod parsing;

pub use error::ListenerError;
pub use listener::Listener;
