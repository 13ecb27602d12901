pub mod dialer;
pub mod endpoint;
pub mod framing;
pub mod greeter;
pub mod identity;
pub mod listener;
pub mod messages;

pub use dialer::{GreeterChannel, DIAL_TIMEOUT};
pub use endpoint::{Endpoint, EndpointManager};
pub use listener::GreeterListener;
pub use messages::{HelloReply, HelloRequest, WireMessage};
