//! The greeter service.

use tracing::info;

use crate::messages::{HelloReply, HelloRequest};

/// The unary SayHello operation, dispatched once a secure channel is up.
pub fn say_hello(request: &HelloRequest) -> HelloReply {
    info!("Greeter.SayHello");
    HelloReply {
        message: format!("Hello {}", request.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_by_name() {
        let reply = say_hello(&HelloRequest {
            name: "X".to_string(),
        });
        assert_eq!(reply.message, "Hello X");
    }
}
