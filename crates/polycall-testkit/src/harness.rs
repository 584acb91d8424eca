use std::sync::Arc;

use polycall_registry::{CommandMessage, CommandResponse, Registry};
use polycall_wire::{Message, MessageType, Transport, TransportError};

/// An in-process client/server pair wired together with [`Transport::mem_pair`]
/// and a shared [`Registry`], for exercising command dispatch end to end
/// without a real socket.
pub struct Harness {
    pub client: Transport,
    pub server: Transport,
    pub registry: Arc<Registry>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(Registry::new()))
    }

    pub fn with_registry(registry: Arc<Registry>) -> Self {
        let (client, server) = Transport::mem_pair();
        Self { client, server, registry }
    }

    /// Encodes and sends a command message from the client end.
    pub async fn send_command(&self, sequence: u32, command: &CommandMessage) -> Result<(), TransportError> {
        self.client.send(Message::new(MessageType::Command, sequence, command.encode())).await
    }

    /// Receives one message on the server end, dispatches it through the
    /// shared registry, and sends the encoded response back. A malformed
    /// command or dispatch failure still produces a well-formed error
    /// response rather than dropping the exchange.
    pub async fn serve_one(&self) -> Result<(), TransportError> {
        let request = self.server.recv().await?;
        let response = match CommandMessage::decode(&request.payload) {
            Ok(command) => self
                .registry
                .dispatch(&command)
                .unwrap_or_else(|err| CommandResponse::error(0, err.to_string())),
            Err(err) => CommandResponse::error(0, err.to_string()),
        };
        self.server
            .send(Message::new(MessageType::Response, request.sequence, response.encode()))
            .await
    }

    /// Sends `command`, serves it once, and decodes the response that comes
    /// back on the client end. The common case for a single-exchange test.
    pub async fn round_trip(&self, sequence: u32, command: &CommandMessage) -> Result<CommandResponse, TransportError> {
        self.send_command(sequence, command).await?;
        self.serve_one().await?;
        let response = self.client.recv().await?;
        Ok(CommandResponse::decode(&response.payload)
            .unwrap_or_else(|_| CommandResponse::error(0, "malformed response payload")))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
