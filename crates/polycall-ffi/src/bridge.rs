use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use polycall_registry::{CommandMessage, CommandResponse, Param, Status};
use polycall_state::{ConnectionState, Snapshot};
use polycall_types::{ConversionRegistry, FfiValue};
use polycall_wire::{Message, MessageType};
use tracing::warn;

use crate::codec::{decode_value, encode_value};
use crate::error::FfiError;
use crate::local::LocalFunctionRegistry;
use crate::observer::FfiObserver;
use crate::remote::{RemoteFunctionEntry, RemoteFunctionRegistry};
use crate::routing::{RoutingRule, RoutingTable};

/// Reserved `command_id` carrying an FFI invocation: param 0 is the UTF-8
/// qualified function name, params 1.. are the positional arguments in
/// signature order (`spec.md` §4.6).
pub const FFI_INVOKE_COMMAND_ID: u32 = u32::MAX;

/// Sends an already-framed outbound [`Message`] toward `endpoint`. The
/// orchestrator wires this to whatever transport owns that endpoint;
/// `polycall-ffi` itself stays transport-agnostic.
pub trait OutboundChannel: Send + Sync {
    fn send(&self, endpoint: &str, message: Message) -> Result<(), FfiError>;
}

/// Ties together local/remote function directories, routing, type
/// conversion and the outbound waiter table (`spec.md` §4.6 "Protocol-FFI
/// bridge").
pub struct Bridge {
    locals: LocalFunctionRegistry,
    remotes: RemoteFunctionRegistry,
    routing: RoutingTable,
    conversions: Arc<ConversionRegistry>,
    waiters: Mutex<HashMap<u32, tokio::sync::oneshot::Sender<CommandResponse>>>,
    next_sequence: AtomicU32,
    observers: Mutex<Vec<Box<dyn FfiObserver>>>,
}

impl Bridge {
    pub fn new(conversions: Arc<ConversionRegistry>) -> Self {
        Self {
            locals: LocalFunctionRegistry::new(),
            remotes: RemoteFunctionRegistry::new(),
            routing: RoutingTable::new(),
            conversions,
            waiters: Mutex::new(HashMap::new()),
            next_sequence: AtomicU32::new(0),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn register_local(
        &self,
        name: impl Into<String>,
        signature: polycall_types::FfiSignature,
        invoke: impl Fn(&[FfiValue]) -> Result<FfiValue, FfiError> + Send + Sync + 'static,
    ) -> Result<(), FfiError> {
        self.locals.register(name, signature, invoke)
    }

    pub fn register_remote(&self, entry: RemoteFunctionEntry) -> Result<(), FfiError> {
        self.remotes.register(entry)
    }

    pub fn add_routing_rule(&self, rule: RoutingRule) {
        self.routing.add(rule);
    }

    pub fn add_observer(&self, observer: Box<dyn FfiObserver>) {
        self.observers.lock().push(observer);
    }

    /// Publishes a connection-state snapshot to every registered observer
    /// (`spec.md` §4.6).
    pub fn sync_state(&self, snapshot: Snapshot<ConnectionState>) {
        for observer in self.observers.lock().iter() {
            observer.on_state_change(snapshot);
        }
    }

    /// Inbound dispatch: decode the invoke envelope, look up the named
    /// local function, convert each wire parameter to its declared type,
    /// invoke, and convert the result back (`spec.md` §4.6).
    pub fn dispatch_inbound(&self, command: &CommandMessage) -> CommandResponse {
        match self.dispatch_inbound_inner(command) {
            Ok(response) => response,
            Err(err) => {
                let poly: polycall_error::PolyError = err.clone().into();
                CommandResponse::error(poly.kind.status_code(), err.to_string())
            }
        }
    }

    fn dispatch_inbound_inner(&self, command: &CommandMessage) -> Result<CommandResponse, FfiError> {
        if command.command_id != FFI_INVOKE_COMMAND_ID {
            return Err(FfiError::MalformedPayload);
        }
        let name_param = command.param(0).ok_or(FfiError::MalformedPayload)?;
        let name = String::from_utf8(name_param.bytes.clone()).map_err(|_| FfiError::MalformedPayload)?;

        let function = self.locals.lookup(&name).ok_or(FfiError::FunctionNotFound { name: name.clone() })?;

        let mut args = Vec::with_capacity(function.signature.params.len());
        for (index, expected_tag) in function.signature.params.iter().enumerate() {
            let param = command.param((index + 1) as u32).ok_or(FfiError::MalformedPayload)?;
            let raw = decode_value(param.type_tag, &param.bytes)?;
            let converted = self.conversions.convert(&raw, *expected_tag)?;
            args.push(converted);
        }

        let result = function.call(&args)?;
        let result = self.conversions.convert(&result, function.signature.return_type)?;
        Ok(CommandResponse::success(encode_value(&result)))
    }

    /// Outbound call: resolves a target endpoint (explicit override, then
    /// the remote function registry, then the routing table), marshals the
    /// call as a command message, and awaits the matching response by
    /// sequence id up to `timeout_ms` (`spec.md` §4.6).
    pub async fn call_outbound(
        &self,
        function_name: &str,
        args: &[FfiValue],
        target_endpoint: Option<String>,
        timeout_ms: u64,
        channel: &dyn OutboundChannel,
    ) -> Result<FfiValue, FfiError> {
        let remote_entry = self.remotes.lookup(function_name);
        let endpoint = target_endpoint
            .or_else(|| remote_entry.as_ref().map(|e| e.target_endpoint.clone()))
            .or_else(|| self.routing.resolve(function_name))
            .ok_or_else(|| FfiError::NoRoute { name: function_name.to_string() })?;
        let return_tag = remote_entry.map(|e| e.signature.return_type);

        let mut command = CommandMessage::new(FFI_INVOKE_COMMAND_ID);
        command
            .add_param(Param::new(0, polycall_types::ValueTag::String, function_name.as_bytes().to_vec()))
            .map_err(|_| FfiError::MalformedPayload)?;
        for (index, arg) in args.iter().enumerate() {
            command
                .add_param(Param::new((index + 1) as u32, arg.tag(), encode_value(arg)))
                .map_err(|_| FfiError::MalformedPayload)?;
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.waiters.lock().insert(sequence, tx);

        let message = Message::new(MessageType::Command, sequence, command.encode());
        if let Err(err) = channel.send(&endpoint, message) {
            self.waiters.lock().remove(&sequence);
            return Err(err);
        }

        let response = match tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                self.waiters.lock().remove(&sequence);
                return Err(FfiError::Timeout);
            }
            Err(_) => {
                self.waiters.lock().remove(&sequence);
                return Err(FfiError::Timeout);
            }
        };

        match response.status {
            Status::Success => {
                decode_value(return_tag.unwrap_or(polycall_types::ValueTag::Bytes), &response.data).map_err(Into::into)
            }
            _ => Err(FfiError::InvocationFailed { code: response.error_code, message: response.error_message }),
        }
    }

    /// Completes the waiter for `sequence` with an inbound response frame.
    /// Called by whatever reads the transport and recognizes a response
    /// matching an in-flight outbound call. Unmatched sequences (already
    /// timed out, or never ours) are logged and dropped.
    pub fn complete_outbound(&self, sequence: u32, response: CommandResponse) {
        match self.waiters.lock().remove(&sequence) {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => warn!(sequence, "no waiter for outbound response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycall_types::{FfiSignature, ValueTag};
    use std::sync::Mutex as StdMutex;

    fn bridge() -> Bridge {
        Bridge::new(Arc::new(ConversionRegistry::new()))
    }

    #[test]
    fn inbound_dispatch_invokes_registered_function() {
        let bridge = bridge();
        bridge
            .register_local("math.add", FfiSignature::new(vec![ValueTag::I32, ValueTag::I32], ValueTag::I32, 1), |args| {
                match (&args[0], &args[1]) {
                    (FfiValue::I32(a), FfiValue::I32(b)) => Ok(FfiValue::I32(a + b)),
                    _ => unreachable!(),
                }
            })
            .unwrap();

        let mut command = CommandMessage::new(FFI_INVOKE_COMMAND_ID);
        command.add_param(Param::new(0, ValueTag::String, b"math.add".to_vec())).unwrap();
        command.add_param(Param::new(1, ValueTag::I32, 2i32.to_le_bytes().to_vec())).unwrap();
        command.add_param(Param::new(2, ValueTag::I32, 3i32.to_le_bytes().to_vec())).unwrap();

        let response = bridge.dispatch_inbound(&command);
        assert_eq!(response.status, Status::Success);
        assert_eq!(i32::from_le_bytes(response.data.try_into().unwrap()), 5);
    }

    #[test]
    fn inbound_dispatch_reports_not_found() {
        let bridge = bridge();
        let mut command = CommandMessage::new(FFI_INVOKE_COMMAND_ID);
        command.add_param(Param::new(0, ValueTag::String, b"nope".to_vec())).unwrap();
        let response = bridge.dispatch_inbound(&command);
        assert_eq!(response.status, Status::Error);
    }

    struct RecordingChannel {
        sent: StdMutex<Vec<(String, Message)>>,
    }

    impl OutboundChannel for RecordingChannel {
        fn send(&self, endpoint: &str, message: Message) -> Result<(), FfiError> {
            self.sent.lock().unwrap().push((endpoint.to_string(), message));
            Ok(())
        }
    }

    #[tokio::test]
    async fn outbound_call_resolves_via_routing_table_and_times_out_without_a_response() {
        let bridge = bridge();
        bridge.add_routing_rule(RoutingRule::new("math.*", "tcp://peer", 1));
        let channel = RecordingChannel { sent: StdMutex::new(Vec::new()) };

        let err = bridge.call_outbound("math.add", &[FfiValue::I32(1)], None, 20, &channel).await.unwrap_err();
        assert_eq!(err, FfiError::Timeout);
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn outbound_call_without_a_route_fails_fast() {
        let bridge = bridge();
        let channel = RecordingChannel { sent: StdMutex::new(Vec::new()) };
        let err = bridge.call_outbound("nowhere.fn", &[], None, 20, &channel).await.unwrap_err();
        assert_eq!(err, FfiError::NoRoute { name: "nowhere.fn".into() });
    }

    #[tokio::test]
    async fn outbound_call_completes_when_a_matching_response_arrives() {
        let bridge = Arc::new(bridge());
        bridge.register_remote(RemoteFunctionEntry {
            qualified_name: "math.add".into(),
            language_id: 2,
            signature: FfiSignature::new(vec![ValueTag::I32], ValueTag::I32, 2),
            target_endpoint: "tcp://peer".into(),
        })
        .unwrap();
        let channel = RecordingChannel { sent: StdMutex::new(Vec::new()) };

        let bridge_for_responder = bridge.clone();
        let responder = tokio::spawn(async move {
            // give call_outbound a moment to register its waiter
            tokio::time::sleep(Duration::from_millis(5)).await;
            bridge_for_responder.complete_outbound(0, CommandResponse::success(7i32.to_le_bytes().to_vec()));
        });

        let result = bridge.call_outbound("math.add", &[FfiValue::I32(1)], None, 200, &channel).await.unwrap();
        responder.await.unwrap();
        assert_eq!(result, FfiValue::I32(7));
    }
}
