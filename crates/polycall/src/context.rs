use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use polycall_error::{ErrorKind, PolyError};
use polycall_ffi::{Bridge, FFI_INVOKE_COMMAND_ID};
use polycall_memory::RegionManager;
use polycall_pool::Pool;
use polycall_registry::{CommandMessage, CommandResponse, CommandSpec};
use polycall_runtime::{ComponentRegistry, LimiterConfig, SecurityMode};
use polycall_security::{AclTable, AuditBuffer, AuditEvent, CallerContext, Identity, IsolationLevel, Token, TokenIssuer};
use polycall_stream::{DuplexStream, StreamConfig};
use polycall_types::ConversionRegistry;
use tokio::sync::Notify;
use tracing::instrument;

use crate::config::ContextConfig;

/// The orchestrator: wires a fresh instance of every subsystem behind a
/// single handle and exposes the control surface from `spec.md` §6
/// (`register_command`, `unregister_command`, `dispatch`, `open_stream`,
/// `acquire_connection`, `release_connection`, `issue_token`,
/// `check_permission`), plus `shutdown` in documented order.
pub struct Context {
    registry: polycall_registry::Registry,
    bridge: Bridge,
    types: Arc<ConversionRegistry>,
    acl: AclTable,
    audit: AuditBuffer,
    tokens: TokenIssuer,
    components: ComponentRegistry,
    memory: RegionManager,
    pool: Pool,
    streams: Mutex<Vec<Arc<DuplexStream>>>,
    shutdown: AtomicBool,
    notify: Notify,
    healthy: AtomicBool,
    in_flight: AtomicUsize,
}

impl Context {
    #[instrument(skip(config))]
    pub fn new(config: ContextConfig) -> Self {
        let types = Arc::new(ConversionRegistry::new());
        let mut pool = Pool::new(config.pool_config, config.pool_strategy, config.pool_opener);
        if let Some(validator) = config.pool_validator {
            pool = pool.with_validator(validator);
        }
        let memory = match &config.region_size_classes {
            Some(classes) => RegionManager::new(classes),
            None => RegionManager::default(),
        };

        Self {
            registry: polycall_registry::Registry::new(),
            bridge: Bridge::new(types.clone()),
            types,
            acl: AclTable::new(),
            audit: AuditBuffer::new(config.audit_capacity),
            tokens: TokenIssuer::new(),
            components: ComponentRegistry::new(),
            memory,
            pool,
            streams: Mutex::new(Vec::new()),
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
            healthy: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn types(&self) -> &Arc<ConversionRegistry> {
        &self.types
    }

    pub fn acl(&self) -> &AclTable {
        &self.acl
    }

    pub fn audit(&self) -> &AuditBuffer {
        &self.audit
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn memory(&self) -> &RegionManager {
        &self.memory
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    fn fail_if_unhealthy(&self) -> Result<(), PolyError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PolyError::new(ErrorKind::Cancelled, "polycall", "context is shutting down"));
        }
        if !self.is_healthy() {
            return Err(PolyError::new(ErrorKind::InvalidState, "polycall", "context is unhealthy"));
        }
        Ok(())
    }

    pub fn register_command(&self, spec: CommandSpec) -> Result<u32, PolyError> {
        self.fail_if_unhealthy()?;
        self.registry.register(spec).map_err(Into::into)
    }

    pub fn unregister_command(&self, id: u32) {
        self.registry.unregister(id);
    }

    /// Resolves `message` to a handler and invokes it (`spec.md` §4.3), or,
    /// for the reserved FFI invoke command id, routes it through the
    /// protocol↔FFI bridge instead (`spec.md` §4.6 inbound direction) —
    /// the data-flow note in §2: "C5 resolves command → ... (if FFI) C8
    /// marshals" collapsed into the one control-surface `dispatch` call.
    pub fn dispatch(&self, message: &CommandMessage) -> Result<CommandResponse, PolyError> {
        self.fail_if_unhealthy()?;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let result = if message.command_id == FFI_INVOKE_COMMAND_ID {
            Ok(self.bridge.dispatch_inbound(message))
        } else {
            self.registry.dispatch(message).map_err(Into::into)
        };
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.notify.notify_waiters();
        result
    }

    /// Creates and opens a new duplex stream, tracked for close-on-shutdown
    /// (`spec.md` §4.4, §6).
    pub fn open_stream(&self, config: StreamConfig) -> Result<Arc<DuplexStream>, PolyError> {
        self.fail_if_unhealthy()?;
        let stream = Arc::new(DuplexStream::new(config));
        stream.open().map_err(PolyError::from)?;
        self.streams.lock().push(stream.clone());
        Ok(stream)
    }

    pub fn acquire_connection(&self) -> Result<String, PolyError> {
        self.fail_if_unhealthy()?;
        self.pool.acquire().map_err(Into::into)
    }

    pub fn release_connection(&self, endpoint: &str) -> Result<(), PolyError> {
        self.pool.release(endpoint).map_err(Into::into)
    }

    pub fn issue_token(&self, identity: &Identity) -> Token {
        self.tokens.issue(identity)
    }

    /// Evaluates `caller` against the ACL and records the outcome to the
    /// audit buffer (`spec.md` §4.7: "every cross-boundary call ...
    /// consults the ACL").
    pub fn check_permission(&self, caller: &CallerContext<'_>) -> Result<(), PolyError> {
        let outcome = self.acl.check(caller);
        self.audit.push(AuditEvent::new(
            caller.context,
            caller.function,
            caller.function,
            "check_permission",
            outcome.is_ok(),
            if outcome.is_err() { caller.permission_mask } else { polycall_security::PermissionMask::empty() },
            "",
        ));
        outcome.map_err(Into::into)
    }

    pub fn create_component(
        &self,
        name: impl Into<String>,
        isolation: IsolationLevel,
        security_mode: SecurityMode,
        limiter_config: LimiterConfig,
    ) -> Result<Arc<polycall_runtime::Component>, PolyError> {
        self.fail_if_unhealthy()?;
        self.components.create(name, isolation, security_mode, limiter_config).map_err(Into::into)
    }

    /// Tears the context down in the order `spec.md` §5/§12 documents:
    /// stop accepting new dispatches, drain in-flight calls, close every
    /// open stream, release pool connections, tear down components, then
    /// mark the context unhealthy. Idempotent.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.notify.notify_waiters();

        while self.in_flight.load(Ordering::Acquire) > 0 {
            tokio::task::yield_now().await;
        }

        for stream in self.streams.lock().drain(..) {
            stream.close();
        }

        self.pool.close_all();

        for name in self.components.names() {
            let _ = self.components.destroy(&name, &self.memory);
        }

        self.healthy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycall_registry::{CommandMessage, Param};
    use polycall_security::PermissionMask;
    use polycall_types::ValueTag;

    fn echo_spec() -> CommandSpec {
        CommandSpec::new(
            "echo",
            Box::new(|msg: &CommandMessage| {
                let param = msg.param(1).ok_or_else(|| polycall_registry::CommandError::new(1, "missing required param 1"))?;
                Ok(param.bytes.clone())
            }),
        )
    }

    #[tokio::test]
    async fn register_then_dispatch_then_shutdown() {
        let ctx = Context::new(ContextConfig::default());
        let id = ctx.register_command(echo_spec()).unwrap();

        let mut msg = CommandMessage::new(id);
        msg.add_param(Param::new(1, ValueTag::String, b"hi\0".to_vec())).unwrap();
        let response = ctx.dispatch(&msg).unwrap();
        assert_eq!(response.data, b"hi\0".to_vec());

        ctx.shutdown().await;
        assert!(!ctx.is_healthy());
        let err = ctx.dispatch(&msg).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn dispatch_is_rejected_once_shutdown_begins() {
        let ctx = Context::new(ContextConfig::default());
        ctx.shutdown().await;
        let msg = CommandMessage::new(1);
        let err = ctx.dispatch(&msg).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn check_permission_records_an_audit_event() {
        let ctx = Context::new(ContextConfig::default());
        ctx.acl().add(polycall_security::AclEntry::new(
            "math.*",
            PermissionMask::EXECUTE,
            IsolationLevel::None,
        ));

        let caller = CallerContext {
            function: "math.add",
            language: 1,
            context: "default",
            permission_mask: PermissionMask::EXECUTE,
            isolation: IsolationLevel::None,
        };
        ctx.check_permission(&caller).unwrap();
        assert_eq!(ctx.audit().len(), 1);
    }

    #[tokio::test]
    async fn issued_token_carries_identity_permissions() {
        let ctx = Context::new(ContextConfig::default());
        let identity = Identity::new("svc", PermissionMask::NETWORK, IsolationLevel::Module);
        let token = ctx.issue_token(&identity);
        assert_eq!(token.permission_mask, PermissionMask::NETWORK);
    }

    #[tokio::test]
    async fn acquire_connection_without_an_opener_fails() {
        let ctx = Context::new(ContextConfig::default());
        let err = ctx.acquire_connection().unwrap_err();
        assert_eq!(err.kind, ErrorKind::OperationFailed);
    }

    #[tokio::test]
    async fn open_stream_tracks_it_for_shutdown() {
        let ctx = Context::new(ContextConfig::default());
        let stream = ctx.open_stream(StreamConfig::default()).unwrap();
        assert_eq!(stream.state(), polycall_stream::StreamState::Open);
        ctx.shutdown().await;
        assert_eq!(stream.state(), polycall_stream::StreamState::Closed);
    }
}
