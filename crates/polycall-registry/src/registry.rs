use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::descriptor::{CommandDescriptor, CommandSpec};
use crate::error::RegistryError;
use crate::message::{CommandMessage, CommandResponse};

struct Inner {
    by_id: HashMap<u32, Arc<CommandDescriptor>>,
    by_name: HashMap<String, u32>,
    next_id: u32,
    /// One single-flight lock per descriptor whose `flags.serialize` is set
    /// (`spec.md` §5: "invocations of the same command are serialized only
    /// if the command's flags request it").
    serialize_locks: HashMap<u32, Arc<Mutex<()>>>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
            serialize_locks: HashMap::new(),
        }
    }
}

/// Command id↔name table with validated, concurrency-aware dispatch
/// (`spec.md` §4.3). Holds its own lock, per the "no global lock" rule in
/// §5; descriptors are reference-counted so `dispatch` can release the
/// registry lock before invoking a (possibly slow) handler, and an
/// in-flight call keeps its own `Arc` alive even if `unregister` removes
/// the command from the table mid-flight.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, assigning the next free id if `spec.id == 0`.
    /// Rejects a duplicate name or an explicit id that's already taken.
    pub fn register(&self, spec: CommandSpec) -> Result<u32, RegistryError> {
        let mut inner = self.inner.lock();

        if inner.by_name.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateCommand);
        }

        let id = if spec.id == 0 {
            let mut candidate = inner.next_id;
            while inner.by_id.contains_key(&candidate) {
                candidate = candidate.wrapping_add(1).max(1);
            }
            inner.next_id = candidate.wrapping_add(1).max(1);
            candidate
        } else {
            if inner.by_id.contains_key(&spec.id) {
                return Err(RegistryError::DuplicateCommand);
            }
            spec.id
        };

        if spec.flags.serialize {
            inner.serialize_locks.insert(id, Arc::new(Mutex::new(())));
        }

        let descriptor = Arc::new(CommandDescriptor {
            id,
            name: spec.name.clone(),
            handler: spec.handler,
            validator: spec.validator,
            permission_mask: spec.permission_mask,
            flags: spec.flags,
            param_types: spec.param_types,
        });

        inner.by_id.insert(id, descriptor);
        inner.by_name.insert(spec.name, id);
        tracing::debug!(command_id = id, "registered command");
        Ok(id)
    }

    /// Id-based, idempotent unregister. A command with in-flight dispatches
    /// keeps running: those callers hold their own `Arc` clone of the
    /// descriptor, they just won't be resolved by future `dispatch` calls.
    pub fn unregister(&self, id: u32) {
        let mut inner = self.inner.lock();
        if let Some(descriptor) = inner.by_id.remove(&id) {
            inner.by_name.remove(&descriptor.name);
            inner.serialize_locks.remove(&id);
            tracing::debug!(command_id = id, "unregistered command");
        }
    }

    pub fn lookup_id(&self, name: &str) -> Option<u32> {
        self.inner.lock().by_name.get(name).copied()
    }

    /// Resolves `message.command_id`, runs its validator then handler, and
    /// returns the synthesized response (`spec.md` §4.3).
    pub fn dispatch(&self, message: &CommandMessage) -> Result<CommandResponse, RegistryError> {
        let (descriptor, serialize_lock) = {
            let inner = self.inner.lock();
            let descriptor = inner
                .by_id
                .get(&message.command_id)
                .cloned()
                .ok_or(RegistryError::UnknownCommand { command_id: message.command_id })?;
            let lock = inner.serialize_locks.get(&descriptor.id).cloned();
            (descriptor, lock)
        };

        if let Some(lock) = serialize_lock {
            let _guard = lock.lock();
            Ok(descriptor.invoke(message))
        } else {
            Ok(descriptor.invoke(message))
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
