//! Handle Table
//!
//! Maps handles to objects and the access rights each handle was opened with. Socket
//! objects are reference-counted through `Rc`: every handle holds one reference, and
//! closing the last handle destroys the socket.
//!
//! Handle values are multiples of four and never zero; zero means "no handle" on the
//! wire.

use crate::descriptor::ServerSocket;
use crate::error::ServerError;
use crate::event::Event;
use bitflags::bitflags;
use entities_socket_events::NetError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::trace;
use usecases_socket_events::SocketRecord;

/// Socket record shared between the handles that refer to it
pub type SharedSocket = Rc<RefCell<SocketRecord<ServerSocket>>>;

bitflags! {
    /// Access rights attached to a handle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessRights: u32 {
        /// Change an event's state
        const EVENT_MODIFY_STATE = 0x0000_0002;
        /// Wait on the object
        const SYNCHRONIZE = 0x0010_0000;
        const GENERIC_WRITE = 0x4000_0000;
        const GENERIC_READ = 0x8000_0000;
    }
}

impl AccessRights {
    /// Rights every socket request checks
    pub const SOCKET: AccessRights = AccessRights::GENERIC_READ
        .union(AccessRights::GENERIC_WRITE)
        .union(AccessRights::SYNCHRONIZE);
}

/// Handle value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Wrap a raw handle value
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Object behind a handle
#[derive(Clone)]
pub enum Object {
    /// Socket
    Socket(SharedSocket),
    /// Event
    Event(Arc<Event>),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Object::Socket(_) => "socket",
            Object::Event(_) => "event",
        }
    }
}

struct Entry {
    object: Object,
    access: AccessRights,
    inherit: bool,
}

/// Per-process handle table
pub struct HandleTable {
    entries: BTreeMap<u32, Entry>,
    max_handles: usize,
}

impl HandleTable {
    /// Create an empty table
    ///
    /// # Arguments
    ///
    /// * `max_handles` - Open handles allowed at once
    pub fn new(max_handles: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_handles,
        }
    }

    /// Open a handle to an object
    ///
    /// # Returns
    ///
    /// * `Ok(Handle)` - Lowest free handle value
    /// * `Err(ServerError)` - The table is full
    pub fn alloc(
        &mut self,
        object: Object,
        access: AccessRights,
        inherit: bool,
    ) -> Result<Handle, ServerError> {
        if self.entries.len() >= self.max_handles {
            return Err(NetError::TooManyOpenFiles.into());
        }
        let raw = (1..)
            .map(|index: u32| index << 2)
            .find(|raw| !self.entries.contains_key(raw))
            .ok_or(ServerError::Net(NetError::TooManyOpenFiles))?;
        trace!(handle = raw, kind = object.kind(), "alloc handle");
        self.entries.insert(
            raw,
            Entry {
                object,
                access,
                inherit,
            },
        );
        Ok(Handle(raw))
    }

    /// Look up an object, checking access rights
    pub fn get(&self, handle: Handle, required: AccessRights) -> Result<&Object, ServerError> {
        let entry = self
            .entries
            .get(&handle.0)
            .ok_or(ServerError::InvalidHandle(handle.0))?;
        if !entry.access.contains(required) {
            return Err(ServerError::AccessDenied);
        }
        Ok(&entry.object)
    }

    /// Look up a socket
    pub fn socket(&self, handle: Handle, required: AccessRights) -> Result<SharedSocket, ServerError> {
        match self.get(handle, required)? {
            Object::Socket(socket) => Ok(socket.clone()),
            _ => Err(ServerError::ObjectTypeMismatch),
        }
    }

    /// Look up an event
    pub fn event(&self, handle: Handle, required: AccessRights) -> Result<Arc<Event>, ServerError> {
        match self.get(handle, required)? {
            Object::Event(event) => Ok(event.clone()),
            _ => Err(ServerError::ObjectTypeMismatch),
        }
    }

    /// Open a second handle to the same object
    ///
    /// # Arguments
    ///
    /// * `handle` - Source handle
    /// * `access` - Rights for the new handle; `None` copies the source's
    pub fn duplicate(
        &mut self,
        handle: Handle,
        access: Option<AccessRights>,
    ) -> Result<Handle, ServerError> {
        let entry = self
            .entries
            .get(&handle.0)
            .ok_or(ServerError::InvalidHandle(handle.0))?;
        let object = entry.object.clone();
        let access = access.unwrap_or(entry.access);
        let inherit = entry.inherit;
        self.alloc(object, access, inherit)
    }

    /// Close a handle
    ///
    /// # Returns
    ///
    /// The object the handle referred to; dropping it releases the reference
    pub fn close(&mut self, handle: Handle) -> Result<Object, ServerError> {
        let entry = self
            .entries
            .remove(&handle.0)
            .ok_or(ServerError::InvalidHandle(handle.0))?;
        trace!(handle = handle.0, kind = entry.object.kind(), "close handle");
        Ok(entry.object)
    }

    #[cfg(test)]
    fn is_inheritable(&self, handle: Handle) -> Result<bool, ServerError> {
        self.entries
            .get(&handle.0)
            .map(|entry| entry.inherit)
            .ok_or(ServerError::InvalidHandle(handle.0))
    }

    /// Number of open handles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no handle is open
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
