//! Socket Server
//!
//! Request handlers for sockets, plus the readiness dispatch that connects the
//! polling loop to socket records.
//!
//! ## Requests
//!
//! | Request | Handler |
//! |---|---|
//! | create socket | [`SocketServer::create_socket`] |
//! | accept socket | [`SocketServer::accept_socket`] |
//! | set socket event | [`SocketServer::set_socket_event`] |
//! | get socket event | [`SocketServer::get_socket_event`] |
//! | enable socket event | [`SocketServer::enable_socket_event`] |
//! | get file info | [`SocketServer::get_file_info`] |
//!
//! Every handler taking a socket handle requires read, write and synchronize access.
//!
//! ## Dispatch
//!
//! [`SocketServer::dispatch`] runs one sweep of the polling loop and feeds each
//! readiness report to the socket that owns the descriptor. The server only keeps
//! weak references to sockets, so a report for a socket whose last handle was closed
//! is dropped and the descriptor unregistered.

use crate::config::ServerConfig;
use crate::descriptor::{ReleaseList, ServerSocket};
use crate::error::ServerError;
use crate::event::Event;
use crate::handles::{AccessRights, Handle, HandleTable, Object, SharedSocket};
use adapters_check_io::CheckIo;
use adapters_socket::NativeSocket;
use entities_socket_events::{CreateFlags, EventSet, NetError, StateFlags};
use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use usecases_socket_events::{
    FileInfo, ServiceQuery, SharedEvent, SocketDescriptor, SocketEventInfo, SocketRecord,
};

/// Create socket request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSocketRequest {
    /// Address family
    pub family: i32,
    /// Socket type
    pub ty: i32,
    /// Protocol, `0` for the default
    pub protocol: i32,
    /// Creation flags
    pub flags: CreateFlags,
    /// Access rights of the new handle
    pub access: AccessRights,
    /// Inherited by child processes
    pub inherit: bool,
}

/// Accept socket request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptSocketRequest {
    /// Listening socket
    pub listener: Handle,
    /// Access rights of the new handle
    pub access: AccessRights,
    /// Inherited by child processes
    pub inherit: bool,
}

/// Get socket event request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSocketEventRequest {
    /// Socket
    pub handle: Handle,
    /// Service-mode query: clear the pending set after reporting it
    pub service: bool,
    /// Event the service monitor signals on
    pub signal_event: Option<Handle>,
    /// Event reset when the pending set is cleared
    pub companion_event: Option<Handle>,
    /// Number of error entries the client can receive
    pub capacity: usize,
}

/// Socket request server for one client process
pub struct SocketServer {
    config: ServerConfig,
    check_io: CheckIo,
    handles: HandleTable,
    sockets: HashMap<RawFd, Weak<RefCell<SocketRecord<ServerSocket>>>>,
    released: ReleaseList,
}

impl SocketServer {
    /// Create a server with default configuration
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a server with custom configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            check_io: CheckIo::with_config(config.check_io),
            handles: HandleTable::new(config.max_handles),
            sockets: HashMap::new(),
            released: ReleaseList::default(),
        }
    }

    /// Open a new socket
    ///
    /// # Returns
    ///
    /// * `Ok(Handle)` - Handle to the new socket
    /// * `Err(ServerError)` - The OS refused the socket, or the handle table is full;
    ///   no object is created
    pub fn create_socket(&mut self, request: &CreateSocketRequest) -> Result<Handle, ServerError> {
        self.unregister_released();
        let native = NativeSocket::open(request.family, request.ty, request.protocol)?;
        let connectionless = native.is_connectionless();
        let socket = ServerSocket::new(native, self.released.clone());
        let record = SocketRecord::create(
            socket,
            connectionless,
            request.flags,
            self.config.socket,
            &mut self.check_io,
        );
        self.install(record, request.access, request.inherit)
    }

    /// Accept a connection on a listening socket
    ///
    /// # Returns
    ///
    /// * `Ok(Handle)` - Handle to the connected socket
    /// * `Err(ServerError)` - Lookup or accept failed; the listener is untouched
    pub fn accept_socket(&mut self, request: &AcceptSocketRequest) -> Result<Handle, ServerError> {
        let listener = self.handles.socket(request.listener, AccessRights::SOCKET)?;
        self.unregister_released();
        let accepted = listener.borrow_mut().accept(&mut self.check_io)?;
        self.install(accepted, request.access, request.inherit)
    }

    /// Replace a socket's subscription
    ///
    /// # Arguments
    ///
    /// * `handle` - Socket
    /// * `mask` - Kinds to be notified about
    /// * `event` - Subscriber event, needs modify-state access; `None` for no event
    pub fn set_socket_event(
        &mut self,
        handle: Handle,
        mask: EventSet,
        event: Option<Handle>,
    ) -> Result<(), ServerError> {
        let socket = self.handles.socket(handle, AccessRights::SOCKET)?;
        let event = event
            .map(|event| self.handles.event(event, AccessRights::EVENT_MODIFY_STATE))
            .transpose()?
            .map(|event| event as SharedEvent);
        socket
            .borrow_mut()
            .set_subscription(mask, event, &mut self.check_io);
        Ok(())
    }

    /// Report a socket's event state
    ///
    /// A handle that is not an accessible socket reports `NotSocket` and an empty
    /// state. In service mode the pending set is cleared after the snapshot is taken,
    /// unless the signal event is the socket's subscriber event.
    ///
    /// # Returns
    ///
    /// The snapshot, and the request status
    pub fn get_socket_event(
        &mut self,
        request: &GetSocketEventRequest,
    ) -> (SocketEventInfo, Result<(), ServerError>) {
        let socket = match self.handles.socket(request.handle, AccessRights::SOCKET) {
            Ok(socket) => socket,
            Err(error) => {
                trace!(handle = request.handle.raw(), %error, "get socket event on non-socket");
                return (empty_info(), Err(NetError::NotSocket.into()));
            }
        };

        if !request.service {
            let info = socket.borrow().event_info(request.capacity);
            return (info, Ok(()));
        }

        let info = socket.borrow().event_info(request.capacity);
        let service = match self.service_query(request) {
            Ok(service) => service,
            Err(error) => return (info, Err(error)),
        };
        let outcome = socket
            .borrow_mut()
            .service_clear(&service, &mut self.check_io)
            .map_err(ServerError::from);
        (info, outcome)
    }

    fn service_query(&self, request: &GetSocketEventRequest) -> Result<ServiceQuery, ServerError> {
        let signal_event = request
            .signal_event
            .map(|event| self.handles.event(event, AccessRights::empty()))
            .transpose()?
            .map(|event| event as SharedEvent);
        let companion_event = request
            .companion_event
            .map(|event| self.handles.event(event, AccessRights::EVENT_MODIFY_STATE))
            .transpose()?
            .map(|event| event as SharedEvent);
        Ok(ServiceQuery {
            signal_event,
            companion_event,
        })
    }

    /// Acknowledge kinds and adjust state bits
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Applied
    /// * `Err(ServerError)` - Lookup failed, or the adjustment would leave the socket
    ///   both connecting and listening (`InvalidArgument`, nothing changed)
    pub fn enable_socket_event(
        &mut self,
        handle: Handle,
        ack: EventSet,
        set: StateFlags,
        clear: StateFlags,
    ) -> Result<(), ServerError> {
        let socket = self.handles.socket(handle, AccessRights::SOCKET)?;
        socket
            .borrow_mut()
            .enable(ack, set, clear, &mut self.check_io)?;
        Ok(())
    }

    /// File information for a socket handle
    pub fn get_file_info(&self, handle: Handle) -> Result<FileInfo, ServerError> {
        let socket = self.handles.socket(handle, AccessRights::empty())?;
        let info = socket.borrow().file_info();
        Ok(info)
    }

    /// `true` when a wait on the socket object would be satisfied now
    pub fn socket_signaled(&self, handle: Handle) -> Result<bool, ServerError> {
        let socket = self.handles.socket(handle, AccessRights::SYNCHRONIZE)?;
        let signaled = socket.borrow().is_signaled();
        Ok(signaled)
    }

    /// Queue an event woken after every readiness report on the socket
    pub fn add_socket_waiter(&mut self, handle: Handle, waiter: Handle) -> Result<(), ServerError> {
        let socket = self.handles.socket(handle, AccessRights::SYNCHRONIZE)?;
        let waiter = self.handles.event(waiter, AccessRights::EVENT_MODIFY_STATE)?;
        socket.borrow_mut().add_waiter(waiter);
        Ok(())
    }

    /// Remove a queued waiter
    ///
    /// # Returns
    ///
    /// `true` if the waiter was queued
    pub fn remove_socket_waiter(&mut self, handle: Handle, waiter: Handle) -> Result<bool, ServerError> {
        let socket = self.handles.socket(handle, AccessRights::SYNCHRONIZE)?;
        let waiter: SharedEvent = self.handles.event(waiter, AccessRights::empty())?;
        let removed = socket.borrow_mut().remove_waiter(&waiter);
        Ok(removed)
    }

    /// Create an event object
    pub fn create_event(
        &mut self,
        initial_state: bool,
        access: AccessRights,
    ) -> Result<Handle, ServerError> {
        let event = Arc::new(Event::new(initial_state));
        self.handles.alloc(Object::Event(event), access, false)
    }

    /// Look up an event object
    pub fn event(&self, handle: Handle) -> Result<Arc<Event>, ServerError> {
        self.handles.event(handle, AccessRights::SYNCHRONIZE)
    }

    /// Look up a socket, for the client-side calls (bind, listen, connect) made on the
    /// native descriptor
    pub fn socket(&self, handle: Handle) -> Result<SharedSocket, ServerError> {
        self.handles.socket(handle, AccessRights::SOCKET)
    }

    /// Open a second handle to an object
    pub fn duplicate_handle(
        &mut self,
        handle: Handle,
        access: Option<AccessRights>,
    ) -> Result<Handle, ServerError> {
        self.handles.duplicate(handle, access)
    }

    /// Close a handle; closing the last reference to a socket destroys it
    pub fn close_handle(&mut self, handle: Handle) -> Result<(), ServerError> {
        let object = self.handles.close(handle)?;
        drop(object);
        self.unregister_released();
        Ok(())
    }

    /// Run one sweep of the polling loop
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait for readiness (`None` = wait indefinitely)
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of readiness reports delivered to sockets
    /// * `Err(ServerError)` - The polling loop failed
    pub fn dispatch(&mut self, timeout: Option<Duration>) -> Result<usize, ServerError> {
        self.unregister_released();
        let events = self
            .check_io
            .check(timeout)
            .map_err(|error| ServerError::Net(error.into()))?;

        let mut delivered = 0;
        for event in events {
            let owner = self.sockets.get(&event.fd).and_then(Weak::upgrade);
            match owner {
                Some(socket) => {
                    socket
                        .borrow_mut()
                        .poll_event(event.readiness, &mut self.check_io);
                    delivered += 1;
                }
                None => {
                    trace!(fd = event.fd, "readiness for destroyed socket");
                    self.sockets.remove(&event.fd);
                    self.check_io.remove_user(event.fd);
                }
            }
        }
        Ok(delivered)
    }

    /// The polling loop
    pub fn check_io(&self) -> &CheckIo {
        &self.check_io
    }

    /// Number of open handles
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    fn install(
        &mut self,
        record: SocketRecord<ServerSocket>,
        access: AccessRights,
        inherit: bool,
    ) -> Result<Handle, ServerError> {
        let fd = record.descriptor().raw_fd();
        let socket = Rc::new(RefCell::new(record));
        match self
            .handles
            .alloc(Object::Socket(socket.clone()), access, inherit)
        {
            Ok(handle) => {
                self.sockets.insert(fd, Rc::downgrade(&socket));
                debug!(fd, handle = handle.raw(), "socket handle allocated");
                Ok(handle)
            }
            Err(error) => {
                drop(socket);
                self.unregister_released();
                Err(error)
            }
        }
    }

    /// Forget the descriptors of every socket destroyed since the last call
    ///
    /// A record may outlive its last handle through a clone from [`Self::socket`];
    /// its descriptor is unregistered once that clone goes too.
    fn unregister_released(&mut self) {
        let released: Vec<RawFd> = self.released.borrow_mut().drain(..).collect();
        for fd in released {
            self.check_io.remove_user(fd);
            let dead = self
                .sockets
                .get(&fd)
                .is_some_and(|socket| socket.strong_count() == 0);
            if dead {
                self.sockets.remove(&fd);
            }
            debug!(fd, "socket destroyed");
        }
    }
}

impl Default for SocketServer {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_info() -> SocketEventInfo {
    SocketEventInfo {
        mask: EventSet::empty(),
        pending: EventSet::empty(),
        state: StateFlags::empty(),
        errors: Vec::new(),
    }
}
