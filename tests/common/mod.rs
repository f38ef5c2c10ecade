/*!
 * Shared Test Fixtures
 * In-memory protocol family and registry fakes driving the socket core
 */

#![allow(dead_code)]

use parking_lot::Mutex;
use sock_kernel::{
    Accepted, AddressFamily, ConnectProgress, DeviceTable, FamilyTable, MemoryRegistry, NetConfig,
    ProtoFamily, ProtoSocket, Received, ShutdownHow, SockAddr, SockFd, SockType, SocketError,
    SocketManager, SocketRegistry, SocketResult, SyncPort,
};
use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

/// Script for what the fake endpoint's connect reports
#[derive(Clone)]
pub enum ConnectScript {
    Complete,
    InProgress,
    Fail(SocketError),
}

impl Default for ConnectScript {
    fn default() -> Self {
        ConnectScript::Complete
    }
}

/// Observable state of one fake endpoint
#[derive(Default)]
pub struct EndpointState {
    pub port: Mutex<Option<Arc<SyncPort>>>,
    pub connect: Mutex<ConnectScript>,
    pub bound: Mutex<Option<SockAddr>>,
    pub peer: Mutex<Option<SockAddr>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub rx: Mutex<VecDeque<(Vec<u8>, Option<SockAddr>)>>,
    pub pending_accepts: Mutex<VecDeque<SockAddr>>,
    pub accept_children: Mutex<Vec<Arc<EndpointState>>>,
    pub shutdowns: Mutex<Vec<ShutdownHow>>,
    pub closed: Mutex<bool>,
    pub last_setsockopt: Mutex<Option<(i32, i32, Vec<u8>)>>,
    pub next_ephemeral: Mutex<u16>,
}

impl EndpointState {
    pub fn script_connect(&self, script: ConnectScript) {
        *self.connect.lock() = script;
    }

    pub fn push_rx(&self, data: &[u8], from: Option<SockAddr>) {
        self.rx.lock().push_back((data.to_vec(), from));
    }

    pub fn push_pending_accept(&self, peer: SockAddr) {
        self.pending_accepts.lock().push_back(peer);
    }
}

/// Endpoint with every operation implemented over in-memory state
pub struct FakeEndpoint {
    pub state: Arc<EndpointState>,
}

impl ProtoSocket for FakeEndpoint {
    fn attach(&mut self, port: &Arc<SyncPort>) {
        *self.state.port.lock() = Some(Arc::clone(port));
    }

    fn bind(&mut self, addr: &SockAddr) -> SocketResult<()> {
        *self.state.bound.lock() = Some(addr.clone());
        Ok(())
    }

    fn bind_local(&mut self) -> SocketResult<SockAddr> {
        let mut next = self.state.next_ephemeral.lock();
        if *next == 0 {
            *next = 49152;
        }
        let port = *next;
        *next += 1;
        let addr = SockAddr::Inet(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
        *self.state.bound.lock() = Some(addr.clone());
        Ok(addr)
    }

    fn connect(&mut self, addr: &SockAddr, _nonblocking: bool) -> SocketResult<ConnectProgress> {
        match self.state.connect.lock().clone() {
            ConnectScript::Complete => {
                *self.state.peer.lock() = Some(addr.clone());
                Ok(ConnectProgress::Complete)
            }
            ConnectScript::InProgress => {
                *self.state.peer.lock() = Some(addr.clone());
                Ok(ConnectProgress::InProgress)
            }
            ConnectScript::Fail(err) => Err(err),
        }
    }

    fn listen(&mut self, _backlog: i32) -> SocketResult<()> {
        Ok(())
    }

    fn accept(&mut self) -> SocketResult<Accepted> {
        let peer = self
            .state
            .pending_accepts
            .lock()
            .pop_front()
            .ok_or_else(|| SocketError::backend("no pending connections"))?;

        let child = Arc::new(EndpointState::default());
        *child.peer.lock() = Some(peer.clone());
        *child.bound.lock() = self.state.bound.lock().clone();
        self.state.accept_children.lock().push(Arc::clone(&child));

        Ok(Accepted {
            endpoint: Box::new(FakeEndpoint { state: child }),
            peer,
        })
    }

    fn sendmsg(
        &mut self,
        payload: &[u8],
        _dest: Option<&SockAddr>,
        _nonblocking: bool,
    ) -> SocketResult<usize> {
        self.state.sent.lock().push(payload.to_vec());
        Ok(payload.len())
    }

    fn recvmsg(&mut self, buf: &mut [u8], _nonblocking: bool) -> SocketResult<Received> {
        let (data, from) = self
            .state
            .rx
            .lock()
            .pop_front()
            .ok_or_else(|| SocketError::backend("no data queued"))?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(Received { len, from })
    }

    fn shutdown(&mut self, how: ShutdownHow) -> SocketResult<()> {
        self.state.shutdowns.lock().push(how);
        Ok(())
    }

    fn getsockname(&self) -> SocketResult<SockAddr> {
        self.state
            .bound
            .lock()
            .clone()
            .ok_or_else(|| SocketError::invalid_argument("socket has no local address"))
    }

    fn getpeername(&self) -> SocketResult<SockAddr> {
        self.state
            .peer
            .lock()
            .clone()
            .ok_or(SocketError::NotConnected)
    }

    fn getsockopt(&self, level: i32, name: i32, buf: &mut [u8]) -> SocketResult<usize> {
        // One protocol-level option so forwarding is observable
        if level == 6 && name == 1 {
            let bytes = 1u32.to_ne_bytes();
            let n = bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&bytes[..n]);
            return Ok(n);
        }
        Err(SocketError::NoSuchOption(name))
    }

    fn setsockopt(&mut self, level: i32, name: i32, val: &[u8]) -> SocketResult<()> {
        *self.state.last_setsockopt.lock() = Some((level, name, val.to_vec()));
        Ok(())
    }

    fn close(&mut self) -> SocketResult<()> {
        *self.state.closed.lock() = true;
        Ok(())
    }
}

/// Family producing fake endpoints; every endpoint's state is retained
/// so tests can script and inspect it
pub struct FakeFamily {
    family: AddressFamily,
    pub endpoints: Mutex<Vec<Arc<EndpointState>>>,
    pub fail_create: Mutex<Option<SocketError>>,
}

impl FakeFamily {
    pub fn new(family: AddressFamily) -> Self {
        Self {
            family,
            endpoints: Mutex::new(Vec::new()),
            fail_create: Mutex::new(None),
        }
    }

    /// State of the N-th endpoint this family created
    pub fn endpoint(&self, index: usize) -> Arc<EndpointState> {
        Arc::clone(&self.endpoints.lock()[index])
    }
}

impl ProtoFamily for FakeFamily {
    fn family(&self) -> AddressFamily {
        self.family
    }

    fn create(&self, _ty: SockType, _protocol: u32) -> SocketResult<Box<dyn ProtoSocket>> {
        if let Some(err) = self.fail_create.lock().clone() {
            return Err(err);
        }
        let state = Arc::new(EndpointState::default());
        self.endpoints.lock().push(Arc::clone(&state));
        Ok(Box::new(FakeEndpoint { state }))
    }
}

/// Family whose endpoints rely entirely on the trait's default bodies
pub struct MinimalFamily {
    family: AddressFamily,
}

impl MinimalFamily {
    pub fn new(family: AddressFamily) -> Self {
        Self { family }
    }
}

struct MinimalEndpoint;

impl ProtoSocket for MinimalEndpoint {}

impl ProtoFamily for MinimalFamily {
    fn family(&self) -> AddressFamily {
        self.family
    }

    fn create(&self, _ty: SockType, _protocol: u32) -> SocketResult<Box<dyn ProtoSocket>> {
        Ok(Box::new(MinimalEndpoint))
    }
}

/// Registry that rejects every insert; exercises creation rollback
pub struct RejectingRegistry {
    inner: MemoryRegistry,
    pub reject_inserts: Mutex<bool>,
}

impl RejectingRegistry {
    pub fn new() -> Self {
        Self {
            inner: MemoryRegistry::new(),
            reject_inserts: Mutex::new(true),
        }
    }
}

impl SocketRegistry for RejectingRegistry {
    fn contains(&self, fd: SockFd) -> bool {
        self.inner.contains(fd)
    }

    fn insert(&self, fd: SockFd) -> SocketResult<()> {
        if *self.reject_inserts.lock() {
            return Err(SocketError::backend("registry full"));
        }
        self.inner.insert(fd)
    }

    fn remove(&self, fd: SockFd) -> SocketResult<()> {
        self.inner.remove(fd)
    }

    fn reserve_address(&self, fd: SockFd, addr: &SockAddr) -> SocketResult<()> {
        self.inner.reserve_address(fd, addr)
    }

    fn record_address(&self, fd: SockFd, addr: &SockAddr) {
        self.inner.record_address(fd, addr)
    }

    fn release_address(&self, fd: SockFd) {
        self.inner.release_address(fd)
    }
}

/// A manager wired to fakes: stream + datagram fake families, in-memory
/// registry, empty device table
pub struct Harness {
    pub manager: SocketManager,
    pub stream: Arc<FakeFamily>,
    pub dgram: Arc<FakeFamily>,
    pub devices: Arc<DeviceTable>,
}

pub fn harness() -> Harness {
    harness_with_config(NetConfig::default())
}

pub fn harness_with_config(config: NetConfig) -> Harness {
    let stream = Arc::new(FakeFamily::new(AddressFamily::Inet));
    let dgram = Arc::new(FakeFamily::new(AddressFamily::Inet));

    let families = Arc::new(FamilyTable::new());
    families.register(SockType::Stream, Arc::clone(&stream) as Arc<dyn ProtoFamily>);
    families.register(SockType::Datagram, Arc::clone(&dgram) as Arc<dyn ProtoFamily>);

    let devices = Arc::new(DeviceTable::new());
    let manager = SocketManager::with_config(
        Arc::new(MemoryRegistry::new()),
        families,
        Arc::clone(&devices) as Arc<dyn sock_kernel::DeviceResolver>,
        config,
    );

    Harness {
        manager,
        stream,
        dgram,
        devices,
    }
}

pub fn inet_addr(port: u16) -> SockAddr {
    SockAddr::Inet(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}
