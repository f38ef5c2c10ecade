/*!
 * Socket Option Tests
 * Byte-exact get/set through the manager, forwarding, device binding
 */

mod common;

use common::{harness, inet_addr};
use pretty_assertions::assert_eq;
use sock_kernel::net::socket::options::{
    SOL_SOCKET, SO_ACCEPTCONN, SO_BINDTODEVICE, SO_BROADCAST, SO_DOMAIN, SO_DONTROUTE, SO_ERROR,
    SO_LINGER, SO_OOBINLINE, SO_PROTOCOL, SO_RCVBUF, SO_RCVLOWAT, SO_RCVTIMEO, SO_SNDBUF,
    SO_SNDLOWAT, SO_SNDTIMEO, SO_TYPE,
};
use sock_kernel::{
    AddressFamily, Linger, NetDevice, SockFd, SockType, SocketError, SocketManager, TimeVal,
};

fn stream_socket(h: &common::Harness) -> SockFd {
    h.manager
        .create(AddressFamily::Inet, SockType::Stream, 0)
        .unwrap()
}

fn get_u32(manager: &SocketManager, fd: SockFd, name: i32) -> u32 {
    let mut buf = [0u8; 4];
    let len = manager.getsockopt(fd, SOL_SOCKET, name, &mut buf).unwrap();
    assert_eq!(len, 4);
    u32::from_ne_bytes(buf)
}

#[test]
fn test_writable_u32_options_round_trip() {
    let h = harness();
    let fd = stream_socket(&h);

    for name in [
        SO_BROADCAST,
        SO_DONTROUTE,
        SO_OOBINLINE,
        SO_RCVBUF,
        SO_RCVLOWAT,
        SO_SNDBUF,
        SO_SNDLOWAT,
    ] {
        let value = 0x2A00u32 | name as u32;
        h.manager
            .setsockopt(fd, SOL_SOCKET, name, &value.to_ne_bytes())
            .unwrap();
        assert_eq!(get_u32(&h.manager, fd, name), value);
    }
}

#[test]
fn test_identity_options_report_creation_values() {
    let h = harness();
    let fd = h
        .manager
        .create(AddressFamily::Inet, SockType::Stream, 6)
        .unwrap();

    assert_eq!(get_u32(&h.manager, fd, SO_DOMAIN), 2);
    assert_eq!(get_u32(&h.manager, fd, SO_TYPE), 1);
    assert_eq!(get_u32(&h.manager, fd, SO_PROTOCOL), 6);
}

#[test]
fn test_read_only_options_reject_writes() {
    let h = harness();
    let fd = stream_socket(&h);

    for name in [SO_ACCEPTCONN, SO_DOMAIN, SO_ERROR, SO_PROTOCOL, SO_TYPE] {
        let err = h
            .manager
            .setsockopt(fd, SOL_SOCKET, name, &0u32.to_ne_bytes())
            .unwrap_err();
        assert!(matches!(err, SocketError::InvalidArgument(_)));
    }
}

#[test]
fn test_acceptconn_reflects_listen() {
    let h = harness();
    let fd = stream_socket(&h);
    assert_eq!(get_u32(&h.manager, fd, SO_ACCEPTCONN), 0);

    h.manager.bind(fd, inet_addr(8080)).unwrap();
    h.manager.listen(fd, 1).unwrap();
    assert_eq!(get_u32(&h.manager, fd, SO_ACCEPTCONN), 1);
}

#[test]
fn test_so_error_latch_clears_on_read() {
    let h = harness();
    let fd = stream_socket(&h);

    h.manager.latch_error(fd, 111).unwrap();
    assert_eq!(get_u32(&h.manager, fd, SO_ERROR), 111);
    assert_eq!(get_u32(&h.manager, fd, SO_ERROR), 0);
}

#[test]
fn test_set_size_mismatch_leaves_option_unchanged() {
    let h = harness();
    let fd = stream_socket(&h);

    h.manager
        .setsockopt(fd, SOL_SOCKET, SO_RCVBUF, &4096u32.to_ne_bytes())
        .unwrap();

    let err = h
        .manager
        .setsockopt(fd, SOL_SOCKET, SO_RCVBUF, &[0u8; 8])
        .unwrap_err();
    assert_eq!(
        err,
        SocketError::SizeMismatch {
            got: 8,
            expected: 4
        }
    );
    assert_eq!(get_u32(&h.manager, fd, SO_RCVBUF), 4096);
}

#[test]
fn test_get_copies_at_most_field_size() {
    let h = harness();
    let fd = stream_socket(&h);

    let mut big = [0xFFu8; 16];
    let len = h
        .manager
        .getsockopt(fd, SOL_SOCKET, SO_SNDBUF, &mut big)
        .unwrap();
    assert_eq!(len, 4);
    // Bytes past the field are untouched.
    assert_eq!(&big[4..], &[0xFFu8; 12]);
}

#[test]
fn test_linger_round_trip() {
    let h = harness();
    let fd = stream_socket(&h);

    let linger = Linger { onoff: 1, linger: 30 };
    h.manager
        .setsockopt(fd, SOL_SOCKET, SO_LINGER, &linger.to_bytes())
        .unwrap();

    let mut buf = [0u8; Linger::SIZE];
    let len = h
        .manager
        .getsockopt(fd, SOL_SOCKET, SO_LINGER, &mut buf)
        .unwrap();
    assert_eq!(len, Linger::SIZE);
    assert_eq!(Linger::from_bytes(&buf), linger);
}

#[test]
fn test_timeouts_round_trip_and_reject_oversize() {
    let h = harness();
    let fd = stream_socket(&h);

    let tv = TimeVal::from_millis(1500);
    for name in [SO_RCVTIMEO, SO_SNDTIMEO] {
        h.manager
            .setsockopt(fd, SOL_SOCKET, name, &tv.to_bytes())
            .unwrap();

        let mut buf = [0u8; TimeVal::SIZE];
        let len = h.manager.getsockopt(fd, SOL_SOCKET, name, &mut buf).unwrap();
        assert_eq!(len, TimeVal::SIZE);
        assert_eq!(TimeVal::from_bytes(&buf), tv);

        // Larger-than-field requests are refused in both directions.
        let mut big = [0u8; 16];
        assert!(matches!(
            h.manager.getsockopt(fd, SOL_SOCKET, name, &mut big),
            Err(SocketError::SizeMismatch { .. })
        ));
        assert!(matches!(
            h.manager.setsockopt(fd, SOL_SOCKET, name, &big),
            Err(SocketError::SizeMismatch { .. })
        ));
    }
}

#[test]
fn test_unknown_option_name() {
    let h = harness();
    let fd = stream_socket(&h);

    let mut buf = [0u8; 4];
    assert_eq!(
        h.manager
            .getsockopt(fd, SOL_SOCKET, 12345, &mut buf)
            .unwrap_err(),
        SocketError::NoSuchOption(12345)
    );
    assert_eq!(
        h.manager
            .setsockopt(fd, SOL_SOCKET, 12345, &buf)
            .unwrap_err(),
        SocketError::NoSuchOption(12345)
    );
}

#[test]
fn test_bind_to_device() {
    let h = harness();
    let fd = stream_socket(&h);

    let err = h
        .manager
        .setsockopt(fd, SOL_SOCKET, SO_BINDTODEVICE, b"eth0")
        .unwrap_err();
    assert_eq!(err, SocketError::NoSuchDevice("eth0".into()));

    h.devices.register(NetDevice::new("eth0", 1, 1500));
    h.manager
        .setsockopt(fd, SOL_SOCKET, SO_BINDTODEVICE, b"eth0")
        .unwrap();

    let mut buf = [0u8; 16];
    let len = h
        .manager
        .getsockopt(fd, SOL_SOCKET, SO_BINDTODEVICE, &mut buf)
        .unwrap();
    assert_eq!(&buf[..len], b"eth0");
}

#[test]
fn test_non_socket_level_forwards_to_protocol() {
    let h = harness();
    let fd = stream_socket(&h);

    // The fake endpoint serves (level 6, name 1).
    let mut buf = [0u8; 4];
    let len = h.manager.getsockopt(fd, 6, 1, &mut buf).unwrap();
    assert_eq!(len, 4);
    assert_eq!(u32::from_ne_bytes(buf), 1);

    h.manager.setsockopt(fd, 6, 1, &1u32.to_ne_bytes()).unwrap();
    let recorded = h.stream.endpoint(0).last_setsockopt.lock().clone();
    assert_eq!(recorded, Some((6, 1, 1u32.to_ne_bytes().to_vec())));
}

#[test]
fn test_forwarding_without_protocol_support() {
    use common::MinimalFamily;
    use sock_kernel::{DeviceTable, FamilyTable, MemoryRegistry, ProtoFamily};
    use std::sync::Arc;

    let families = Arc::new(FamilyTable::new());
    families.register(
        SockType::Stream,
        Arc::new(MinimalFamily::new(AddressFamily::Inet)) as Arc<dyn ProtoFamily>,
    );
    let manager = SocketManager::new(
        Arc::new(MemoryRegistry::new()),
        families,
        Arc::new(DeviceTable::new()),
    );
    let fd = manager
        .create(AddressFamily::Inet, SockType::Stream, 0)
        .unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(
        manager.getsockopt(fd, 6, 1, &mut buf).unwrap_err(),
        SocketError::OperationNotSupported
    );
    assert_eq!(
        manager.setsockopt(fd, 6, 1, &buf).unwrap_err(),
        SocketError::OperationNotSupported
    );
}
