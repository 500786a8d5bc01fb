use std::time::Duration;

use vedette::net::socket::TcpSocket;
use vedette::net::IoStatus;

#[test]
fn test_new_socket_is_idle() {
    let socket = TcpSocket::new();

    assert_eq!(socket.descriptor(), -1);
    assert!(!socket.is_listening());
    assert!(!socket.is_connected());
}

#[test]
fn test_listen_records_bound_address() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();

    assert!(listener.is_listening());
    assert!(listener.descriptor() >= 0);
    assert_eq!(listener.host(), "127.0.0.1");
    let port: u16 = listener.service().parse().unwrap();
    assert!(port > 0);
}

#[test]
fn test_listen_rejects_non_numeric_service() {
    let mut listener = TcpSocket::new();

    assert!(listener.listen("not-a-port", "127.0.0.1").is_err());
    assert!(!listener.is_listening());
}

#[test]
fn test_close_resets_state() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    listener.close();

    assert_eq!(listener.descriptor(), -1);
    assert!(!listener.is_listening());
    assert!(listener.host().is_empty());
    assert!(listener.service().is_empty());
}

#[test]
fn test_connect_and_accept() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    assert!(client.is_connected());
    assert_eq!(client.host(), "127.0.0.1");

    let accepted = listener.accept().expect("pending connection");
    assert!(accepted.is_connected());
    assert!(!accepted.is_listening());
    assert_eq!(accepted.host(), "127.0.0.1");
    assert!(accepted.is_good());
}

#[test]
fn test_accept_requires_listening_socket() {
    let socket = TcpSocket::new();

    assert!(socket.accept().is_none());
}

#[test]
fn test_connect_to_closed_port_fails() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();
    listener.close();

    let mut client = TcpSocket::new();
    assert!(client.connect(&service, "127.0.0.1").is_err());
}

#[test]
fn test_accepted_socket_starts_blocking() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    let accepted = listener.accept().unwrap();

    assert!(accepted.is_blocking());
    accepted.unblock().unwrap();
    assert!(!accepted.is_blocking());
    accepted.block().unwrap();
    assert!(accepted.is_blocking());
}

#[test]
fn test_receive_requires_nonblocking_mode() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    let accepted = listener.accept().unwrap();

    let mut payload = Vec::new();
    assert_eq!(accepted.receive(&mut payload, 0), IoStatus::SocketFlags);
}

#[test]
fn test_receive_requires_connected_socket() {
    let socket = TcpSocket::new();

    let mut payload = Vec::new();
    assert_eq!(socket.receive(&mut payload, 0), IoStatus::NotConnected);
    assert_eq!(socket.send(&mut payload, 0), IoStatus::NotConnected);
}

#[test]
fn test_send_and_receive_round_trip() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    let accepted = listener.accept().unwrap();
    client.unblock().unwrap();
    accepted.unblock().unwrap();

    let mut outgoing = b"ping".to_vec();
    assert_eq!(client.send(&mut outgoing, 0), IoStatus::Success);
    assert!(outgoing.is_empty());

    let mut incoming = Vec::new();
    let mut status = IoStatus::Blocked;
    for _ in 0..200 {
        status = accepted.receive(&mut incoming, 0);
        if status == IoStatus::Success {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(status, IoStatus::Success);
    assert_eq!(incoming, b"ping");
}

#[test]
fn test_receive_reports_blocked_when_no_data() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    let accepted = listener.accept().unwrap();
    accepted.unblock().unwrap();

    let mut payload = Vec::new();
    assert_eq!(accepted.receive(&mut payload, 0), IoStatus::Blocked);
    drop(client);
}

#[test]
fn test_receive_reports_disconnect() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    let accepted = listener.accept().unwrap();
    accepted.unblock().unwrap();
    client.close();

    let mut payload = Vec::new();
    let mut status = IoStatus::Blocked;
    for _ in 0..200 {
        status = accepted.receive(&mut payload, 0);
        if status != IoStatus::Blocked {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(status, IoStatus::Disconnect);
}

#[test]
fn test_wait_receive_sees_pending_data() {
    let mut listener = TcpSocket::new();
    listener.listen("0", "127.0.0.1").unwrap();
    let service = listener.service().to_string();

    let mut client = TcpSocket::new();
    client.connect(&service, "127.0.0.1").unwrap();
    let accepted = listener.accept().unwrap();
    client.unblock().unwrap();

    assert!(!accepted.wait_receive(0));

    let mut outgoing = b"x".to_vec();
    client.send(&mut outgoing, 0);
    assert!(accepted.wait_receive(1000));
}
