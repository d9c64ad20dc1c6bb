//! Integration tests for the QUIC `dial`/`listen`/`Conn`/`Stream` substrate.

use quantarax_transport::{dial, listen};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn roundtrip_over_a_single_stream() {
    let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let conn = listener.accept().await.unwrap();
        let mut stream = conn.accept_stream().await.unwrap();
        let mut buf = vec![0u8; 64];
        let n = stream.read(&mut buf).await.unwrap().unwrap();
        assert_eq!(&buf[..n], b"hello from receiver");
        stream.write(b"ack").await.unwrap();
        stream.close().await.unwrap();
    });

    let conn = dial(addr).await.unwrap();
    let mut stream = conn.open_stream().await.unwrap();
    stream.write(b"hello from receiver").await.unwrap();

    let mut buf = vec![0u8; 64];
    let n = stream.read(&mut buf).await.unwrap().unwrap();
    assert_eq!(&buf[..n], b"ack");
    stream.close().await.unwrap();

    server.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn multiple_messages_on_independent_streams() {
    let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let conn = listener.accept().await.unwrap();
        for i in 0..50u32 {
            let mut stream = conn.accept_stream().await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = stream.read(&mut buf).await.unwrap().unwrap();
            assert_eq!(&buf[..n], format!("message-{i:04}").as_bytes());
            stream.close().await.unwrap();
        }
    });

    let conn = dial(addr).await.unwrap();
    for i in 0..50u32 {
        let mut stream = conn.open_stream().await.unwrap();
        stream.write(format!("message-{i:04}").as_bytes()).await.unwrap();
        stream.close().await.unwrap();
    }

    server.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn large_payload_roundtrips_intact() {
    let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    let payload: Vec<u8> = (0..512 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let server = tokio::spawn(async move {
        let conn = listener.accept().await.unwrap();
        let mut stream = conn.accept_stream().await.unwrap();
        let mut received = Vec::with_capacity(expected.len());
        let mut buf = vec![0u8; 64 * 1024];
        while received.len() < expected.len() {
            let n = stream.read(&mut buf).await.unwrap().expect("stream closed early");
            received.extend_from_slice(&buf[..n]);
        }
        assert_eq!(received, expected);
    });

    let conn = dial(addr).await.unwrap();
    let mut stream = conn.open_stream().await.unwrap();
    stream.write(&payload).await.unwrap();
    stream.close().await.unwrap();

    server.await.unwrap();
}
