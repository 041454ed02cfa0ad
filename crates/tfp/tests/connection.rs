//! Connection tests against a fake bridge daemon on a loopback socket

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_test::{assert_err, assert_ok};

use tfp::devices::{
    AmbientLight, AmbientLightV2, AmbientLightV3, BarometerV2, Humidity, HumidityV2,
    IlluminanceRange, IntegrationTime, Lcd20x4, ThresholdOption,
};
use tfp::packet::{Header, Packet, put_fixed};
use tfp::{ConnectReason, ConnectionConfig, EnumerationType, Error, IpConnection, base58};

async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn read_packet(stream: &mut TcpStream) -> Packet {
    let mut header = [0u8; 8];
    stream.read_exact(&mut header).await.unwrap();
    let decoded = Header::decode(&header).unwrap();

    let mut payload = vec![0u8; decoded.length as usize - 8];
    stream.read_exact(&mut payload).await.unwrap();

    Packet {
        header: decoded,
        payload: payload.into(),
    }
}

async fn reply(stream: &mut TcpStream, request: &Packet, error_code: u8, payload: &[u8]) {
    let mut header = request.header;
    header.length = (8 + payload.len()) as u8;
    header.error_code = error_code;

    let response = Packet {
        header,
        payload: bytes::Bytes::copy_from_slice(payload),
    };
    stream.write_all(&response.to_bytes()).await.unwrap();
}

async fn send_callback(stream: &mut TcpStream, uid: u32, function_id: u8, payload: &[u8]) {
    let packet = Packet::request(uid, function_id, 0, false, payload);
    stream.write_all(&packet.to_bytes()).await.unwrap();
}

fn enumerate_payload(uid: &str, device_identifier: u16) -> Vec<u8> {
    let mut buf = BytesMut::new();
    put_fixed(&mut buf, uid.as_bytes(), 8);
    put_fixed(&mut buf, b"6qzRzc", 8);
    buf.put_u8(b'c');
    buf.put_slice(&[1, 0, 0]);
    buf.put_slice(&[2, 0, 1]);
    buf.put_u16_le(device_identifier);
    buf.put_u8(0);
    buf.to_vec()
}

#[tokio::test]
async fn test_enumerate_before_connect_fails() {
    let connection = IpConnection::new();
    assert!(matches!(connection.enumerate().await, Err(Error::NotConnected)));
    assert!(!connection.is_connected());
}

#[tokio::test]
async fn test_connect_refused() {
    let (listener, port) = listen().await;
    drop(listener);

    let connection = IpConnection::new();
    assert!(matches!(connection.connect("127.0.0.1", port).await, Err(Error::Io(_))));
}

#[tokio::test]
async fn test_request_response() {
    let (listener, port) = listen().await;

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.function_id, 5);
        assert!(request.header.response_expected);
        assert_eq!(request.header.uid, base58::parse_uid("SCD").unwrap());
        reply(&mut stream, &request, 0, &2150i16.to_le_bytes()).await;

        stream
    });

    let connection = IpConnection::new();
    assert_ok!(connection.connect("127.0.0.1", port).await);
    assert!(connection.is_connected());

    let humidity = HumidityV2::new("SCD", &connection).unwrap();
    assert_eq!(humidity.get_temperature().await.unwrap(), 2150);

    let _stream = bridge.await.unwrap();
    assert_ok!(connection.disconnect().await);
    assert!(!connection.is_connected());
}

#[tokio::test]
async fn test_configuration_payloads() {
    let (listener, port) = listen().await;

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.function_id, 8);
        assert_eq!(&request.payload[..], &[0, 3]);
        reply(&mut stream, &request, 0, &[]).await;

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.function_id, 2);
        assert_eq!(&request.payload[..], &[0xE8, 0x03, 0, 0, 0, b'x', 0, 0, 0, 0]);
        reply(&mut stream, &request, 0, &[]).await;

        stream
    });

    let connection = IpConnection::new();
    connection.connect("127.0.0.1", port).await.unwrap();

    let light = AmbientLightV2::new("abc", &connection).unwrap();
    assert_ok!(
        light
            .set_configuration(IlluminanceRange::Lux64000, IntegrationTime::Ms200)
            .await
    );

    let humidity = HumidityV2::new("abd", &connection).unwrap();
    assert_ok!(
        humidity
            .set_humidity_callback_configuration(1000, false, ThresholdOption::Off, 0, 0)
            .await
    );

    let _stream = bridge.await.unwrap();
}

#[tokio::test]
async fn test_error_code_is_reported() {
    let (listener, port) = listen().await;

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_packet(&mut stream).await;
        reply(&mut stream, &request, 1, &[]).await;
        stream
    });

    let connection = IpConnection::new();
    connection.connect("127.0.0.1", port).await.unwrap();

    let lcd = Lcd20x4::new("SCD", &connection).unwrap();
    assert!(matches!(lcd.backlight_on().await, Err(Error::InvalidParameter)));

    let _stream = bridge.await.unwrap();
}

#[tokio::test]
async fn test_request_times_out() {
    let (listener, port) = listen().await;

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ignored = read_packet(&mut stream).await;
        stream
    });

    let connection = IpConnection::with_config(ConnectionConfig {
        timeout: Duration::from_millis(50),
        ..ConnectionConfig::default()
    });
    connection.connect("127.0.0.1", port).await.unwrap();

    let lcd = Lcd20x4::new("SCD", &connection).unwrap();
    assert!(matches!(lcd.is_backlight_on().await, Err(Error::Timeout)));

    let _stream = bridge.await.unwrap();
}

#[tokio::test]
async fn test_enumerate_and_callbacks() {
    let (listener, port) = listen().await;
    let lcd_uid = base58::parse_uid("SCD").unwrap();

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.uid, 0);
        assert_eq!(request.header.function_id, 254);
        assert!(!request.header.response_expected);

        send_callback(&mut stream, lcd_uid, 253, &enumerate_payload("SCD", 212)).await;
        send_callback(&mut stream, lcd_uid, 9, &[0]).await;
        send_callback(&mut stream, lcd_uid, 9, &[3]).await;
        stream
    });

    let connection = IpConnection::new();
    let mut enumerations = connection.enumerate_events();
    let mut connected = connection.connected_events();

    connection.connect("127.0.0.1", port).await.unwrap();
    assert_eq!(connected.recv().await, Some(ConnectReason::Request));

    let lcd = Lcd20x4::new("SCD", &connection).unwrap();
    let mut buttons = lcd.button_pressed_events();

    assert_ok!(connection.enumerate().await);

    let event = enumerations.recv().await.unwrap();
    assert_eq!(event.uid, "SCD");
    assert_eq!(event.device_identifier, Lcd20x4::DEVICE_IDENTIFIER);
    assert_eq!(event.enumeration_type, EnumerationType::Available);

    assert_eq!(buttons.recv().await, Some(0));
    assert_eq!(buttons.recv().await, Some(3));

    let _stream = bridge.await.unwrap();
}

#[tokio::test]
async fn test_resubscribe_ends_previous_stream() {
    let connection = IpConnection::new();
    let lcd = Lcd20x4::new("SCD", &connection).unwrap();

    let mut first = lcd.button_pressed_events();
    let _second = lcd.button_pressed_events();

    assert_eq!(first.recv().await, None);
}

#[tokio::test]
async fn test_auto_reconnect() {
    let (listener, port) = listen().await;

    let bridge = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);

        let (stream, _) = listener.accept().await.unwrap();
        stream
    });

    let connection = IpConnection::with_config(ConnectionConfig {
        reconnect_interval: Duration::from_millis(10),
        ..ConnectionConfig::default()
    });
    let mut connected = connection.connected_events();

    connection.connect("127.0.0.1", port).await.unwrap();
    assert_eq!(connected.recv().await, Some(ConnectReason::Request));

    let reason = tokio::time::timeout(Duration::from_secs(5), connected.recv())
        .await
        .unwrap();
    assert_eq!(reason, Some(ConnectReason::AutoReconnect));
    assert!(connection.is_connected());

    let _stream = bridge.await.unwrap();
    assert_ok!(connection.disconnect().await);
    assert_err!(connection.disconnect().await);
}

#[tokio::test]
async fn test_disconnect_after_session_ended() {
    let (listener, port) = listen().await;

    let bridge = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let connection = IpConnection::with_config(ConnectionConfig {
        auto_reconnect: false,
        ..ConnectionConfig::default()
    });
    connection.connect("127.0.0.1", port).await.unwrap();
    bridge.await.unwrap();

    for _ in 0..100 {
        if !connection.is_connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!connection.is_connected());
    // Let the session task return after logging the loss
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(matches!(connection.disconnect().await, Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_first_generation_sensors() {
    let (listener, port) = listen().await;
    let light_uid = base58::parse_uid("aLx").unwrap();
    let humidity_uid = base58::parse_uid("aHu").unwrap();

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.uid, light_uid);
        assert_eq!(request.header.function_id, 3);
        assert_eq!(&request.payload[..], &1000u32.to_le_bytes());
        reply(&mut stream, &request, 0, &[]).await;

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.uid, humidity_uid);
        assert_eq!(request.header.function_id, 3);
        assert_eq!(&request.payload[..], &500u32.to_le_bytes());
        reply(&mut stream, &request, 0, &[]).await;

        send_callback(&mut stream, light_uid, 13, &1234u16.to_le_bytes()).await;
        send_callback(&mut stream, humidity_uid, 13, &456u16.to_le_bytes()).await;
        stream
    });

    let connection = IpConnection::new();
    connection.connect("127.0.0.1", port).await.unwrap();

    let light = AmbientLight::new("aLx", &connection).unwrap();
    let humidity = Humidity::new("aHu", &connection).unwrap();
    let mut illuminance = light.illuminance_events();
    let mut humidities = humidity.humidity_events();

    assert_ok!(light.set_illuminance_callback_period(1000).await);
    assert_ok!(humidity.set_humidity_callback_period(500).await);

    assert_eq!(illuminance.recv().await, Some(1234));
    assert_eq!(humidities.recv().await, Some(456));

    let _stream = bridge.await.unwrap();
}

#[tokio::test]
async fn test_threshold_callback_configurations() {
    let (listener, port) = listen().await;
    let barometer_uid = base58::parse_uid("bAr").unwrap();

    let bridge = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.function_id, 5);
        assert_eq!(&request.payload[..], &[0, 3]);
        reply(&mut stream, &request, 0, &[]).await;

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.function_id, 2);
        let mut expected = vec![0xE8, 0x03, 0, 0, 0, b'x'];
        expected.extend_from_slice(&[0; 8]);
        assert_eq!(&request.payload[..], &expected[..]);
        reply(&mut stream, &request, 0, &[]).await;

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.uid, barometer_uid);
        assert_eq!(request.header.function_id, 2);
        assert_eq!(&request.payload[..], &expected[..]);
        reply(&mut stream, &request, 0, &[]).await;

        let request = read_packet(&mut stream).await;
        assert_eq!(request.header.function_id, 9);
        reply(&mut stream, &request, 0, &2275i32.to_le_bytes()).await;

        send_callback(&mut stream, barometer_uid, 4, &1_013_250i32.to_le_bytes()).await;
        stream
    });

    let connection = IpConnection::new();
    connection.connect("127.0.0.1", port).await.unwrap();

    let light = AmbientLightV3::new("aL3", &connection).unwrap();
    assert_ok!(
        light
            .set_configuration(IlluminanceRange::Lux64000, IntegrationTime::Ms200)
            .await
    );
    assert_ok!(
        light
            .set_illuminance_callback_configuration(1000, false, ThresholdOption::Off, 0, 0)
            .await
    );

    let barometer = BarometerV2::new("bAr", &connection).unwrap();
    let mut pressures = barometer.air_pressure_events();
    assert_ok!(
        barometer
            .set_air_pressure_callback_configuration(1000, false, ThresholdOption::Off, 0, 0)
            .await
    );
    assert_eq!(barometer.get_temperature().await.unwrap(), 2275);
    assert_eq!(pressures.recv().await, Some(1_013_250));

    let _stream = bridge.await.unwrap();
}
