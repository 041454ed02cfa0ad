//! Role implementations over a fake bridge daemon on a loopback socket

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_test::assert_ok;

use tfp::packet::{Header, Packet};
use tfp::{ConnectionConfig, base58};
use weather_station::TinkerforgeBridge;
use weather_station::roles::{Bridge, HumiditySensorModel, LightSensorModel, PressureSensorModel};

async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn read_packet(stream: &mut TcpStream) -> (Header, Vec<u8>) {
    let mut header = [0u8; 8];
    stream.read_exact(&mut header).await.unwrap();
    let header = Header::decode(&header).unwrap();

    let mut payload = vec![0u8; header.length as usize - 8];
    stream.read_exact(&mut payload).await.unwrap();
    (header, payload)
}

/// Answer the next request after checking its function id and payload
async fn expect_request(stream: &mut TcpStream, uid: u32, function_id: u8, payload: &[u8]) {
    let (header, received) = read_packet(stream).await;
    assert_eq!(header.uid, uid);
    assert_eq!(header.function_id, function_id);
    assert_eq!(received, payload);

    let response = Packet::request(uid, function_id, header.sequence, true, &[]);
    stream.write_all(&response.to_bytes()).await.unwrap();
}

async fn send_callback(stream: &mut TcpStream, uid: u32, function_id: u8, payload: &[u8]) {
    let packet = Packet::request(uid, function_id, 0, false, payload);
    stream.write_all(&packet.to_bytes()).await.unwrap();
}

/// Callback configuration with threshold off and a 1000 ms period
fn unconditional_callback() -> Vec<u8> {
    let mut payload = 1000u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&[0, b'x']);
    payload.extend_from_slice(&[0; 8]);
    payload
}

async fn connect(port: u16) -> TinkerforgeBridge {
    let bridge = TinkerforgeBridge::new(ConnectionConfig::default());
    assert_ok!(bridge.connect("127.0.0.1", port).await);
    bridge
}

#[tokio::test]
async fn test_first_generation_readings_are_scaled() {
    let (listener, port) = listen().await;
    let light_uid = base58::parse_uid("aLx").unwrap();
    let humidity_uid = base58::parse_uid("aHu").unwrap();

    let daemon = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        expect_request(&mut stream, light_uid, 3, &1000u32.to_le_bytes()).await;
        send_callback(&mut stream, light_uid, 13, &1234u16.to_le_bytes()).await;

        expect_request(&mut stream, humidity_uid, 3, &1000u32.to_le_bytes()).await;
        send_callback(&mut stream, humidity_uid, 13, &456u16.to_le_bytes()).await;
        stream
    });

    let bridge = connect(port).await;

    let light = bridge.light_sensor(LightSensorModel::AmbientLight, "aLx").unwrap();
    let mut illuminance = light.illuminance_events();
    assert_ok!(light.enable_illuminance_callback(1000).await);
    assert_eq!(illuminance.recv().await, Some(12_340));

    let humidity = bridge.humidity_sensor(HumiditySensorModel::Humidity, "aHu").unwrap();
    let mut humidities = humidity.humidity_events();
    assert_ok!(humidity.enable_humidity_callback(1000).await);
    assert_eq!(humidities.recv().await, Some(4560));
    assert_eq!(humidity.get_temperature().await.unwrap(), None);

    let _stream = daemon.await.unwrap();
    assert_ok!(bridge.disconnect().await);
}

#[tokio::test]
async fn test_threshold_models_use_callback_configuration() {
    let (listener, port) = listen().await;
    let light_uid = base58::parse_uid("aL3").unwrap();
    let barometer_uid = base58::parse_uid("bAr").unwrap();

    let daemon = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        expect_request(&mut stream, light_uid, 5, &[0, 3]).await;
        expect_request(&mut stream, light_uid, 2, &unconditional_callback()).await;
        send_callback(&mut stream, light_uid, 4, &123_456u32.to_le_bytes()).await;

        expect_request(&mut stream, barometer_uid, 2, &unconditional_callback()).await;
        send_callback(&mut stream, barometer_uid, 4, &1_013_250i32.to_le_bytes()).await;
        stream
    });

    let bridge = connect(port).await;

    let light = bridge.light_sensor(LightSensorModel::AmbientLightV3, "aL3").unwrap();
    let mut illuminance = light.illuminance_events();
    assert_ok!(light.enable_illuminance_callback(1000).await);
    assert_eq!(illuminance.recv().await, Some(123_456));

    let barometer = bridge.barometer(PressureSensorModel::BarometerV2, "bAr").unwrap();
    let mut pressures = barometer.air_pressure_events();
    assert_ok!(barometer.enable_air_pressure_callback(1000).await);
    assert_eq!(pressures.recv().await, Some(1_013_250));

    let _stream = daemon.await.unwrap();
    assert_ok!(bridge.disconnect().await);
}
