//! Fault injection tests.
//!
//! UDP gives no delivery guarantee and the protocol adds none, so every lost
//! request or reply surfaces as [`ClientError::NoReply`]. These tests check
//! that a client retrying on `NoReply` makes progress, and that endpoints
//! recover once the network does.

use std::{net::SocketAddr, time::Duration};

use thermonet_client::{Client, ClientError};
use thermonet_crypto::{KEY_SIZE, SecretKey};
use thermonet_harness::{SIM_PORT, SimEndpoint, SimEnv, SimTransport};

const PASSWORD: &str = "correct horse";
const MAX_RETRIES: usize = 20;

fn key() -> SecretKey {
    SecretKey::from_bytes([0x42; KEY_SIZE])
}

async fn connect() -> Result<Client<SimTransport, SimEnv>, ClientError> {
    let transport = SimTransport::bind("0.0.0.0:40000").await?;
    let server = SocketAddr::new(turmoil::lookup("sensor"), SIM_PORT);
    Ok(Client::new(transport, SimEnv::with_seed(7), server, key()))
}

async fn authenticate_with_retry(
    client: &Client<SimTransport, SimEnv>,
) -> Result<String, ClientError> {
    let mut last = ClientError::NoReply;
    for _ in 0..MAX_RETRIES {
        match client.authenticate(PASSWORD).await {
            Ok(token) => return Ok(token),
            Err(e) if !e.is_fatal() => last = e,
            Err(e) => return Err(e),
        }
    }
    Err(last)
}

async fn read_with_retry(
    client: &Client<SimTransport, SimEnv>,
    token: &str,
) -> Result<f64, ClientError> {
    let mut last = ClientError::NoReply;
    for _ in 0..MAX_RETRIES {
        match client.get_temperature(token).await {
            Ok(value) => return Ok(value),
            Err(ClientError::NoReply) => last = ClientError::NoReply,
            Err(e) => return Err(e),
        }
    }
    Err(last)
}

#[test]
fn session_survives_packet_loss() {
    let mut sim = turmoil::Builder::new()
        .simulation_duration(Duration::from_secs(120))
        .fail_rate(0.05)
        .rng_seed(12345)
        .build();

    let sensor = SimEndpoint::new("sensor", PASSWORD, key()).kelvin(300.0);
    sim.host("sensor", move || sensor.clone().run());

    sim.client("operator", async {
        let client = connect().await?;
        let token = authenticate_with_retry(&client).await?;

        for _ in 0..10 {
            assert_eq!(read_with_retry(&client, &token).await?, 300.0);
        }

        Ok(())
    });

    sim.run().expect("simulation should complete despite packet loss");
}

#[test]
fn partition_then_repair() {
    let mut sim = turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build();

    let sensor = SimEndpoint::new("sensor", PASSWORD, key()).kelvin(300.0);
    sim.host("sensor", move || sensor.clone().run());

    sim.client("operator", async {
        let client = connect().await?;
        let token = client.authenticate(PASSWORD).await?;

        turmoil::partition("operator", "sensor");
        assert!(matches!(client.get_temperature(&token).await, Err(ClientError::NoReply)));

        turmoil::repair("operator", "sensor");

        // Tokens outlive network faults
        assert_eq!(client.get_temperature(&token).await?, 300.0);

        Ok(())
    });

    sim.run().expect("simulation should complete");
}
