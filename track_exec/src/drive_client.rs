//! # Drive Client
//!
//! This module provides networking abstractions to connect to the drivetrain server.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    eqpt::drive::{DriveDems, DriveDemsResponse}
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct DriveClient {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DriveClientError {

    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the server")]
    NotConnected,

    #[error("Demands must be finite and within [-1, 1], got {0:?}")]
    InvalidDemands(DriveDems),

    #[error("Could not send demands to the server: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the server: {0}")]
    RecvError(zmq::Error),

    #[error("The server responded with a message which was not valid UTF-8")]
    NonUtf8Response,

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),

}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveClient {
    /// Create a new instance of the drive client.
    ///
    /// This function will not block until the server connects, instead the exec starts in safe
    /// mode until the connection is made.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, DriveClientError> {

        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        // Create the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            socket_options,
            &params.drive_endpoint
        ).map_err(DriveClientError::SocketError)?;

        Ok(Self {
            socket
        })
    }

    /// Returns true if the drivetrain server is connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Send demands to the server.
    ///
    /// Sends the given drive demands to the server. If the server responds within the configured
    /// timeout its response is returned, otherwise an `Err()` is returned. Demands outside the
    /// drivetrain's normalised range are never sent.
    pub fn send_demands(
        &mut self,
        demands: &DriveDems
    ) -> Result<DriveDemsResponse, DriveClientError> {
        if !demands.is_valid() {
            return Err(DriveClientError::InvalidDemands(*demands))
        }

        // If not connected return now
        if !self.socket.connected() {
            return Err(DriveClientError::NotConnected)
        }

        // Serialize the demands
        let dems_str = serde_json::to_string(demands)
            .map_err(DriveClientError::SerializationError)?;

        // Send the demands to the server
        self.socket.send(&dems_str, 0)
            .map_err(DriveClientError::SendError)?;

        // Recieve response back from the server
        let response_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(DriveClientError::NonUtf8Response),
            Err(e) => return Err(DriveClientError::RecvError(e))
        };

        serde_json::from_str(&response_str)
            .map_err(DriveClientError::DeserializeError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_send_checks() {
        let ctx = zmq::Context::new();

        // Nothing listens on the tcpmux port
        let mut client = DriveClient::new(&ctx, &NetParams {
            vision_endpoint: String::new(),
            drive_endpoint: String::from("tcp://127.0.0.1:1"),
            tm_endpoint: String::new(),
        }).unwrap();

        assert!(!client.is_connected());

        // Invalid demands are refused before the connection is checked
        let over = DriveDems { forward: 1.5, turn: 0.0 };
        match client.send_demands(&over) {
            Err(DriveClientError::InvalidDemands(d)) => assert_eq!(d, over),
            r => panic!("Expected InvalidDemands, got {:?}", r)
        }
        assert!(matches!(
            client.send_demands(&DriveDems { forward: 0.0, turn: f64::NAN }),
            Err(DriveClientError::InvalidDemands(_))
        ));

        assert!(matches!(
            client.send_demands(&DriveDems::stop()),
            Err(DriveClientError::NotConnected)
        ));
    }
}
