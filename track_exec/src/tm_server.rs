//! # TM Server

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------
use serde::Serialize;

use comms_if::{
    eqpt::drive::DriveDems,
    net::{MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions, zmq}
};

use crate::data_store::{DataStore, SafeModeCause};
use crate::track_ctrl::{StatusReport, TrackTm};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    socket: MonitoredSocket
}

/// Telemetry packet that is output by the server.
#[derive(Debug, Serialize)]
pub struct TmPacket {
    pub elapsed_s: f64,

    pub safe: bool,

    pub safe_cause: Option<SafeModeCause>,

    pub track_tm: TrackTm,

    pub track_report: StatusReport,

    pub drive_dems: DriveDems,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server.
    ///
    /// This function will not block until the server connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TmServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Bind the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            &params.tm_endpoint
        ).map_err(TmServerError::SocketError)?;

        Ok(Self {
            socket
        })
    }

    pub fn send(&mut self, ds: &DataStore) -> Result<(), TmServerError> {
        // Build and serialize the packet
        let packet_string = serde_json::to_string(&TmPacket::from_datastore(ds))
            .map_err(TmServerError::SerializationError)?;

        // Send the packet
        self.socket.send(&packet_string, 0)
            .map_err(TmServerError::SendError)
    }
}

impl TmPacket {
    pub fn from_datastore(ds: &DataStore) -> Self {
        Self {
            elapsed_s: ds.elapsed_s,
            safe: ds.safe,
            safe_cause: ds.safe_cause,
            track_tm: ds.track_ctrl.tm(),
            track_report: ds.track_ctrl_status_rpt,
            drive_dems: ds.drive_dems,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_packet_json() {
        let mut ds = DataStore::default();
        ds.elapsed_s = 1.5;
        ds.make_safe(SafeModeCause::DriveClientNotConnected);

        let value = serde_json::to_value(&TmPacket::from_datastore(&ds)).unwrap();

        assert_eq!(value["elapsed_s"], 1.5);
        assert_eq!(value["safe"], true);
        assert_eq!(value["safe_cause"], "DriveClientNotConnected");
        assert_eq!(value["track_tm"]["visible"], false);
        assert_eq!(value["track_report"]["mode"], "NoTarget");
        assert_eq!(value["drive_dems"]["forward"], 0.0);
    }
}
