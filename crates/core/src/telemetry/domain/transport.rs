/// Best-effort datagram sink for telemetry packets.
///
/// One call per transmitted frame. Implementations never retry.
pub trait TelemetryTransport: Send {
    fn send(&mut self, packet: &[u8]) -> Result<(), Box<dyn std::error::Error>>;
}
