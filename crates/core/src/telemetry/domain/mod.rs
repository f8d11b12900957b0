pub mod packet_decoder;
pub mod packet_encoder;
pub mod transport;
