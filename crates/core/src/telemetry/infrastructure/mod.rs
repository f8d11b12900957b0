pub mod udp_transport;
