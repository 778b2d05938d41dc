pub mod client_ip;
pub mod extractor;
pub mod jwt;
pub mod password;
