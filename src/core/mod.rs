pub mod adapters;
pub mod crypto;
pub mod fs_secure;
pub mod logging;
pub mod ports;
pub mod secret_string;
pub mod service;
