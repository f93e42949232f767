mod block;
mod provider;

pub use block::{is_private_network, AddressFamily, NetworkBlock};
pub use provider::Provider;

pub(crate) use block::{address_bits, address_from_bits};
