pub mod interface;
pub mod client;
pub mod provisioner;

pub use interface::ASRInterface;
pub use client::ASRClient;
pub use provisioner::ModelProvisioner;
