//! Controller API client.

mod controller_client;

pub use controller_client::ControllerClient;
