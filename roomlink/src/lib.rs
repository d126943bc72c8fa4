pub use roomlink_core::model::SessionId;

pub mod model {
    pub use roomlink_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use roomlink_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use roomlink_client::*;
}
