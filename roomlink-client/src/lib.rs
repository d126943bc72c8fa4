mod config;
mod error;
mod link;
mod media;
mod mesh;
mod relay;
mod rtc;
mod socket;
mod transport;

pub use config::*;
pub use error::*;
pub use link::*;
pub use media::*;
pub use mesh::*;
pub use relay::*;
pub use rtc::*;
pub use socket::*;
pub use transport::*;
