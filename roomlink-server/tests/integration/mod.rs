pub mod join_tests;

use roomlink_server::RelayService;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_relay() -> RelayService {
    init_tracing();
    RelayService::new()
}
