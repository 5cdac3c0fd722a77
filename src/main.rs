use caro::{GameStore, WebSocketServer};
use log::{error, info};

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut server = WebSocketServer::from_env(GameStore::default());
    info!("starting caro server on {}", server.get_address());

    if let Err(e) = server.start().await {
        error!("server stopped: {:?}", e);
        std::process::exit(1);
    }
}
