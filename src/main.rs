use std::sync::Arc;

use clap::Parser;

use souk::config::Config;
use souk::{CollectionStore, Server, marketplace};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let store = Arc::new(CollectionStore::new(&config.data_dir));
    store
        .ensure_files()
        .await
        .expect("failed to seed collection files");

    let app = marketplace::routes(Arc::clone(&store), config.treasury_address.clone());

    Server::bind(config.bind_addr())
        .serve(app)
        .await
        .expect("server error");
}
