//! Process entry point: loads one instance's settings document, builds its
//! driver, starts it under a [`Manager`], and runs until interrupted.

use std::env;

use hyperhdr_core::config::load_instance_settings;
use hyperhdr_core::driver::{Driver, NullDriver, SerialDriver};
use hyperhdr_core::manager::Manager;

fn build_driver(kind: &str) -> Box<dyn Driver> {
    match kind {
        "serial" => Box::new(SerialDriver::new()),
        _ => Box::new(NullDriver::new("instance-0")),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config_path = env::args().nth(1).unwrap_or_else(|| "hyperhdr.instance.json".to_string());
    let settings = match load_instance_settings(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let mut driver = build_driver(&settings.device.kind);
    if let Err(e) = driver.init(settings.device.clone()).await {
        log::error!("driver init failed: {e}");
        std::process::exit(1);
    }
    if let Err(e) = driver.open().await {
        log::error!("driver open failed: {e}");
        std::process::exit(1);
    }

    let (manager, _manager_task) = Manager::spawn();
    let name = settings.name.clone();
    let index = match manager.create_instance(&name, settings, driver).await {
        Ok(index) => index,
        Err(e) => {
            log::error!("failed to create instance: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = manager.start_instance(index, false).await {
        log::error!("failed to start instance {index}: {e}");
        std::process::exit(1);
    }

    log::info!("instance {index} ({name}) running; press ctrl-c to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {e}");
    }
    let _ = manager.stop_instance(index).await;
}
