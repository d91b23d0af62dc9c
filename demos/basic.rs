//! Basic example of lazywire dependency lookup.

use lazywire::prelude::*;
use std::sync::Arc;

// === Define your types ===

#[derive(Debug)]
struct Config {
    database_url: String,
    debug: bool,
}

struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("{}{msg}", self.prefix);
    }
}

struct Database {
    url: String,
    logger: DependencyProxy,
}

impl Database {
    fn query(&self, sql: &str) -> Result<String> {
        self.logger
            .with(|logger: &ConsoleLogger| logger.log(&format!("Executing: {sql}")))?;
        Ok(format!("Results from {}", self.url))
    }
}

// A symbol anyone can ask for by name, without registering it first.
fn make_logger(args: &Arguments) -> std::result::Result<Dependency, BoxError> {
    let prefix = args.keyword::<&str>("prefix").copied().unwrap_or("[LOG] ");
    Ok(Dependency::new(ConsoleLogger {
        prefix: prefix.to_string(),
    }))
}

inventory::submit! { Symbol::new("demo.log.ConsoleLogger", make_logger) }

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("lazywire=debug,lazywire_container=debug")
        .init();

    let manager = DependencyManager::new();

    // Proxies can be handed out before anything is registered.
    let logger = manager.get_proxy("logger");

    manager.provide_value(
        "config",
        Config {
            database_url: "postgres://localhost/myapp".to_string(),
            debug: true,
        },
    );

    manager.provide(
        "logger",
        Provision::lookup("demo.log.ConsoleLogger")
            .with_args(Arguments::new().kwarg("prefix", "[demo] ")),
    );

    manager.provider("database", Arguments::new(), {
        let config = manager.get_proxy("config");
        let logger = logger.clone();
        move |_| {
            let config = config.downcast::<Config>()?;
            Ok(Dependency::new(Database {
                url: config.database_url.clone(),
                logger: logger.clone(),
            }))
        }
    });

    println!("{manager:?}");

    let config: Arc<Config> = manager.resolve("config")?;
    println!("Config: database_url={}, debug={}", config.database_url, config.debug);

    let db: Arc<Database> = manager.resolve("database")?;
    println!("{}", db.query("SELECT * FROM users WHERE id = 42")?);

    // Never registered: resolves to nothing instead of failing.
    let missing = manager.get_entry("demo.cache.Redis").value();
    println!("Redis available: {}", missing.is_some());

    Ok(())
}
