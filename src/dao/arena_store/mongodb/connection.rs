use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const PING_ATTEMPTS: u32 = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Open a client for `config` and return once its database answers.
pub async fn establish_connection(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::Client { source })?;
    let database = client.database(&config.database_name);
    ping_until_ready(&database).await?;
    Ok((client, database))
}

async fn ping_until_ready(database: &Database) -> MongoResult<()> {
    let mut delay = FIRST_PING_DELAY;
    let mut attempt = 1;
    loop {
        let Err(source) = database.run_command(doc! { "ping": 1 }).await else {
            return Ok(());
        };
        if attempt == PING_ATTEMPTS {
            return Err(MongoDaoError::Unreachable {
                attempts: attempt,
                source,
            });
        }
        debug!(attempt, ?delay, error = %source, "MongoDB not answering yet");
        sleep(delay).await;
        delay = (delay * 2).min(MAX_PING_DELAY);
        attempt += 1;
    }
}
