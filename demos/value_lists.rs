//! This example shows:
//! - Pulling classes along with their value lists
//! - Printing the value lists
//! - Resolving coded values into descriptions

use simple_logger::SimpleLogger;
use veracross::{Client, Query};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new().init()?;

    let mut client = Client::from_env()?;
    client.get_token(["classes:list"]).await?;

    let mut classes = client.pull("classes", &Query::new()).await?;

    if let Some(lists) = classes.value_lists() {
        println!("{lists}");
    }

    let substituted = classes.resolve();
    println!("resolved {substituted} values");
    print!("{classes}");

    Ok(())
}
