//! Example demonstrating how to pull every page of an endpoint
//!
//! This example shows:
//! - Creating a client from `VERACROSS_*` environment variables
//! - Fetching a token for the endpoint's scope
//! - Pulling all students of a grade level
//! - Printing each record

use simple_logger::SimpleLogger;
use veracross::{Client, Query};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new().with_level(log::LevelFilter::Info).init()?;

    // VERACROSS_SCHOOL, VERACROSS_CLIENT_ID and VERACROSS_CLIENT_SECRET must be set
    let mut client = Client::from_env()?;

    // A token has to be fetched before pulling anything
    client.get_token(["students:list"]).await?;

    // Pagination and rate limits are handled by the client
    let query = Query::new().filter("grade_level", 9);
    let students = client.pull("students", &query).await?;

    println!("{} students over {} pages", students.len(), students.pages());
    for student in students.iter() {
        println!("{}", serde_json::to_string(student)?);
    }

    Ok(())
}
