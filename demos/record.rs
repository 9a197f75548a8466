//! This example shows:
//! - Creating a client with a custom page size
//! - Pulling a single record by id

use veracross::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut client = Client::builder(
        std::env::var("VERACROSS_SCHOOL")?,
        std::env::var("VERACROSS_CLIENT_ID")?,
        std::env::var("VERACROSS_CLIENT_SECRET")?,
    )
    .page_size(1000)
    .build()?;

    client.get_token(["students:read"]).await?;

    let id: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);

    match client.pull_one("students", id).await?.first() {
        Some(student) => println!("{student:#?}"),
        None => println!("No student with id {id}."),
    }

    Ok(())
}
