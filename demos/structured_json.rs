//! Structured output: ask for a JSON answer and parse it.

use promptlab::{Answer, Client};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    // Untyped: inspect the JSON value directly
    let value = client.structured_json("Who discovered penicillin?").await?;
    println!("JSON response: {value}");

    // Typed: deserialize into the expected answer shape
    let answer: Answer = client.structured("Who discovered penicillin?").await?;
    println!("Answer field: {}", answer.answer);

    Ok(())
}
