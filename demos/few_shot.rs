//! Few-shot prompting: steer the model with Q/A examples before the real question.

use promptlab::{Client, Example};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load PROVIDER, API_KEY and MODEL from the environment
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    let examples = vec![
        Example::new("What is the capital of France?", "Paris"),
        Example::new("Who wrote Hamlet?", "William Shakespeare"),
    ];

    let answer = client
        .few_shot("What is the tallest mountain on Earth?", &examples)
        .await?;
    println!("Few-shot answer: {answer}");

    Ok(())
}
