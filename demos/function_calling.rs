//! Function calling: let the model use the built-in calculator.

use promptlab::{Client, FunctionRegistry, Prompt};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    let registry = FunctionRegistry::calculator();

    // Direct dispatch, no model involved
    let product = registry.call("multiply", json!({"a": 5.0, "b": 3.0}))?;
    println!("multiply(5, 3) = {}", product["result"]);

    // Let the model decide which function to call
    let prompt = Prompt::system("Use the calculator functions for any arithmetic.")
        .with_user("What is 5 times 3?");
    let answer = client.run_with_functions(&prompt, &registry).await?;
    println!("Model answer: {answer}");

    Ok(())
}
