//! Context-grounded generation: answer a question from supplied context.

use promptlab::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    let context = "Albert Einstein developed the theory of relativity, E=mc^2.";
    let answer = client
        .answer_with_context(context, "What is Einstein famous for?")
        .await?;
    println!("Grounded answer: {answer}");

    Ok(())
}
