use gita_core::{Config, HttpGenerator, Session};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::load_or_default();
    println!("Endpoint: {}", config.generator.endpoint);

    let generator = Arc::new(HttpGenerator::new(&config.generator.endpoint));
    let session = Session::new(generator);

    let question = "How can I find inner peace?";
    println!("Question: {question}\n");

    let mut printed = 0;
    let result = session
        .ask(question, |update| {
            let delta = &update.text[printed..];
            printed = update.text.len();
            print!("{delta}");
            std::io::Write::flush(&mut std::io::stdout()).ok();
        })
        .await;

    match result {
        Ok(verses) => {
            println!("\n\nParsed {} verse(s):", verses.len());
            for record in verses {
                println!("  {}", record.verse);
            }
        }
        Err(e) => {
            eprintln!("\n\nGeneration failed: {e}");
            eprintln!("\nTroubleshooting:");
            eprintln!("  1. Is the generation endpoint running?");
            eprintln!("  2. Is the endpoint URL correct? ({})", config.generator.endpoint);
        }
    }
}
