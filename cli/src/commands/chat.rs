//! Interactive chat command

use anyhow::Result;
use llmwrap::{ChatMessage, ChatModel, ChatRequest, OpenAiChatModel};
use std::io::{self, BufRead, Write};

pub async fn execute(model: &str) -> Result<()> {
    let chat_model = OpenAiChatModel::new(model, None)?;

    println!("Chatting with {} (Ctrl+C to exit)", model);
    println!("---");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut history: Vec<ChatMessage> = Vec::new();

    loop {
        // Print prompt
        print!("> ");
        stdout.flush()?;

        // Read user input
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        history.push(ChatMessage::new("user", input));

        let request = ChatRequest {
            messages: history.clone(),
            max_tokens: 2048,
            temperature: 0.7,
            stream: true,
        };

        let mut rx = match chat_model.chat_stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                eprintln!("Error: {}", e);
                history.pop();
                continue;
            }
        };

        let mut reply = String::new();
        while let Some(chunk) = rx.recv().await {
            print!("{}", chunk.content);
            stdout.flush()?;
            reply.push_str(&chunk.content);
            if chunk.finish_reason.is_some() {
                break;
            }
        }
        println!("\n");

        history.push(ChatMessage::new("assistant", &reply));
    }

    Ok(())
}
