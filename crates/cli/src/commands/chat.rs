//! `agentflow chat` — one-shot or interactive conversation with an agent.

use agentflow_agent::{Agent, render_transcript};

use crate::runtime::Runtime;

pub async fn run(
    agent_name: Option<String>,
    messages: Vec<String>,
    transcript: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load().map_err(|e| format!("Failed to start: {e}"))?;
    let mut agent = runtime.agent(agent_name.as_deref())?;
    let _event_log = runtime.log_events();

    if !messages.is_empty() {
        let answer = agent.run_conversation(&messages).await?;
        println!("{answer}");
        if transcript {
            print_transcript(&agent);
        }
        return Ok(());
    }

    println!();
    println!("  AgentFlow — Interactive Mode");
    println!();
    println!("  Agent:  {}", agent.name());
    println!("  Flow:   {}", agent.flow().name());
    let tools = agent.tools().join(", ");
    println!("  Tools:  {}", if tools.is_empty() { "none" } else { tools.as_str() });
    println!();
    println!("  Type a message and press Enter. `/reset` starts over, `exit` quits.");
    println!();

    loop {
        // One reader shared with `get_user_input`
        let Some(line) = runtime.console.ask("  You > ").await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "/reset" => {
                agent.reset();
                println!("  (conversation reset)\n");
                continue;
            }
            _ => {}
        }

        match agent.run_conversation(&[line.to_string()]).await {
            Ok(answer) => {
                println!();
                for reply_line in answer.lines() {
                    println!("  {} > {reply_line}", agent.name());
                }
                println!();
                if transcript {
                    print_transcript(&agent);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Conversation failed");
                eprintln!("  [Error] {e}\n");
            }
        }
    }

    println!("\n  Goodbye!\n");
    Ok(())
}

fn print_transcript(agent: &Agent) {
    println!("--- transcript ---");
    print!("{}", render_transcript(agent.memory().messages()));
    println!("------------------");
}
