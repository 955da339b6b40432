//! `agentflow list` — show what the configuration defines.

use crate::runtime::Runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load()?;
    let config = &runtime.config;

    println!("Agents (default: {})", config.default_agent);
    for (name, agent) in &config.agents {
        let tools = if agent.tools.is_empty() {
            "none".to_string()
        } else {
            agent.tools.join(", ")
        };
        println!("  {name:<20} flow: {:<20} tools: {tools}", agent.flow);
    }

    println!("\nFlows");
    for name in runtime.flows.names() {
        let Some(flow) = runtime.flows.get(name) else {
            continue;
        };
        let detail = config
            .flows
            .get(name)
            .map(|f| match &f.connection {
                Some(conn) => format!("{:?}, connection: {conn}, max_iterations: {}", f.kind, f.max_iterations),
                None => format!("{:?}", f.kind),
            })
            .unwrap_or_default();
        println!("  {name:<20} {detail}");
        println!("  {:<20} {}", "", flow.description());
    }

    println!("\nConnections");
    for name in runtime.connections.names() {
        let Some(entry) = runtime.connections.get(name) else {
            continue;
        };
        let key = config
            .connections
            .get(name)
            .map(|c| c.redacted_api_key())
            .unwrap_or_default();
        println!(
            "  {name:<20} {} ({}) key: {key}",
            entry.connection.base_url(),
            entry.connection.model()
        );
    }

    println!("\nTools");
    for definition in runtime.tools.definitions() {
        println!("  {:<20} {}", definition.name, definition.description);
    }
    println!();

    Ok(())
}
