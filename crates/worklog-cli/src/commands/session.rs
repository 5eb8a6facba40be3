//! Event delivery commands: start, press, say, screen.

use std::error::Error;

use worklog_core::{Config, Database, InboundEvent, Reply, SessionEngine};

fn open_engine() -> Result<SessionEngine, Box<dyn Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    Ok(SessionEngine::new(db, config.defaults))
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.text);
    if !reply.actions.is_empty() {
        println!();
        for button in &reply.actions {
            println!("  [{}] {}", button.token, button.label);
        }
    }
    if let Some(attachment) = &reply.attachment {
        println!();
        println!(
            "  (document: {}, {} rows)",
            attachment.filename,
            attachment.rows.len()
        );
    }
}

fn deliver(event: InboundEvent) -> Result<(), Box<dyn Error>> {
    tracing::debug!("inbound {:?} event for user {}", event.kind, event.user_id);
    let mut engine = open_engine()?;
    let reply = engine.handle(&event)?;
    print_reply(&reply);
    Ok(())
}

pub fn run_start(user: &str) -> Result<(), Box<dyn Error>> {
    deliver(InboundEvent::command(user, "start"))
}

pub fn run_press(user: &str, token: &str) -> Result<(), Box<dyn Error>> {
    deliver(InboundEvent::button(user, token))
}

pub fn run_say(user: &str, text: &str) -> Result<(), Box<dyn Error>> {
    deliver(InboundEvent::text(user, text))
}

pub fn run_screen(user: &str) -> Result<(), Box<dyn Error>> {
    let engine = open_engine()?;
    let reply = engine.snapshot(user)?;
    print_reply(&reply);
    Ok(())
}
