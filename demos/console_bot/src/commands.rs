//! A tiny command set printed to stdout.

use async_trait::async_trait;

use ttsbot::prelude::*;

use crate::extensions::prefix_key;

const HELP: &str = "\
Commands:
  ping          - Pong!
  speak <text>  - run <text> through the speech backend
  prefix <new>  - change this server's prefix (trusted users only)
  help          - this help";

pub struct DemoCommands;

#[async_trait]
impl CommandInvoker for DemoCommands {
    async fn invoke(&self, ctx: InvocationContext) -> anyhow::Result<()> {
        let instance = ctx.instance();
        instance.log(format!("command:{}", ctx.command_name()));

        match ctx.command_name() {
            "ping" => println!("Pong!"),
            "help" => println!("{HELP}"),
            "speak" => {
                let text = ctx.args().collect::<Vec<_>>().join(" ");
                let audio = instance.speech().synthesize(&text, "en").await?;
                println!("Synthesized {} bytes", audio.len());
            }
            "prefix" => {
                let Some(venue) = ctx.venue() else {
                    println!("Prefixes can only be changed in a server.");
                    return Ok(());
                };
                if !instance.is_trusted(ctx.author().id) {
                    println!("Only trusted users can change the prefix.");
                    return Ok(());
                }
                let Some(new) = ctx.args().next() else {
                    println!("Current prefix: {}", ctx.prefix());
                    return Ok(());
                };
                instance.cache().set(&prefix_key(venue.id), new.as_bytes()).await?;
                println!("Prefix set to {new}");
            }
            other => println!("Unknown command `{other}`, try {}help", ctx.prefix()),
        }
        Ok(())
    }
}
