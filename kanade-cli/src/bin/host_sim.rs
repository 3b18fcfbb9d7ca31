use anyhow::Result;
use clap::Parser;
use crossbeam_channel::Receiver;
use kanade_im::client::HttpEngine;
use kanade_im::config::Settings;
use kanade_im::core::host::{AnchorAccessor, HostClient, Rect};
use kanade_im::core::preedit::Preedit;
use kanade_im::core::window::{ChannelRenderer, RendererCommand};
use kanade_im::{ControllerConfig, HostCommand, InputController, Keysym, RawKeyEvent, ToolKind};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Line-driven host simulator for the IME bridge
#[derive(Parser, Debug)]
#[command(name = "kanade-host-sim")]
#[command(about = "Drive the IME controller from stdin and print every host call", long_about = None)]
struct Args {
    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Engine base URL (overrides config.toml)
    #[arg(long)]
    endpoint: Option<String>,

    /// Engine timeout in milliseconds (overrides config.toml)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Client id the simulated text field reports
    #[arg(long, default_value = "org.example.editor")]
    client_id: String,
}

const SCREEN_HEIGHT: f64 = 900.0;
const CHAR_WIDTH: f64 = 14.0;
const LINE_HEIGHT: f64 = 18.0;

/// A text field on a terminal: prints every call the controller makes
struct ConsoleHost {
    client_id: String,
    /// Text committed so far
    text: String,
    /// Characters of inline composition currently shown
    marked_len: usize,
}

impl AnchorAccessor for ConsoleHost {
    fn character_rect(&self, offset: usize) -> Option<Rect> {
        let column = (self.text.chars().count() + offset) as f64;
        Some(Rect::new(
            column * CHAR_WIDTH,
            SCREEN_HEIGHT - 2.0 * LINE_HEIGHT,
            CHAR_WIDTH,
            LINE_HEIGHT,
        ))
    }

    fn screen_height(&self) -> f64 {
        SCREEN_HEIGHT
    }
}

impl HostClient for ConsoleHost {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn insert_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.marked_len = 0;
        println!("  insert  {:?}  => {:?}", text, self.text);
    }

    fn set_marked_text(&mut self, preedit: &Preedit) {
        self.marked_len = preedit.len();
        if preedit.is_empty() {
            println!("  marked  (none)");
            return;
        }
        let segments: Vec<String> = preedit
            .attributes()
            .iter()
            .map(|attr| format!("{}..{}:{:?}", attr.start, attr.end, attr.annotation))
            .collect();
        println!(
            "  marked  {:?} caret={:?} [{}]",
            preedit.text(),
            preedit.cursor(),
            segments.join(" ")
        );
    }

    fn select_input_mode(&mut self, mode_id: &str) {
        println!("  mode    {}", mode_id);
    }

    fn open_link(&mut self, url: &str) {
        println!("  link    {}", url);
    }

    fn launch_tool(&mut self, tool: ToolKind) {
        println!("  tool    {:?}", tool);
    }
}

fn print_renderer(rx: &Receiver<RendererCommand>) {
    for command in rx.try_iter() {
        if !command.visible {
            println!("  window  hidden");
            continue;
        }
        let entries: Vec<String> = command
            .candidates
            .candidates()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let focus = if command.candidates.focused() == Some(i) { "*" } else { "" };
                format!("{}{}={}", focus, c.id, c.value)
            })
            .collect();
        println!("  window  at {:?}: {}", command.anchor, entries.join("  "));
    }
}

const HELP: &str = "commands: key <name> | type <text> | mode <host-id> | commit | \
click <id> | tool <name> | cursor | reset | client <id> | quit";

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "kanade_im=debug,kanade_host_sim=debug"
    } else {
        "kanade_im=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut settings = Settings::load()?;
    if let Some(endpoint) = args.endpoint {
        settings.engine.endpoint = endpoint;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.engine.timeout_ms = timeout_ms;
    }
    tracing::info!("engine endpoint {}", settings.engine.endpoint);

    let engine = HttpEngine::new(
        &settings.engine.endpoint,
        Duration::from_millis(settings.engine.timeout_ms),
    );
    let (renderer, rx) = ChannelRenderer::channel();
    let mut controller = InputController::new(
        Box::new(engine),
        Box::new(renderer),
        ControllerConfig::from(&settings),
    );
    let mut host = ConsoleHost {
        client_id: args.client_id,
        text: String::new(),
        marked_len: 0,
    };

    println!("{}", HELP);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let (command, arg) = match line.trim().split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => break,
            "key" => match Keysym::from_name(arg) {
                Some(keysym) => {
                    let consumed = controller.handle_key(&RawKeyEvent::press(keysym), &mut host);
                    println!("  {} {}", keysym, if consumed { "consumed" } else { "passed" });
                }
                None => println!("unknown key {:?}", arg),
            },
            "type" => {
                for ch in arg.chars() {
                    let Some(keysym) = Keysym::from_name(&ch.to_string()) else {
                        println!("cannot type {:?}", ch);
                        continue;
                    };
                    if !controller.handle_key(&RawKeyEvent::press(keysym), &mut host) {
                        // Passed through: the field receives the raw character
                        host.insert_text(&ch.to_string());
                    }
                }
            }
            "mode" => {
                controller.handle_command(HostCommand::SelectMode(arg.to_string()), &mut host);
            }
            "commit" => {
                controller.handle_command(HostCommand::Commit, &mut host);
            }
            "click" => match arg.parse() {
                Ok(id) => {
                    if !controller.handle_selection(id, &mut host) {
                        println!("candidate {} is not shown", id);
                    }
                }
                Err(_) => println!("usage: click <id>"),
            },
            "tool" => match ToolKind::from_name(arg) {
                Some(tool) => {
                    controller.handle_command(HostCommand::LaunchTool(tool), &mut host);
                }
                None => println!("unknown tool {:?}", arg),
            },
            "cursor" => {
                controller.handle_key(&RawKeyEvent::cursor_update(), &mut host);
            }
            "reset" => controller.reset(&mut host),
            "client" => host.client_id = arg.to_string(),
            _ => println!("{}", HELP),
        }

        print_renderer(&rx);
        println!(
            "[{}] {:?}{}",
            controller.mode().indicator(),
            host.text,
            if host.marked_len > 0 { " (composing)" } else { "" }
        );
        stdout.flush()?;
    }

    controller.detach();
    Ok(())
}
