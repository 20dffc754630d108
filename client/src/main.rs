use clap::Parser;
use client::game::{ClientBoard, SnapshotChange};
use client::input::{parse_command, Command, HELP};
use client::network::{fetch_board, start_new_game, ClientError, Connection, Frame};
use client::rendering::{RenderConfig, Renderer};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Start with every card's role visible
    #[arg(long)]
    spymaster: bool,

    /// Width of one card cell in characters
    #[arg(short = 'w', long, default_value = "14")]
    cell_width: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    info!("Connecting to: {}", args.server);

    let mut state = ClientBoard::new(fetch_board(&args.server).await?);
    state.spymaster = args.spymaster;
    let renderer = Renderer::new(RenderConfig {
        cell_width: args.cell_width,
    });

    let mut connection = Connection::connect(&args.server).await?;
    connection.send_ping().await?;

    println!("{}", renderer.render(&state));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match command {
                    Command::Reveal(card) => {
                        if state.predict_reveal(card) {
                            connection.send_reveal(card).await?;
                            println!("{}", renderer.render(&state));
                        } else {
                            println!("card {card} is already revealed");
                        }
                    }
                    Command::ToggleSpymaster => {
                        state.toggle_spymaster();
                        println!("{}", renderer.render(&state));
                    }
                    Command::NewGame => {
                        state.replace_board(start_new_game(&args.server).await?);
                        println!("{}", renderer.render(&state));
                    }
                    Command::Ping => connection.send_ping().await?,
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                }
            }
            frame = connection.next_frame() => {
                match frame {
                    Ok(Frame::Update(event)) => match state.apply_server_update(&event) {
                        SnapshotChange::Unchanged => {}
                        SnapshotChange::Revealed(cards) => {
                            info!("Server confirmed reveals {:?}", cards);
                            println!("{}", renderer.render(&state));
                        }
                        SnapshotChange::NewGame => {
                            let board = fetch_board(&args.server).await?;
                            // Our own `new` command already swapped the board in.
                            if board != state.board {
                                println!("A new game has started");
                                state.replace_board(board);
                                println!("{}", renderer.render(&state));
                            }
                        }
                    },
                    Ok(Frame::Pong) => println!("connected"),
                    Ok(Frame::Notice(text)) => warn!("Server: {}", text),
                    Err(ClientError::Closed) => {
                        println!("Server closed the connection");
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    connection.close().await.ok();
    Ok(())
}
