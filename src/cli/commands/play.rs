//! Play command - Play against a trained agent or watch it play itself

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};

use crate::{
    app::App,
    cli::{commands::train::parse_player_token, output::render_board},
    q_learning::QLearningAgent,
    tictactoe::{Action, Game, GameOutcome, Player, WinRule},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlayMode {
    /// Human against the agent on stdin
    Human,
    /// Agent against itself, greedy on both sides
    Watch,
}

#[derive(Parser, Debug)]
#[command(about = "Play against a trained agent or watch it play itself")]
pub struct PlayArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Game mode
    #[arg(long, short = 'm', value_enum, default_value = "human")]
    pub mode: PlayMode,

    /// Token the human plays (`x` moves first, `o` second); asked
    /// interactively when omitted
    #[arg(long)]
    pub human_player: Option<String>,

    /// Pause between moves in watch mode
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let app = App::new();
    let (agent, saved) = app
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent {}", args.agent.display()))?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    match args.mode {
        PlayMode::Watch => {
            let delay = Duration::from_millis(args.delay_ms);
            watch_game(&agent, saved.rule, &mut out, delay)?;
        }
        PlayMode::Human => {
            let human = match &args.human_player {
                Some(token) => parse_player_token(token, "--human-player")?,
                None => match prompt_player(&mut input, &mut out)? {
                    Some(player) => player,
                    None => return Ok(()),
                },
            };
            play_human(&agent, saved.rule, human, &mut input, &mut out)?;
        }
    }
    Ok(())
}

fn prompt_player<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<Player>> {
    loop {
        write!(out, "Play as X (moves first) or O? [x/o]: ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match parse_player_token(&line, "player") {
            Ok(player) => return Ok(Some(player)),
            Err(err) => writeln!(out, "{err}")?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Parse `row col` or `row,col`.
fn parse_move(line: &str) -> Result<Action> {
    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let [row, col] = parts.as_slice() else {
        return Err(anyhow!("Enter a move as 'row col', e.g. '2 3'"));
    };
    let row: usize = row
        .parse()
        .map_err(|_| anyhow!("Invalid row '{row}'"))?;
    let col: usize = col
        .parse()
        .map_err(|_| anyhow!("Invalid column '{col}'"))?;
    Ok(Action::new(row, col))
}

fn announce<W: Write>(out: &mut W, outcome: GameOutcome, human: Option<Player>) -> Result<()> {
    match (outcome, human) {
        (GameOutcome::Draw, _) => writeln!(out, "\nDraw.")?,
        (GameOutcome::Win(winner), Some(human)) if winner == human => {
            writeln!(out, "\nYou win!")?
        }
        (GameOutcome::Win(winner), Some(_)) => writeln!(out, "\nAgent ({winner}) wins.")?,
        (GameOutcome::Win(winner), None) => writeln!(out, "\n{winner} wins.")?,
    }
    Ok(())
}

/// Human against the greedy agent. Illegal or malformed input re-prompts;
/// `q` or end of input abandons the game and returns `None`.
pub fn play_human<R: BufRead, W: Write>(
    agent: &QLearningAgent,
    rule: WinRule,
    human: Player,
    input: &mut R,
    out: &mut W,
) -> Result<Option<GameOutcome>> {
    let mut game = Game::new(rule);
    writeln!(out, "You play {human} ({rule}). Enter moves as 'row col'; 'q' quits.")?;

    while !game.is_over() {
        writeln!(out, "\n{}", render_board(&game.current))?;

        if game.current.to_move == human {
            write!(out, "Your move ({human}): ")?;
            out.flush()?;
            let Some(line) = read_line(input)? else {
                return Ok(None);
            };
            if line.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            let played = parse_move(&line).and_then(|action| Ok(game.play(action)?));
            if let Err(err) = played {
                writeln!(out, "{err}")?;
            }
        } else {
            let action = agent.greedy_action(&game.current)?;
            writeln!(
                out,
                "Agent ({}) plays {action} (Q = {:.3})",
                game.current.to_move,
                agent.value_of(&game.current, action)
            )?;
            game.play(action)?;
        }
    }

    writeln!(out, "\n{}", render_board(&game.current))?;
    let outcome = game
        .outcome
        .ok_or_else(|| anyhow!("game finished without an outcome"))?;
    announce(out, outcome, Some(human))?;
    Ok(Some(outcome))
}

/// Agent against itself, greedy on both sides, printing the board after
/// every move.
pub fn watch_game<W: Write>(
    agent: &QLearningAgent,
    rule: WinRule,
    out: &mut W,
    delay: Duration,
) -> Result<Game> {
    let mut game = Game::new(rule);
    writeln!(out, "{}", render_board(&game.current))?;

    while !game.is_over() {
        let player = game.current.to_move;
        let action = agent.greedy_action(&game.current)?;
        game.play(action)?;
        writeln!(out, "{player} plays {action}\n{}", render_board(&game.current))?;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    if let Some(outcome) = game.outcome {
        announce(out, outcome, None)?;
    }
    Ok(game)
}
