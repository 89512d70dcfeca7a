//! Interactive loops: identity gate, room, and switching between them.

use std::{io::Write, sync::Arc};

use crate::{
    cache::{CachedState, SessionStore},
    error::ClientError,
    formatter::MessageFormatter,
    identity::{IDENTITY_CACHE_KEY, Identity, IdentityGate},
    room::{AppendOutcome, RoomView},
    transport::ChatApi,
    ui::{Alerter, LineEvent, LineSource, redisplay_prompt},
};

/// Lines moved by `/up` and `/down` without a count
const DEFAULT_SCROLL_LINES: usize = 5;

/// How a room loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomExit {
    /// Back to the identity gate
    Leave,
    /// Exit the client
    Quit,
}

/// Commands typed in a room instead of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Up(usize),
    Down(usize),
    Bottom,
    Leave,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let name = words.next()?;
    let mut count = || {
        words
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(DEFAULT_SCROLL_LINES)
    };

    match name {
        "/up" => Some(Command::Up(count())),
        "/down" => Some(Command::Down(count())),
        "/bottom" => Some(Command::Bottom),
        "/leave" => Some(Command::Leave),
        "/quit" => Some(Command::Quit),
        _ => None,
    }
}

fn print_window(view: &RoomView, out: &mut (dyn Write + Send)) {
    let (first, lines) = view.visible_lines();
    let total = view.viewport().content_height();
    write!(out, "{}", MessageFormatter::format_window(&lines, first, total)).ok();
}

fn print_message(outcome: &AppendOutcome, out: &mut (dyn Write + Send)) {
    writeln!(out).ok();
    for line in MessageFormatter::chat_message_lines(&outcome.message) {
        writeln!(out, "{}", line).ok();
    }
}

enum Step {
    Input(LineEvent),
    Received(Option<Result<AppendOutcome, ClientError>>),
}

/// Run one mounted room until the user leaves or quits.
///
/// Incoming messages are printed only while the view follows the bottom;
/// otherwise they are kept in the list and show up when scrolling.
///
/// # Errors
///
/// A malformed event or a closed event stream ends the room with an error.
pub async fn run_room<L: LineSource>(
    view: &mut RoomView,
    lines: &mut L,
    out: &mut (dyn Write + Send),
) -> Result<RoomExit, ClientError> {
    let prompt = MessageFormatter::room_prompt(view.identity());

    write!(out, "{}", MessageFormatter::format_room_entered(view.identity())).ok();
    print_window(view, out);

    loop {
        // Incoming messages first, so a burst is shown before the next prompt
        let step = tokio::select! {
            biased;
            received = view.next_message() => Step::Received(received),
            event = lines.read_line(&prompt) => Step::Input(event),
        };

        match step {
            Step::Received(Some(Ok(outcome))) => {
                if outcome.followed {
                    print_message(&outcome, out);
                    redisplay_prompt(out, &prompt);
                }
            }
            Step::Received(Some(Err(e))) => return Err(e),
            Step::Received(None) => {
                return Err(ClientError::ConnectionError(
                    "Event stream closed".to_string(),
                ));
            }
            Step::Input(LineEvent::Line(mut line)) => match parse_command(&line) {
                Some(Command::Up(n)) => {
                    view.scroll_up(n);
                    print_window(view, out);
                }
                Some(Command::Down(n)) => {
                    view.scroll_down(n);
                    print_window(view, out);
                }
                Some(Command::Bottom) => {
                    view.scroll_to_bottom();
                    print_window(view, out);
                }
                Some(Command::Leave) => return Ok(RoomExit::Leave),
                Some(Command::Quit) => return Ok(RoomExit::Quit),
                None => {
                    view.submit(&mut line);
                }
            },
            Step::Input(LineEvent::Interrupted | LineEvent::Eof) => return Ok(RoomExit::Quit),
        }
    }
}

/// Top-level controller.
///
/// Without a stored identity the gate asks for one; with an identity a room
/// is mounted for it. Leaving the room clears the identity and returns to the
/// gate. A new identity always gets a freshly mounted room.
pub async fn run_app<L: LineSource>(
    store: SessionStore,
    api: Arc<dyn ChatApi>,
    alerter: Arc<dyn Alerter>,
    lines: &mut L,
    out: &mut (dyn Write + Send),
    viewport_height: usize,
) -> Result<(), ClientError> {
    let mut identity = CachedState::<Option<Identity>>::new(store.clone(), IDENTITY_CACHE_KEY, None)?;

    loop {
        let Some(current) = identity.get().clone() else {
            match IdentityGate::prompt(lines).await {
                Some(next) => identity.set(Some(next))?,
                None => break,
            }
            continue;
        };

        let mut view = RoomView::mount(
            current,
            store.clone(),
            Arc::clone(&api),
            Arc::clone(&alerter),
            viewport_height,
        )
        .await?;
        let exit = run_room(&mut view, lines, out).await;
        view.unmount();

        match exit? {
            RoomExit::Leave => identity.set(None)?,
            RoomExit::Quit => break,
        }
    }

    tracing::info!("Client session ended normally");
    Ok(())
}
