//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `partkit_core` linkage and print its version.
//! - Run a scripted headless drag/undo/redo session with deterministic output.

mod demo;

use demo::{board_viewer, Board, Shape};
use partkit_core::{
    init_logging, ClickTool, ContentRef, CoreConfig, CoreError, DragTool, EditingDomain,
    InputEvent, PointerEvent,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

fn parse_config(args: &[String]) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--log-dir" => {
                let dir = iter.next().ok_or("--log-dir needs a value")?;
                config.logging.log_dir = Some(PathBuf::from(dir));
            }
            "--log-level" => {
                let level = iter.next().ok_or("--log-level needs a value")?;
                config.logging.level = level.clone();
            }
            "--config" => {
                let raw = iter.next().ok_or("--config needs a JSON value")?;
                config = CoreConfig::from_json_str(raw).map_err(|err| err.to_string())?;
            }
            other => return Err(format!("unknown argument `{other}`")),
        }
    }
    Ok(config)
}

fn run_session(config: &CoreConfig) -> Result<(), CoreError> {
    let board = Rc::new(Board::default());
    let square = Shape::new("square", 10.0, 10.0);
    board.add(&square);

    let mut viewer = board_viewer(&board);
    viewer.set_root_content(Some(ContentRef::new(Rc::clone(&board))))?;

    let mut domain = EditingDomain::with_config(config);
    let viewer = domain.add_viewer(viewer);
    domain.add_tool(ClickTool::new());
    domain.add_tool(DragTool::new());
    domain.activate();

    let position = square.position();
    println!("{} start=({}, {})", square.label, position.x, position.y);

    for event in [
        InputEvent::Press(PointerEvent::at(15.0, 15.0)),
        InputEvent::Drag(PointerEvent::at(30.0, 20.0)),
        InputEvent::Release(PointerEvent::at(45.0, 25.0)),
    ] {
        domain.dispatch(viewer, &event)?;
    }
    let position = square.position();
    println!("{} dragged=({}, {})", square.label, position.x, position.y);

    domain.undo()?;
    let position = square.position();
    println!("{} undone=({}, {})", square.label, position.x, position.y);

    domain.redo()?;
    let position = square.position();
    println!("{} redone=({}, {})", square.label, position.x, position.y);

    if let Some(viewer) = domain.viewer(viewer) {
        viewer.verify_integrity()?;
    }
    domain.deactivate();
    Ok(())
}

fn main() -> ExitCode {
    println!("partkit_core version={}", partkit_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_config(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("partkit: {message}");
            return ExitCode::from(2);
        }
    };
    if config.logging.log_dir.is_some() {
        if let Err(message) = init_logging(&config.logging) {
            eprintln!("partkit: logging disabled: {message}");
        }
    }

    match run_session(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_session module=cli status=error error={}", err);
            eprintln!("partkit: session failed: {err}");
            ExitCode::FAILURE
        }
    }
}
