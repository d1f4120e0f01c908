use clap::Parser;
use log::{error, info};
use midiloop::{
    command::forward_commands,
    create_scheduler, create_shared_state, load_song, logging,
    run_command_receiver,
    transport::{list_output_ports, LogTransport, MidirTransport, OutputTransport},
    ui::run_state_inspector,
    Args, ControlHandler, PlaybackEngine, PlaybackSettings, PlayerError, Scheduler, Settings,
};
use std::io;
use std::sync::Arc;

fn main() {
    let args = Args::parse();
    initialize_logging(args.verbose);

    if args.list_outputs {
        list_available_outputs();
        return;
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    info!("Application exiting");
}

fn initialize_logging(verbose: bool) {
    logging::init_logger(verbose).expect("Logger initialization failed");
    info!("Application starting");
}

fn list_available_outputs() {
    match list_output_ports() {
        Ok(ports) if ports.is_empty() => println!("No MIDI output ports available"),
        Ok(ports) => {
            println!("Available MIDI output ports:");
            for port in ports {
                println!("  - {}", port);
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_settings(args: &Args) -> Result<Settings, PlayerError> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn open_transport(args: &Args) -> Result<Box<dyn OutputTransport>, PlayerError> {
    if args.dry_run {
        info!("Dry run: notes will only be logged");
        return Ok(Box::new(LogTransport));
    }

    let transport = if args.select_output {
        MidirTransport::connect_interactive()?
    } else {
        MidirTransport::connect(args.output.as_deref())?
    };
    println!("Sending to MIDI output: {}", transport.port_name());
    Ok(Box::new(transport))
}

/// Loads everything, starts the worker threads and waits for playback to end.
/// Fails before any playback if the file, settings or output device are unusable.
fn run(args: &Args) -> Result<(), PlayerError> {
    let settings = load_settings(args)?;

    let Some(path) = args.file.as_deref() else {
        return Ok(());
    };
    let song = Arc::new(load_song(path)?);
    for problem in song.diagnostics() {
        eprintln!("Warning: {}", problem);
    }

    let transport = open_transport(args)?;
    let shared_state = create_shared_state(&settings);
    let scheduler = create_scheduler();

    let signal_state = shared_state.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, shutting down");
        signal_state.request_shutdown();
    })?;

    let playback_state = shared_state.clone();
    let playback_song = song.clone();
    let playback_settings = PlaybackSettings::from(&settings);
    let playback = scheduler
        .spawn("playback", move || {
            let mut engine =
                PlaybackEngine::new(playback_song, playback_state, transport, playback_settings);
            engine.run();
        })
        .map_err(|source| PlayerError::Spawn {
            task: "playback",
            source,
        })?;

    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let handler = ControlHandler::new(
        shared_state.clone(),
        settings.acceptance_threshold,
        settings.volume_step,
    );
    scheduler
        .spawn("commands", move || run_command_receiver(command_rx, handler))
        .map_err(|source| PlayerError::Spawn {
            task: "commands",
            source,
        })?;
    scheduler
        .spawn("stdin", move || forward_commands(io::stdin().lock(), &command_tx))
        .map_err(|source| PlayerError::Spawn {
            task: "stdin",
            source,
        })?;

    if !args.no_status {
        let inspector_state = shared_state.clone();
        let track_count = song.tracks().len();
        scheduler
            .spawn("inspector", move || {
                run_state_inspector(inspector_state, track_count)
            })
            .map_err(|source| PlayerError::Spawn {
                task: "inspector",
                source,
            })?;
    }

    println!("Commands: start | stop | pause | up[:strength] | down[:strength]");
    println!("Press Ctrl+C to exit...");

    // The engine, and with it the output connection, is dropped when this thread ends.
    if playback.join().is_err() {
        error!("Playback thread panicked");
    }
    Ok(())
}
